/// distribution - one payment spread across every open note, overdue first
use chrono::{Duration, TimeZone, Utc};
use installment_credit_rs::{
    Actor, AllocationTarget, CreditLedger, LedgerConfig, MemoryRepository, Money, NewCustomer,
    NoteDraft, PaymentMeta, PaymentMethod, PaymentTarget, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== distribution example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let mut ledger = CreditLedger::new(LedgerConfig::default(), MemoryRepository::new())?;

    let customer = ledger.register_customer(NewCustomer::named("João Pereira"), &time)?;
    let issued = time.now();

    // a 600 sale in four installments and a 120 note due in three weeks
    ledger.issue_note(
        customer.id,
        &NoteDraft::split(Money::from_major(600), issued, 4).with_description("geladeira"),
        Actor::Operator,
        &time,
    )?;
    ledger.issue_note(
        customer.id,
        &NoteDraft::single(Money::from_major(120), issued, issued + Duration::days(21))
            .with_description("fogão usado"),
        Actor::Operator,
        &time,
    )?;

    // two months go by without payment
    controller.advance(Duration::days(62));
    println!("today: {}", time.now().format("%Y-%m-%d"));

    let receipt = ledger.pay(
        customer.id,
        Money::from_major(400),
        PaymentTarget::Customer,
        &PaymentMeta::new(PaymentMethod::Pix),
        &time,
    )?;

    println!("\nallocations:");
    for allocation in &receipt.allocations {
        let label = match allocation.target {
            AllocationTarget::Installment { number, .. } => format!("installment {}", number),
            AllocationTarget::Note { .. } => "single note".to_string(),
        };
        println!(
            "  {:<14} due {} {:<8} {}",
            label,
            allocation.due_date.format("%Y-%m-%d"),
            if allocation.was_overdue { "overdue" } else { "" },
            allocation.amount
        );
    }
    println!("remainder: {}", receipt.remainder);

    println!("\nevents:");
    for event in ledger.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
