/// time control - watch statuses move as the clock advances
use chrono::{Duration, TimeZone, Utc};
use installment_credit_rs::{
    Actor, CreditLedger, LedgerConfig, MemoryRepository, Money, NewCustomer, NoteDraft,
    PaymentMeta, PaymentMethod, PaymentTarget, SafeTimeProvider, SequentialIds, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== time control example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let mut ledger = CreditLedger::with_ids(
        LedgerConfig::default(),
        MemoryRepository::new(),
        SequentialIds::new(),
    )?;

    let customer = ledger.register_customer(NewCustomer::named("Ana Lima"), &time)?;
    let note = ledger.issue_note(
        customer.id,
        &NoteDraft::split(Money::from_major(300), time.now(), 3),
        Actor::Operator,
        &time,
    )?;
    println!("note issued on {}", time.now().format("%Y-%m-%d"));

    // advance past the first due date
    controller.advance(Duration::days(40));
    let changed = ledger.refresh_all(&time)?;
    println!("\nadvanced to: {} ({} note changed status)", time.now().format("%Y-%m-%d"), changed);
    print_installments(&ledger, customer.id, note.id)?;

    // pay the late installment
    ledger.pay(
        customer.id,
        Money::from_major(100),
        PaymentTarget::Installment(note.installments[0].id),
        &PaymentMeta::new(PaymentMethod::Card),
        &time,
    )?;
    println!("\nfirst installment paid late");
    print_installments(&ledger, customer.id, note.id)?;

    // pay the rest before the second due date
    controller.advance(Duration::days(10));
    ledger.pay(
        customer.id,
        Money::from_major(200),
        PaymentTarget::Note(note.id),
        &PaymentMeta::new(PaymentMethod::Pix),
        &time,
    )?;
    println!("\nadvanced to: {}, remaining paid early", time.now().format("%Y-%m-%d"));
    print_installments(&ledger, customer.id, note.id)?;

    Ok(())
}

fn print_installments(
    ledger: &CreditLedger<MemoryRepository, SequentialIds>,
    customer_id: installment_credit_rs::CustomerId,
    note_id: installment_credit_rs::NoteId,
) -> Result<(), Box<dyn std::error::Error>> {
    let customer = ledger.customer(customer_id)?;
    let note = customer.note(note_id)?;
    println!("  note status: {}", note.status);
    for installment in &note.installments {
        println!(
            "  #{} due {} paid {}/{} {}",
            installment.number,
            installment.due_date.format("%Y-%m-%d"),
            installment.amount_paid,
            installment.amount,
            installment.status
        );
    }
    Ok(())
}
