/// history edits - correct and delete recorded payments, persisted as json
use chrono::{TimeZone, Utc};
use installment_credit_rs::{
    Actor, CreditLedger, CustomerRepository, FallbackRepository, JsonFileRepository, LedgerConfig,
    MemoryRepository, Money, NewCustomer, NoteDraft, PaymentEdit, PaymentMeta, PaymentMethod,
    PaymentTarget, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== history edits example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 5, 2, 14, 30, 0).unwrap()
    ));

    let dir = std::env::temp_dir().join("installment-credit-demo");
    let repository = FallbackRepository::new(JsonFileRepository::open(&dir)?, MemoryRepository::new());
    let mut ledger = CreditLedger::new(LedgerConfig::default(), repository)?;

    let customer = ledger.register_customer(NewCustomer::named("Carlos Dias"), &time)?;
    let note = ledger.issue_note(
        customer.id,
        &NoteDraft::split(Money::from_major(500), time.now(), 2),
        Actor::Operator,
        &time,
    )?;

    let receipt = ledger.pay(
        customer.id,
        Money::from_major(250),
        PaymentTarget::Installment(note.installments[0].id),
        &PaymentMeta::new(PaymentMethod::Cash).with_notes("balcão"),
        &time,
    )?;
    let payment_id = receipt.payments[0].id;
    println!("recorded {} in cash", receipt.applied);

    // operator typed the wrong amount
    let entry = ledger.edit_payment(
        customer.id,
        payment_id,
        &PaymentEdit {
            amount: Money::from_major(205),
            method: PaymentMethod::Cash,
            notes: Some("valor corrigido".to_string()),
        },
        &time,
    )?;
    println!("edited: {}", entry.description);

    let stored = ledger.customer(customer.id)?;
    let first = &stored.note(note.id)?.installments[0];
    println!("first installment: {}/{} {}", first.amount_paid, first.amount, first.status);

    // then the payment is voided entirely
    let removed = ledger.delete_payment(customer.id, payment_id, &time)?;
    println!("deleted payment of {}", removed.amount);

    let stored = ledger.repository().load_customer(customer.id)?;
    println!("\nstored under {}:", dir.display());
    println!("{}", serde_json::to_string_pretty(&stored)?);

    Ok(())
}
