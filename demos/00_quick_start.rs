/// quick start - minimal example to get started
use installment_credit_rs::{
    Actor, CreditLedger, LedgerConfig, MemoryRepository, Money, NewCustomer, NoteDraft,
    PaymentMeta, PaymentMethod, PaymentTarget, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut ledger = CreditLedger::new(LedgerConfig::default(), MemoryRepository::new())?;

    // register a customer and sell R$ 900 in three installments
    let customer = ledger.register_customer(NewCustomer::named("Maria Souza"), &time)?;
    let draft = NoteDraft::split(Money::from_major(900), time.now(), 3);
    ledger.issue_note(customer.id, &draft, Actor::Operator, &time)?;

    // customer pays R$ 450 at the counter
    let receipt = ledger.pay(
        customer.id,
        Money::from_major(450),
        PaymentTarget::Customer,
        &PaymentMeta::new(PaymentMethod::Cash),
        &time,
    )?;
    println!("applied {}, remainder {}", receipt.applied, receipt.remainder);

    // print current statement
    println!("{}", ledger.statement(customer.id, &time)?.to_json_pretty()?);

    Ok(())
}
