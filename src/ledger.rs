use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::config::LedgerConfig;
use crate::customer::{Customer, NewCustomer};
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::ids::{IdGenerator, RandomIds};
use crate::note::{Note, NoteDraft};
use crate::payments::{
    self, apply_payment, delete_note_payment, distribute_payment, edit_note_payment, pay_note,
    pay_note_directly, Allocation, AllocationTarget, EditEntry, OverpaymentGuard, Payment,
    PaymentEdit, PaymentMeta,
};
use crate::store::CustomerRepository;
use crate::summary::CustomerStatement;
use crate::types::{Actor, CustomerId, Eligibility, NoteId, PaymentId, PaymentTarget, Status};

/// outcome of one inbound payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub customer_id: CustomerId,
    pub target: PaymentTarget,
    pub requested: Money,
    pub applied: Money,
    /// part of the request that was handed back
    pub remainder: Money,
    pub payments: Vec<Payment>,
    /// processing order of the applied slices
    pub allocations: Vec<Allocation>,
}

/// credit ledger over a customer repository
pub struct CreditLedger<R, I = RandomIds> {
    pub config: LedgerConfig,
    pub events: EventStore,
    repository: R,
    ids: I,
}

impl<R: CustomerRepository> CreditLedger<R, RandomIds> {
    pub fn new(config: LedgerConfig, repository: R) -> Result<Self> {
        Self::with_ids(config, repository, RandomIds)
    }
}

impl<R, I> CreditLedger<R, I>
where
    R: CustomerRepository,
    I: IdGenerator,
{
    pub fn with_ids(config: LedgerConfig, repository: R, ids: I) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            events: EventStore::new(),
            repository,
            ids,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn customer(&self, id: CustomerId) -> Result<Customer> {
        self.repository.load_customer(id)
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// register a new customer, eligible by default
    pub fn register_customer(
        &mut self,
        data: NewCustomer,
        time_provider: &SafeTimeProvider,
    ) -> Result<Customer> {
        let now = time_provider.now();
        let customer = Customer::register(self.ids.next_id(), data, now)?;
        self.repository.save_customer(&customer)?;

        self.events.emit(Event::CustomerRegistered {
            customer_id: customer.id,
            timestamp: now,
        });
        tracing::info!(customer_id = %customer.id, name = %customer.name, "registered customer");

        Ok(customer)
    }

    pub fn set_eligibility(
        &mut self,
        customer_id: CustomerId,
        eligibility: Eligibility,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let mut customer = self.repository.load_customer(customer_id)?;
        let old = customer.eligibility;
        if old == eligibility {
            return Ok(());
        }

        customer.eligibility = eligibility;
        self.repository.save_customer(&customer)?;

        self.events.emit(Event::EligibilityChanged {
            customer_id,
            old,
            new: eligibility,
            timestamp: time_provider.now(),
        });
        tracing::info!(customer_id = %customer_id, ?old, new = ?eligibility, "changed eligibility");

        Ok(())
    }

    /// issue a note to a customer, splitting it into installments if asked
    pub fn issue_note(
        &mut self,
        customer_id: CustomerId,
        draft: &NoteDraft,
        actor: Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<Note> {
        let now = time_provider.now();
        let mut customer = self.load_checked(customer_id)?;
        customer.ensure_can_receive_note(actor, self.config.enforce_eligibility)?;

        let note = Note::issue(draft, customer_id, &self.config, &self.ids, now)?;
        let before = cached_statuses(&customer);
        customer.notes.push(note.clone());
        self.commit(&mut customer, &before, now)?;

        self.events.emit(Event::NoteIssued {
            customer_id,
            note_id: note.id,
            amount: note.amount,
            installments: note.installment_count,
            timestamp: now,
        });
        tracing::info!(
            customer_id = %customer_id,
            note_id = %note.id,
            amount = %note.amount,
            installments = ?note.installment_count,
            ?actor,
            "issued note"
        );

        Ok(note)
    }

    /// replace a note's terms, keeping the payments already recorded
    pub fn amend_note(
        &mut self,
        customer_id: CustomerId,
        note_id: NoteId,
        draft: &NoteDraft,
        time_provider: &SafeTimeProvider,
    ) -> Result<Note> {
        let now = time_provider.now();
        let mut customer = self.load_checked(customer_id)?;
        let index = customer.note_index(note_id)?;

        let old_amount = customer.notes[index].amount;
        let amended = customer.notes[index].regenerate(draft, &self.config, &self.ids, now)?;
        let before = cached_statuses(&customer);
        customer.notes[index] = amended.clone();
        self.commit(&mut customer, &before, now)?;

        self.events.emit(Event::NoteAmended {
            customer_id,
            note_id,
            old_amount,
            new_amount: amended.amount,
            timestamp: now,
        });
        tracing::info!(
            customer_id = %customer_id,
            note_id = %note_id,
            old_amount = %old_amount,
            new_amount = %amended.amount,
            "amended note"
        );

        Ok(amended)
    }

    /// record an inbound payment against a customer, a note or an installment
    pub fn pay(
        &mut self,
        customer_id: CustomerId,
        amount: Money,
        target: PaymentTarget,
        meta: &PaymentMeta,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        payments::validate_amount(amount)?;

        let now = time_provider.now();
        let mut customer = self.load_checked(customer_id)?;
        let before = cached_statuses(&customer);
        let guard = OverpaymentGuard::new(self.config.overpayment_policy);

        let (recorded, allocations, remainder) = match target {
            PaymentTarget::Customer => {
                let distribution = distribute_payment(amount, &customer.notes, meta, &self.ids, now)?;
                customer.notes = distribution.notes;
                (distribution.payments, distribution.allocations, distribution.remainder)
            }
            PaymentTarget::Note(note_id) => {
                let index = customer.note_index(note_id)?;
                let note = &customer.notes[index];
                guard.check(amount, note.remaining(), meta)?;

                let result = if note.installment {
                    pay_note(note, amount, meta, &self.ids, now)?
                } else {
                    pay_note_directly(note, amount, meta, self.ids.next_id(), now)?
                };
                let allocations = manual_allocations(&result.note, &result.payments, now);
                customer.notes[index] = result.note;
                (result.payments, allocations, result.remainder)
            }
            PaymentTarget::Installment(installment_id) => {
                let (n, i) = customer.installment_index(installment_id)?;
                let installment = &customer.notes[n].installments[i];
                if installment.is_fully_paid() {
                    return Err(LedgerError::InstallmentAlreadyPaid { id: installment_id });
                }
                guard.check(amount, installment.remaining(), meta)?;

                let note_id = customer.notes[n].id;
                let result = apply_payment(installment, amount, meta, note_id, self.ids.next_id(), now)?;
                let remainder = amount - result.applied();
                customer.notes[n].installments[i] = result.installment;

                let payments: Vec<_> = result.payment.into_iter().collect();
                let allocations = manual_allocations(&customer.notes[n], &payments, now);
                (payments, allocations, remainder)
            }
        };

        self.commit(&mut customer, &before, now)?;

        for payment in &recorded {
            self.events.emit(Event::PaymentApplied {
                customer_id,
                note_id: payment.note_id.unwrap_or_default(),
                installment_id: payment.installment_id,
                payment_id: payment.id,
                amount: payment.amount,
                method: payment.method,
                timestamp: now,
            });
        }
        if remainder.is_positive() {
            self.events.emit(Event::RemainderReturned {
                customer_id,
                requested: amount,
                remainder,
                timestamp: now,
            });
        }

        let applied = amount - remainder;
        tracing::info!(
            customer_id = %customer_id,
            payment_target = ?target,
            requested = %amount,
            applied = %applied,
            remainder = %remainder,
            payments = recorded.len(),
            "recorded payment"
        );

        Ok(PaymentReceipt {
            customer_id,
            target,
            requested: amount,
            applied,
            remainder,
            payments: recorded,
            allocations,
        })
    }

    /// record a payment at the system clock
    pub fn pay_now(
        &mut self,
        customer_id: CustomerId,
        amount: Money,
        target: PaymentTarget,
        meta: &PaymentMeta,
    ) -> Result<PaymentReceipt> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.pay(customer_id, amount, target, meta, &time)
    }

    /// change a recorded payment, appending to its edit history
    pub fn edit_payment(
        &mut self,
        customer_id: CustomerId,
        payment_id: PaymentId,
        edit: &PaymentEdit,
        time_provider: &SafeTimeProvider,
    ) -> Result<EditEntry> {
        let now = time_provider.now();
        let mut customer = self.load_checked(customer_id)?;
        let before = cached_statuses(&customer);
        let location = customer.locate_payment(payment_id)?;

        let entry = match location.installment_id {
            Some(installment_id) => {
                let (n, i) = customer.installment_index(installment_id)?;
                let edited = payments::edit_payment(&customer.notes[n].installments[i], payment_id, edit, now)?;
                customer.notes[n].installments[i] = edited.owner;
                edited.entry
            }
            None => {
                let index = customer.note_index(location.note_id)?;
                let edited = edit_note_payment(&customer.notes[index], payment_id, edit, now)?;
                customer.notes[index] = edited.owner;
                edited.entry
            }
        };

        self.commit(&mut customer, &before, now)?;

        self.events.emit(Event::PaymentEdited {
            customer_id,
            payment_id,
            amount_before: entry.amount_before,
            amount_after: entry.amount_after,
            timestamp: now,
        });
        tracing::info!(
            customer_id = %customer_id,
            payment_id = %payment_id,
            before = %entry.amount_before,
            after = %entry.amount_after,
            "edited payment"
        );

        Ok(entry)
    }

    /// remove a recorded payment and reverse its amount
    pub fn delete_payment(
        &mut self,
        customer_id: CustomerId,
        payment_id: PaymentId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        let now = time_provider.now();
        let mut customer = self.load_checked(customer_id)?;
        let before = cached_statuses(&customer);
        let location = customer.locate_payment(payment_id)?;

        let removed = match location.installment_id {
            Some(installment_id) => {
                let (n, i) = customer.installment_index(installment_id)?;
                let deleted = payments::delete_payment(&customer.notes[n].installments[i], payment_id, now)?;
                customer.notes[n].installments[i] = deleted.owner;
                deleted.removed
            }
            None => {
                let index = customer.note_index(location.note_id)?;
                let deleted = delete_note_payment(&customer.notes[index], payment_id, now)?;
                customer.notes[index] = deleted.owner;
                deleted.removed
            }
        };

        self.commit(&mut customer, &before, now)?;

        self.events.emit(Event::PaymentDeleted {
            customer_id,
            payment_id,
            amount: removed.amount,
            timestamp: now,
        });
        tracing::info!(
            customer_id = %customer_id,
            payment_id = %payment_id,
            amount = %removed.amount,
            "deleted payment"
        );

        Ok(removed)
    }

    /// re-resolve every cached status of a customer at the current time.
    /// returns how many notes changed status.
    pub fn refresh_statuses(
        &mut self,
        customer_id: CustomerId,
        time_provider: &SafeTimeProvider,
    ) -> Result<usize> {
        let now = time_provider.now();
        let mut customer = self.load_checked(customer_id)?;
        let before = cached_statuses(&customer);
        let changed = self.commit(&mut customer, &before, now)?;

        if changed > 0 {
            tracing::info!(customer_id = %customer_id, changed, "refreshed statuses");
        }
        Ok(changed)
    }

    /// daily sweep over every stored customer
    pub fn refresh_all(&mut self, time_provider: &SafeTimeProvider) -> Result<usize> {
        let mut changed = 0;
        for customer_id in self.repository.list_customers()? {
            changed += self.refresh_statuses(customer_id, time_provider)?;
        }
        Ok(changed)
    }

    pub fn statement(
        &self,
        customer_id: CustomerId,
        time_provider: &SafeTimeProvider,
    ) -> Result<CustomerStatement> {
        let customer = self.repository.load_customer(customer_id)?;
        Ok(CustomerStatement::from_customer(&customer, time_provider.now()))
    }

    /// load a customer and refuse to work on a snapshot that already breaks
    /// the note invariants
    fn load_checked(&self, customer_id: CustomerId) -> Result<Customer> {
        let customer = self.repository.load_customer(customer_id)?;
        validate_notes(&customer, "stored snapshot is inconsistent, request refused")?;
        Ok(customer)
    }

    /// reconcile, check invariants, persist, then report status changes.
    /// nothing is saved when a note fails validation.
    fn commit(
        &mut self,
        customer: &mut Customer,
        before: &[(NoteId, Status)],
        now: DateTime<Utc>,
    ) -> Result<usize> {
        for note in &mut customer.notes {
            note.reconcile(now);
        }
        validate_notes(customer, "invariant check failed, changes discarded")?;

        self.repository.save_customer(customer)?;

        let mut changed = 0;
        for note in &customer.notes {
            let old = before.iter().find(|(id, _)| *id == note.id).map(|(_, s)| *s);
            if let Some(old_status) = old.filter(|s| *s != note.status) {
                changed += 1;
                self.events.emit(Event::NoteStatusChanged {
                    customer_id: customer.id,
                    note_id: note.id,
                    old_status,
                    new_status: note.status,
                    timestamp: now,
                });
            }
        }

        Ok(changed)
    }
}

fn validate_notes(customer: &Customer, failure: &'static str) -> Result<()> {
    for note in &customer.notes {
        if let Err(err) = note.validate() {
            tracing::error!(
                customer_id = %customer.id,
                note_id = %note.id,
                error = %err,
                "{}",
                failure
            );
            return Err(err);
        }
    }
    Ok(())
}

fn cached_statuses(customer: &Customer) -> Vec<(NoteId, Status)> {
    customer.notes.iter().map(|n| (n.id, n.status)).collect()
}

fn manual_allocations(note: &Note, recorded: &[Payment], now: DateTime<Utc>) -> Vec<Allocation> {
    recorded
        .iter()
        .map(|payment| {
            let (target, due_date) = match payment.installment_id.and_then(|id| note.installment(id)) {
                Some(installment) => (
                    AllocationTarget::Installment {
                        note_id: note.id,
                        installment_id: installment.id,
                        number: installment.number,
                    },
                    installment.due_date,
                ),
                None => (AllocationTarget::Note { note_id: note.id }, note.due_date),
            };

            Allocation {
                target,
                due_date,
                was_overdue: due_date < now,
                amount: payment.amount,
                payment_id: payment.id,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::store::MemoryRepository;
    use crate::types::{OverpaymentPolicy, PaymentMethod};
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;

    type TestLedger = CreditLedger<MemoryRepository, SequentialIds>;

    fn setup() -> (TestLedger, SafeTimeProvider) {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let ledger = CreditLedger::with_ids(
            LedgerConfig::default(),
            MemoryRepository::new(),
            SequentialIds::new(),
        )
        .unwrap();
        (ledger, time)
    }

    fn pix() -> PaymentMeta {
        PaymentMeta::new(PaymentMethod::Pix)
    }

    /// customer with a 300 note in three installments (due feb, mar, apr 1st)
    /// and a 50 single-payment note due feb 15th
    fn customer_with_notes(ledger: &mut TestLedger, time: &SafeTimeProvider) -> (CustomerId, Note, Note) {
        let customer = ledger.register_customer(NewCustomer::named("Lucia"), time).unwrap();
        let issued = time.now();

        let split = ledger
            .issue_note(customer.id, &NoteDraft::split(Money::from_major(300), issued, 3), Actor::Operator, time)
            .unwrap();
        let single = ledger
            .issue_note(
                customer.id,
                &NoteDraft::single(Money::from_major(50), issued, Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap()),
                Actor::Operator,
                time,
            )
            .unwrap();

        (customer.id, split, single)
    }

    #[test]
    fn test_customer_payment_goes_to_overdue_first() {
        let (mut ledger, time) = setup();
        let (customer_id, split, single) = customer_with_notes(&mut ledger, &time);
        ledger.take_events();

        // feb 20th: first installment and the single note are overdue
        time.test_control().unwrap().advance(Duration::days(50));

        let receipt = ledger
            .pay(customer_id, Money::from_major(180), PaymentTarget::Customer, &pix(), &time)
            .unwrap();

        assert_eq!(receipt.applied, Money::from_major(180));
        assert_eq!(receipt.remainder, Money::ZERO);
        assert_eq!(receipt.allocations.len(), 3);
        assert!(receipt.allocations[0].was_overdue);
        assert!(receipt.allocations[1].was_overdue);
        assert!(!receipt.allocations[2].was_overdue);
        assert_eq!(receipt.allocations[1].target, AllocationTarget::Note { note_id: single.id });

        let customer = ledger.customer(customer_id).unwrap();
        let stored_split = customer.note(split.id).unwrap();
        assert_eq!(stored_split.amount_paid, Money::from_major(130));
        assert_eq!(stored_split.installments[0].status, Status::PaidLate);
        assert_eq!(stored_split.installments[1].amount_paid, Money::from_major(30));
        assert_eq!(stored_split.status, Status::Pending);
        assert_eq!(customer.note(single.id).unwrap().status, Status::PaidLate);

        let events = ledger.take_events();
        let applied = events
            .iter()
            .filter(|e| matches!(e, Event::PaymentApplied { .. }))
            .count();
        assert_eq!(applied, 3);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::NoteStatusChanged { new_status: Status::PaidLate, .. }
        )));
    }

    #[test]
    fn test_customer_payment_returns_remainder() {
        let (mut ledger, time) = setup();
        let (customer_id, _, _) = customer_with_notes(&mut ledger, &time);

        let receipt = ledger
            .pay(customer_id, Money::from_major(400), PaymentTarget::Customer, &pix(), &time)
            .unwrap();

        assert_eq!(receipt.applied, Money::from_major(350));
        assert_eq!(receipt.remainder, Money::from_major(50));
        assert!(ledger
            .take_events()
            .iter()
            .any(|e| matches!(e, Event::RemainderReturned { .. })));

        let customer = ledger.customer(customer_id).unwrap();
        assert!(customer.notes.iter().all(|n| n.status == Status::Paid));
    }

    #[test]
    fn test_installment_overpayment_rejected_unless_confirmed() {
        let (mut ledger, time) = setup();
        let (customer_id, split, _) = customer_with_notes(&mut ledger, &time);
        let third = split.installments[2].id;

        let err = ledger
            .pay(customer_id, Money::from_major(150), PaymentTarget::Installment(third), &pix(), &time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Overpayment { .. }));

        // nothing was stored by the failed request
        let stored = ledger.customer(customer_id).unwrap();
        assert_eq!(stored.note(split.id).unwrap().amount_paid, Money::ZERO);

        let receipt = ledger
            .pay(
                customer_id,
                Money::from_major(150),
                PaymentTarget::Installment(third),
                &pix().confirmed(),
                &time,
            )
            .unwrap();
        assert_eq!(receipt.applied, Money::from_major(100));
        assert_eq!(receipt.remainder, Money::from_major(50));

        let err = ledger
            .pay(customer_id, Money::from_major(10), PaymentTarget::Installment(third), &pix(), &time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InstallmentAlreadyPaid { .. }));
    }

    #[test]
    fn test_cap_policy_caps_manual_targets() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let config = LedgerConfig {
            overpayment_policy: OverpaymentPolicy::Cap,
            ..LedgerConfig::default()
        };
        let mut ledger = CreditLedger::with_ids(config, MemoryRepository::new(), SequentialIds::new()).unwrap();
        let (customer_id, _, single) = customer_with_notes(&mut ledger, &time);

        let receipt = ledger
            .pay(customer_id, Money::from_major(80), PaymentTarget::Note(single.id), &pix(), &time)
            .unwrap();
        assert_eq!(receipt.applied, Money::from_major(50));
        assert_eq!(receipt.remainder, Money::from_major(30));
        assert_eq!(receipt.allocations[0].target, AllocationTarget::Note { note_id: single.id });
    }

    #[test]
    fn test_note_payment_cascades() {
        let (mut ledger, time) = setup();
        let (customer_id, split, _) = customer_with_notes(&mut ledger, &time);

        let receipt = ledger
            .pay(customer_id, Money::from_major(250), PaymentTarget::Note(split.id), &pix(), &time)
            .unwrap();

        assert_eq!(receipt.payments.len(), 3);
        assert_eq!(receipt.remainder, Money::ZERO);
        let stored = ledger.customer(customer_id).unwrap();
        let note = stored.note(split.id).unwrap();
        assert_eq!(note.amount_paid, Money::from_major(250));
        assert!(note.installments[1].paid);
        assert_eq!(note.installments[2].amount_paid, Money::from_major(50));
    }

    #[test]
    fn test_eligibility_gate() {
        let (mut ledger, time) = setup();
        let customer = ledger.register_customer(NewCustomer::named("Otavio"), &time).unwrap();
        ledger
            .set_eligibility(customer.id, Eligibility::NotEligible, &time)
            .unwrap();

        let draft = NoteDraft::split(Money::from_major(100), time.now(), 2);
        let err = ledger
            .issue_note(customer.id, &draft, Actor::Operator, &time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::CustomerNotEligible { .. }));

        assert!(ledger.issue_note(customer.id, &draft, Actor::Manager, &time).is_ok());
        assert!(ledger
            .take_events()
            .iter()
            .any(|e| matches!(e, Event::EligibilityChanged { .. })));
    }

    #[test]
    fn test_edit_and_delete_payment() {
        let (mut ledger, time) = setup();
        let (customer_id, split, _) = customer_with_notes(&mut ledger, &time);
        let first = split.installments[0].id;

        let receipt = ledger
            .pay(customer_id, Money::from_major(100), PaymentTarget::Installment(first), &pix(), &time)
            .unwrap();
        let payment_id = receipt.payments[0].id;

        let entry = ledger
            .edit_payment(
                customer_id,
                payment_id,
                &PaymentEdit {
                    amount: Money::from_major(40),
                    method: PaymentMethod::Cash,
                    notes: Some("corrigido".to_string()),
                },
                &time,
            )
            .unwrap();
        assert_eq!(entry.amount_before, Money::from_major(100));
        assert_eq!(entry.amount_after, Money::from_major(40));

        let stored = ledger.customer(customer_id).unwrap();
        let note = stored.note(split.id).unwrap();
        assert_eq!(note.amount_paid, Money::from_major(40));
        assert_eq!(note.installments[0].status, Status::Pending);
        assert!(note.installments[0].payments[0].edited);

        let removed = ledger.delete_payment(customer_id, payment_id, &time).unwrap();
        assert_eq!(removed.amount, Money::from_major(40));

        let stored = ledger.customer(customer_id).unwrap();
        assert_eq!(stored.note(split.id).unwrap().amount_paid, Money::ZERO);
        assert!(matches!(
            ledger.delete_payment(customer_id, payment_id, &time),
            Err(LedgerError::PaymentNotFound { .. })
        ));
    }

    #[test]
    fn test_amend_note_keeps_payments() {
        let (mut ledger, time) = setup();
        let (customer_id, split, _) = customer_with_notes(&mut ledger, &time);
        ledger
            .pay(customer_id, Money::from_major(100), PaymentTarget::Note(split.id), &pix(), &time)
            .unwrap();

        let amended = ledger
            .amend_note(
                customer_id,
                split.id,
                &NoteDraft::split(Money::from_major(400), split.issue_date, 4),
                &time,
            )
            .unwrap();

        assert_eq!(amended.id, split.id);
        assert_eq!(amended.installments.len(), 4);
        assert_eq!(amended.amount_paid, Money::from_major(100));
        assert!(amended.installments[0].paid);
        assert_eq!(amended.installments[0].id, split.installments[0].id);
    }

    #[test]
    fn test_refresh_statuses_marks_overdue() {
        let (mut ledger, time) = setup();
        let (customer_id, split, single) = customer_with_notes(&mut ledger, &time);
        ledger.take_events();

        assert_eq!(ledger.refresh_statuses(customer_id, &time).unwrap(), 0);

        time.test_control().unwrap().advance(Duration::days(40));
        assert_eq!(ledger.refresh_all(&time).unwrap(), 1);

        let stored = ledger.customer(customer_id).unwrap();
        assert_eq!(stored.note(split.id).unwrap().status, Status::Overdue);
        assert_eq!(stored.note(single.id).unwrap().status, Status::Pending);

        let events = ledger.take_events();
        assert!(matches!(
            events.as_slice(),
            [Event::NoteStatusChanged { old_status: Status::Pending, new_status: Status::Overdue, .. }]
        ));
    }

    #[test]
    fn test_statement() {
        let (mut ledger, time) = setup();
        let (customer_id, _, _) = customer_with_notes(&mut ledger, &time);
        ledger
            .pay(customer_id, Money::from_major(60), PaymentTarget::Customer, &pix(), &time)
            .unwrap();

        let statement = ledger.statement(customer_id, &time).unwrap();
        assert_eq!(statement.totals.face_value, Money::from_major(350));
        assert_eq!(statement.totals.paid, Money::from_major(60));
        assert_eq!(statement.totals.outstanding, Money::from_major(290));
    }

    #[test]
    fn test_invalid_amount_and_unknown_targets() {
        let (mut ledger, time) = setup();
        let (customer_id, _, _) = customer_with_notes(&mut ledger, &time);

        assert!(matches!(
            ledger.pay(customer_id, Money::ZERO, PaymentTarget::Customer, &pix(), &time),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(matches!(
            ledger.pay(customer_id, Money::from_major(1), PaymentTarget::Note(uuid::Uuid::nil()), &pix(), &time),
            Err(LedgerError::NoteNotFound { .. })
        ));
        assert!(matches!(
            ledger.pay(uuid::Uuid::nil(), Money::from_major(1), PaymentTarget::Customer, &pix(), &time),
            Err(LedgerError::CustomerNotFound { .. })
        ));
    }

    #[test]
    fn test_drifted_snapshot_is_refused_before_mutation() {
        let (mut ledger, time) = setup();
        let (customer_id, split, _) = customer_with_notes(&mut ledger, &time);
        ledger
            .pay(customer_id, Money::from_major(50), PaymentTarget::Note(split.id), &pix(), &time)
            .unwrap();

        // recorded total no longer matches the installments it was derived from
        let mut stored = ledger.customer(customer_id).unwrap();
        let index = stored.note_index(split.id).unwrap();
        stored.notes[index].amount_paid = Money::from_major(80);
        ledger.repository.save_customer(&stored).unwrap();
        ledger.take_events();

        let err = ledger
            .pay(customer_id, Money::from_major(10), PaymentTarget::Customer, &pix(), &time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InconsistentState { .. }));
        assert!(matches!(
            ledger.refresh_statuses(customer_id, &time),
            Err(LedgerError::InconsistentState { .. })
        ));

        let after = ledger.customer(customer_id).unwrap();
        assert_eq!(after.notes[index].amount_paid, Money::from_major(80));
        assert!(ledger.take_events().is_empty());
    }
}
