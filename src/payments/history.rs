use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::note::{Installment, Note};
use crate::status;
use crate::types::{PaymentId, PaymentMethod};

use super::{EditEntry, Payment};

/// replacement values for a recorded payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEdit {
    pub amount: Money,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

/// owner after an edit plus the history entry that was appended
#[derive(Debug, Clone, PartialEq)]
pub struct EditedPayment<T> {
    pub owner: T,
    pub entry: EditEntry,
}

/// owner after a deletion plus the payment that was removed
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedPayment<T> {
    pub owner: T,
    pub removed: Payment,
}

fn locate(payments: &[Payment], id: PaymentId) -> Result<usize> {
    payments
        .iter()
        .position(|p| p.id == id)
        .ok_or(LedgerError::PaymentNotFound { id })
}

fn describe(old: &Payment, edit: &PaymentEdit) -> String {
    let mut changes = Vec::new();
    if old.amount != edit.amount {
        changes.push(format!("amount {} -> {}", old.amount, edit.amount));
    }
    if old.method != edit.method {
        changes.push(format!("method {} -> {}", old.method, edit.method));
    }
    if old.notes != edit.notes {
        changes.push("notes updated".to_string());
    }
    if changes.is_empty() {
        "no changes".to_string()
    } else {
        changes.join("; ")
    }
}

/// rewrite the payment in place and append its history entry
fn rewrite(payment: &mut Payment, edit: &PaymentEdit, now: DateTime<Utc>) -> EditEntry {
    let entry = EditEntry {
        timestamp: now,
        description: describe(payment, edit),
        amount_before: payment.amount,
        amount_after: edit.amount,
    };

    payment.amount = edit.amount;
    payment.method = edit.method;
    payment.notes = edit.notes.clone();
    payment.edited = true;
    payment.edit_history.push(entry.clone());
    entry
}

fn validate_edit(edit: &PaymentEdit) -> Result<()> {
    if edit.amount.is_negative() {
        return Err(LedgerError::InvalidAmount { amount: edit.amount });
    }
    Ok(())
}

/// change a recorded installment payment and recompute the installment.
///
/// lateness is judged at `now`, not at the original payment instant. the
/// owning note is left alone; callers re-derive it with [`Note::reconcile`].
pub fn edit_payment(
    installment: &Installment,
    payment_id: PaymentId,
    edit: &PaymentEdit,
    now: DateTime<Utc>,
) -> Result<EditedPayment<Installment>> {
    validate_edit(edit)?;
    let index = locate(&installment.payments, payment_id)?;

    let old_amount = installment.payments[index].amount;
    let amount_paid = (installment.amount_paid + edit.amount - old_amount).max(Money::ZERO);
    if amount_paid > installment.amount {
        return Err(LedgerError::Overpayment {
            amount_due: installment.remaining() + old_amount,
            requested: edit.amount,
        });
    }

    let was_paid = installment.paid;
    let mut updated = installment.clone();
    let entry = rewrite(&mut updated.payments[index], edit, now);
    updated.amount_paid = amount_paid;

    if updated.is_fully_paid() && !was_paid {
        updated.paid_late = now > updated.due_date;
    }
    status::refresh_installment(&mut updated, now);

    tracing::debug!(
        installment_id = %installment.id,
        payment_id = %payment_id,
        before = %entry.amount_before,
        after = %entry.amount_after,
        status = %updated.status,
        "edited installment payment"
    );

    Ok(EditedPayment { owner: updated, entry })
}

/// remove a recorded installment payment and reverse its amount
pub fn delete_payment(
    installment: &Installment,
    payment_id: PaymentId,
    now: DateTime<Utc>,
) -> Result<DeletedPayment<Installment>> {
    let index = locate(&installment.payments, payment_id)?;

    let mut updated = installment.clone();
    let removed = updated.payments.remove(index);
    updated.amount_paid = updated.amount_paid.saturating_sub(removed.amount);
    status::refresh_installment(&mut updated, now);

    tracing::debug!(
        installment_id = %installment.id,
        payment_id = %payment_id,
        amount = %removed.amount,
        status = %updated.status,
        "deleted installment payment"
    );

    Ok(DeletedPayment { owner: updated, removed })
}

/// change a direct payment on a single-payment note
pub fn edit_note_payment(
    note: &Note,
    payment_id: PaymentId,
    edit: &PaymentEdit,
    now: DateTime<Utc>,
) -> Result<EditedPayment<Note>> {
    validate_edit(edit)?;
    let index = locate(&note.payments, payment_id)?;

    let old_amount = note.payments[index].amount;
    let amount_paid = (note.amount_paid + edit.amount - old_amount).max(Money::ZERO);
    if amount_paid > note.amount {
        return Err(LedgerError::Overpayment {
            amount_due: note.remaining() + old_amount,
            requested: edit.amount,
        });
    }

    let mut updated = note.clone();
    let entry = rewrite(&mut updated.payments[index], edit, now);
    updated.reconcile(now);

    Ok(EditedPayment { owner: updated, entry })
}

/// remove a direct payment from a single-payment note
pub fn delete_note_payment(
    note: &Note,
    payment_id: PaymentId,
    now: DateTime<Utc>,
) -> Result<DeletedPayment<Note>> {
    let index = locate(&note.payments, payment_id)?;

    let mut updated = note.clone();
    let removed = updated.payments.remove(index);
    updated.reconcile(now);

    Ok(DeletedPayment { owner: updated, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{apply_payment, pay_note_directly, PaymentMeta};
    use crate::status;
    use crate::types::Status;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn paid_installment(amount: i64, paid: i64, due: DateTime<Utc>) -> (Installment, PaymentId) {
        let inst = Installment::new(Uuid::from_u64_pair(0, 9), 1, Money::from_major(amount), due);
        let payment_id = Uuid::from_u64_pair(0, 1);
        let result = apply_payment(
            &inst,
            Money::from_major(paid),
            &PaymentMeta::new(PaymentMethod::Pix),
            Uuid::nil(),
            payment_id,
            now(),
        )
        .unwrap();
        (result.installment, payment_id)
    }

    fn edit(amount: i64) -> PaymentEdit {
        PaymentEdit {
            amount: Money::from_major(amount),
            method: PaymentMethod::Cash,
            notes: Some("corrigido".to_string()),
        }
    }

    #[test]
    fn test_edit_down_records_history() {
        let (inst, id) = paid_installment(300, 300, now() + Duration::days(5));

        let result = edit_payment(&inst, id, &edit(200), now()).unwrap();

        assert_eq!(result.owner.amount_paid, Money::from_major(200));
        assert!(!result.owner.paid);
        assert_eq!(result.owner.status, Status::Pending);
        assert_eq!(result.entry.amount_before, Money::from_major(300));
        assert_eq!(result.entry.amount_after, Money::from_major(200));
        assert!(result.entry.description.contains("method pix -> cash"));

        let payment = result.owner.payment(id).unwrap();
        assert!(payment.edited);
        assert_eq!(payment.amount, Money::from_major(200));
        assert_eq!(payment.edit_history.len(), 1);
    }

    #[test]
    fn test_edit_to_zero_and_back_never_negative() {
        let (inst, id) = paid_installment(300, 120, now() + Duration::days(5));

        let zero = edit_payment(&inst, id, &edit(0), now()).unwrap();
        assert_eq!(zero.owner.amount_paid, Money::ZERO);

        let back = edit_payment(&zero.owner, id, &edit(120), now()).unwrap();
        assert_eq!(back.owner.amount_paid, Money::from_major(120));

        let again = edit_payment(&back.owner, id, &edit(0), now()).unwrap();
        assert!(!again.owner.amount_paid.is_negative());
        assert_eq!(again.owner.payment(id).unwrap().edit_history.len(), 3);
    }

    #[test]
    fn test_edit_up_judges_lateness_now() {
        // partially paid before the due date, completed by an edit after it
        let (inst, id) = paid_installment(300, 100, now() - Duration::days(2));

        let result = edit_payment(&inst, id, &edit(300), now()).unwrap();

        assert!(result.owner.paid);
        assert!(result.owner.paid_late);
        assert_eq!(result.owner.status, Status::PaidLate);
    }

    #[test]
    fn test_edit_cannot_exceed_amount() {
        let (inst, id) = paid_installment(300, 100, now());
        let err = edit_payment(&inst, id, &edit(301), now()).unwrap_err();
        assert!(matches!(err, LedgerError::Overpayment { .. }));
    }

    #[test]
    fn test_edit_rejects_negative_and_unknown() {
        let (inst, id) = paid_installment(300, 100, now());
        assert!(matches!(
            edit_payment(&inst, id, &edit(-1), now()),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(matches!(
            edit_payment(&inst, Uuid::from_u64_pair(7, 7), &edit(10), now()),
            Err(LedgerError::PaymentNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_reverses_paid_installment() {
        let (inst, id) = paid_installment(300, 300, now() - Duration::days(1));
        assert!(inst.paid_late);

        let result = delete_payment(&inst, id, now()).unwrap();

        assert_eq!(result.owner.amount_paid, Money::ZERO);
        assert!(!result.owner.paid);
        assert!(!result.owner.paid_late);
        assert_eq!(result.owner.status, Status::Overdue);
        assert!(result.owner.payments.is_empty());
        assert_eq!(result.removed.amount, Money::from_major(300));
    }

    #[test]
    fn test_delete_unknown_payment() {
        let (inst, _) = paid_installment(300, 300, now());
        let err = delete_payment(&inst, Uuid::from_u64_pair(7, 7), now()).unwrap_err();
        assert!(matches!(err, LedgerError::PaymentNotFound { .. }));
    }

    #[test]
    fn test_note_payment_edit_and_delete() {
        let note = Note::single(
            Uuid::nil(),
            Uuid::nil(),
            Money::from_major(100),
            now() - Duration::days(10),
            now() + Duration::days(10),
        );
        let payment_id = Uuid::from_u64_pair(0, 5);
        let paid = pay_note_directly(&note, Money::from_major(100), &PaymentMeta::default(), payment_id, now())
            .unwrap()
            .note;
        assert_eq!(paid.status, Status::Paid);

        let edited = edit_note_payment(&paid, payment_id, &edit(60), now()).unwrap();
        assert_eq!(edited.owner.amount_paid, Money::from_major(60));
        assert_eq!(edited.owner.status, Status::Pending);
        assert!(edited.owner.validate().is_ok());

        let deleted = delete_note_payment(&edited.owner, payment_id, now()).unwrap();
        assert_eq!(deleted.owner.amount_paid, Money::ZERO);
        assert!(deleted.owner.payments.is_empty());
        assert_eq!(deleted.removed.amount, Money::from_major(60));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Apply(i64),
        Edit(usize, i64),
        Delete(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..20_000i64).prop_map(Op::Apply),
            (any::<usize>(), 0i64..20_000i64).prop_map(|(index, cents)| Op::Edit(index, cents)),
            any::<usize>().prop_map(Op::Delete),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// paid stays within bounds and matches its payments through any history
        #[test]
        fn mixed_history_keeps_installment_consistent(
            amount_cents in 1i64..15_000i64,
            ops in prop::collection::vec(arb_op(), 1..24),
        ) {
            let due = now() + Duration::days(5);
            let mut inst = Installment::new(Uuid::from_u64_pair(0, 9), 1, Money::from_cents(amount_cents), due);
            let mut next_id = 1u64;

            for (step, op) in ops.into_iter().enumerate() {
                // walk the clock across the due date
                let at = now() + Duration::days(step as i64);
                status::refresh_installment(&mut inst, at);
                match op {
                    Op::Apply(cents) => {
                        let result = apply_payment(
                            &inst,
                            Money::from_cents(cents),
                            &PaymentMeta::new(PaymentMethod::Pix),
                            Uuid::nil(),
                            Uuid::from_u64_pair(0, next_id),
                            at,
                        )
                        .unwrap();
                        next_id += 1;
                        inst = result.installment;
                    }
                    Op::Edit(index, cents) => {
                        if inst.payments.is_empty() {
                            continue;
                        }
                        let id = inst.payments[index % inst.payments.len()].id;
                        let change = PaymentEdit {
                            amount: Money::from_cents(cents),
                            method: PaymentMethod::Cash,
                            notes: None,
                        };
                        match edit_payment(&inst, id, &change, at) {
                            Ok(result) => inst = result.owner,
                            Err(LedgerError::Overpayment { .. }) => {}
                            Err(other) => prop_assert!(false, "unexpected edit error: {}", other),
                        }
                    }
                    Op::Delete(index) => {
                        if inst.payments.is_empty() {
                            continue;
                        }
                        let id = inst.payments[index % inst.payments.len()].id;
                        inst = delete_payment(&inst, id, at).unwrap().owner;
                    }
                }

                prop_assert!(!inst.amount_paid.is_negative());
                prop_assert!(inst.amount_paid <= inst.amount);
                let recorded: Money = inst.payments.iter().map(|p| p.amount).sum();
                prop_assert_eq!(recorded, inst.amount_paid);
                prop_assert!(!inst.paid_late || inst.paid);

                let mut note = Note::from_installments(Uuid::nil(), Uuid::nil(), now(), vec![inst.clone()]);
                note.status = status::resolve_note_status(&note, at);
                prop_assert!(status::is_consistent(&note, at));
                prop_assert!(note.validate().is_ok());

                let mut reconciled = note.clone();
                reconciled.reconcile(at);
                prop_assert_eq!(reconciled, note);
            }
        }
    }
}
