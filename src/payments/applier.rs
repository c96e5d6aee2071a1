use chrono::{DateTime, Utc};

use crate::decimal::Money;
use crate::errors::Result;
use crate::note::Installment;
use crate::status;
use crate::types::{NoteId, PaymentId};

use super::{validate_amount, Payment, PaymentMeta};

/// result of applying funds to one installment
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPayment {
    pub installment: Installment,
    /// `None` when the installment had nothing left to absorb
    pub payment: Option<Payment>,
}

impl AppliedPayment {
    pub fn applied(&self) -> Money {
        self.payment.as_ref().map_or(Money::ZERO, |p| p.amount)
    }
}

/// apply up to `requested` to one installment.
///
/// the applied amount is capped at what the installment still owes; the
/// caller decides what happens to any excess. re-applying to a settled
/// installment records nothing and leaves `paid_late` as it was.
pub fn apply_payment(
    installment: &Installment,
    requested: Money,
    meta: &PaymentMeta,
    note_id: NoteId,
    payment_id: PaymentId,
    now: DateTime<Utc>,
) -> Result<AppliedPayment> {
    validate_amount(requested)?;

    let applied = requested.min(installment.remaining());
    let was_paid = installment.is_fully_paid();
    let mut updated = installment.clone();

    let payment = if applied.is_positive() {
        let payment = Payment {
            id: payment_id,
            amount: applied,
            method: meta.method,
            timestamp: now,
            note_id: Some(note_id),
            installment_id: Some(installment.id),
            notes: meta.notes.clone(),
            edited: false,
            edit_history: Vec::new(),
        };
        updated.amount_paid += applied;
        updated.payments.push(payment.clone());
        Some(payment)
    } else {
        None
    };

    if updated.is_fully_paid() && !was_paid && now > updated.due_date {
        updated.paid_late = true;
    }
    status::refresh_installment(&mut updated, now);

    tracing::debug!(
        installment_id = %installment.id,
        number = installment.number,
        requested = %requested,
        applied = %applied,
        status = %updated.status,
        "applied payment to installment"
    );

    Ok(AppliedPayment {
        installment: updated,
        payment,
    })
}
