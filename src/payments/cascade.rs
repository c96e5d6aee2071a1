use chrono::{DateTime, Utc};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ids::IdGenerator;
use crate::note::Note;
use crate::status;

use super::{apply_payment, validate_amount, Payment, PaymentMeta};

/// result of paying against one note
#[derive(Debug, Clone, PartialEq)]
pub struct NotePayment {
    pub note: Note,
    pub payments: Vec<Payment>,
    /// part of the request that found nothing left to pay
    pub remainder: Money,
}

impl NotePayment {
    pub fn applied(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

/// cascade `amount` across the note's unpaid installments, earliest due first
pub fn pay_note(
    note: &Note,
    amount: Money,
    meta: &PaymentMeta,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
) -> Result<NotePayment> {
    validate_amount(amount)?;
    if !note.installment {
        return Err(LedgerError::NotInstallmentBased { id: note.id });
    }

    let mut updated = note.clone();
    let mut payments = Vec::new();
    let mut remaining = amount;

    // stable sort keeps schedule order for equal due dates
    let mut order: Vec<usize> = (0..updated.installments.len())
        .filter(|&i| !updated.installments[i].is_fully_paid())
        .collect();
    order.sort_by_key(|&i| updated.installments[i].due_date);

    for index in order {
        if remaining.is_zero() {
            break;
        }

        let result = apply_payment(
            &updated.installments[index],
            remaining,
            meta,
            updated.id,
            ids.next_id(),
            now,
        )?;

        remaining -= result.applied();
        payments.extend(result.payment);
        updated.installments[index] = result.installment;
    }

    updated.amount_paid += amount - remaining;
    status::refresh_note(&mut updated, now);

    tracing::debug!(
        note_id = %note.id,
        requested = %amount,
        applied = %(amount - remaining),
        remainder = %remaining,
        payments = payments.len(),
        "cascaded payment across note"
    );

    Ok(NotePayment {
        note: updated,
        payments,
        remainder: remaining,
    })
}

/// single direct payment against a note without installments
pub fn pay_note_directly(
    note: &Note,
    amount: Money,
    meta: &PaymentMeta,
    payment_id: crate::types::PaymentId,
    now: DateTime<Utc>,
) -> Result<NotePayment> {
    validate_amount(amount)?;
    if note.installment {
        return Err(LedgerError::InvalidNoteTerms {
            message: format!("note {} is paid through its installments", note.id),
        });
    }

    let due = note.remaining();
    let mut updated = note.clone();
    let mut payments = Vec::new();
    let applied = amount.min(due);

    if applied.is_positive() {
        let payment = Payment {
            id: payment_id,
            amount: applied,
            method: meta.method,
            timestamp: now,
            note_id: Some(note.id),
            installment_id: None,
            notes: meta.notes.clone(),
            edited: false,
            edit_history: Vec::new(),
        };
        updated.amount_paid += applied;
        updated.payments.push(payment.clone());
        payments.push(payment);
    }
    status::refresh_note(&mut updated, now);

    tracing::debug!(
        note_id = %note.id,
        requested = %amount,
        applied = %applied,
        "applied direct payment to note"
    );

    Ok(NotePayment {
        note: updated,
        payments,
        remainder: amount - applied,
    })
}
