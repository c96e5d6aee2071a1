use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::ids::IdGenerator;
use crate::note::Note;
use crate::status;
use crate::types::{InstallmentId, NoteId, PaymentId};

use super::{apply_payment, pay_note_directly, validate_amount, Payment, PaymentMeta};

/// what a slice of a distributed payment was applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationTarget {
    Installment {
        note_id: NoteId,
        installment_id: InstallmentId,
        number: u32,
    },
    /// single-payment note treated as one pseudo-installment
    Note { note_id: NoteId },
}

impl AllocationTarget {
    pub fn note_id(&self) -> NoteId {
        match self {
            AllocationTarget::Installment { note_id, .. } | AllocationTarget::Note { note_id } => *note_id,
        }
    }
}

/// one step of a distribution, in processing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub target: AllocationTarget,
    pub due_date: DateTime<Utc>,
    pub was_overdue: bool,
    pub amount: Money,
    pub payment_id: PaymentId,
}

/// result of distributing one payment across a customer's notes
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    /// every supplied note, in supply order, updated where touched
    pub notes: Vec<Note>,
    pub payments: Vec<Payment>,
    pub allocations: Vec<Allocation>,
    /// part of the request nothing was left to absorb
    pub remainder: Money,
}

impl Distribution {
    pub fn applied(&self) -> Money {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    /// ids of notes that received funds, first touch order
    pub fn touched_notes(&self) -> Vec<NoteId> {
        let mut touched = Vec::new();
        for allocation in &self.allocations {
            let id = allocation.target.note_id();
            if !touched.contains(&id) {
                touched.push(id);
            }
        }
        touched
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    note: usize,
    installment: Option<usize>,
    due_date: DateTime<Utc>,
}

/// every open debt across the notes, in supply order
fn collect_candidates(notes: &[Note]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (n, note) in notes.iter().enumerate() {
        if note.installment {
            for (i, installment) in note.installments.iter().enumerate() {
                if !installment.is_fully_paid() {
                    candidates.push(Candidate {
                        note: n,
                        installment: Some(i),
                        due_date: installment.due_date,
                    });
                }
            }
        } else if !note.is_fully_paid() {
            candidates.push(Candidate {
                note: n,
                installment: None,
                due_date: note.due_date,
            });
        }
    }

    candidates
}

/// processing order: overdue before not-yet-due, earliest due first within
/// each group. both sorts are stable, so equal due dates keep supply order.
fn prioritize(candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<(Candidate, bool)> {
    let (mut overdue, mut upcoming): (Vec<_>, Vec<_>) =
        candidates.into_iter().partition(|c| c.due_date < now);
    overdue.sort_by_key(|c| c.due_date);
    upcoming.sort_by_key(|c| c.due_date);

    overdue
        .into_iter()
        .map(|c| (c, true))
        .chain(upcoming.into_iter().map(|c| (c, false)))
        .collect()
}

/// spread one payment across all open installments and single-payment notes
pub fn distribute_payment(
    amount: Money,
    notes: &[Note],
    meta: &PaymentMeta,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
) -> Result<Distribution> {
    validate_amount(amount)?;

    let mut updated = notes.to_vec();
    let mut payments = Vec::new();
    let mut allocations = Vec::new();
    let mut remaining = amount;

    for (candidate, was_overdue) in prioritize(collect_candidates(notes), now) {
        if remaining.is_zero() {
            break;
        }

        let note = &mut updated[candidate.note];
        let (payment, target) = match candidate.installment {
            Some(index) => {
                let result = apply_payment(
                    &note.installments[index],
                    remaining,
                    meta,
                    note.id,
                    ids.next_id(),
                    now,
                )?;
                let target = AllocationTarget::Installment {
                    note_id: note.id,
                    installment_id: result.installment.id,
                    number: result.installment.number,
                };
                let Some(payment) = result.payment else {
                    continue;
                };
                note.amount_paid += payment.amount;
                note.installments[index] = result.installment;
                status::refresh_note(note, now);
                (payment, target)
            }
            None => {
                let result = pay_note_directly(note, remaining, meta, ids.next_id(), now)?;
                let target = AllocationTarget::Note { note_id: note.id };
                *note = result.note;
                match result.payments.into_iter().next() {
                    Some(payment) => (payment, target),
                    None => continue,
                }
            }
        };

        tracing::debug!(
            note_id = %target.note_id(),
            due_date = %candidate.due_date,
            overdue = was_overdue,
            applied = %payment.amount,
            "distributed slice"
        );

        remaining -= payment.amount;
        allocations.push(Allocation {
            target,
            due_date: candidate.due_date,
            was_overdue,
            amount: payment.amount,
            payment_id: payment.id,
        });
        payments.push(payment);
    }

    Ok(Distribution {
        notes: updated,
        payments,
        allocations,
        remainder: remaining,
    })
}
