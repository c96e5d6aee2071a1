use chrono::{DateTime, Utc};

use crate::note::{Installment, Note};
use crate::types::Status;

/// derived status of one installment at `now`
pub fn resolve_installment_status(installment: &Installment, now: DateTime<Utc>) -> Status {
    if installment.paid {
        if installment.paid_late {
            Status::PaidLate
        } else {
            Status::Paid
        }
    } else if installment.due_date < now {
        Status::Overdue
    } else {
        Status::Pending
    }
}

/// derived status of a note at `now`
pub fn resolve_note_status(note: &Note, now: DateTime<Utc>) -> Status {
    if note.installment {
        resolve_installment_note(note, now)
    } else {
        resolve_single_note(note, now)
    }
}

fn resolve_installment_note(note: &Note, now: DateTime<Utc>) -> Status {
    let all_paid = note.installments.iter().all(|i| i.paid);

    if all_paid {
        if note.installments.iter().any(|i| i.paid_late) {
            Status::PaidLate
        } else {
            Status::Paid
        }
    } else if note.installments.iter().any(|i| !i.paid && i.due_date < now) {
        Status::Overdue
    } else {
        Status::Pending
    }
}

fn resolve_single_note(note: &Note, now: DateTime<Utc>) -> Status {
    let past_due = note.due_date < now;

    match (note.is_fully_paid(), past_due) {
        (true, true) => Status::PaidLate,
        (true, false) => Status::Paid,
        (false, true) => Status::Overdue,
        (false, false) => Status::Pending,
    }
}

/// sync the `paid` flag with the amounts and recompute `status`.
///
/// every mutation ends here or in [`refresh_note`], so the cached fields
/// always equal a fresh resolve at the same instant.
///
/// `paid_late` is only ever raised by the code that completes a payment;
/// here it is cleared when the installment is no longer fully paid.
pub fn refresh_installment(installment: &mut Installment, now: DateTime<Utc>) {
    installment.paid = installment.is_fully_paid();
    if !installment.paid {
        installment.paid_late = false;
    }
    installment.status = resolve_installment_status(installment, now);
}

/// refresh every installment, then the note itself
pub fn refresh_note(note: &mut Note, now: DateTime<Utc>) {
    for installment in &mut note.installments {
        refresh_installment(installment, now);
    }
    note.status = resolve_note_status(note, now);
}

/// true when every cached status equals a fresh resolve at `now`
pub fn is_consistent(note: &Note, now: DateTime<Utc>) -> bool {
    note.status == resolve_note_status(note, now)
        && note.installments.iter().all(|i| {
            i.paid == i.is_fully_paid() && i.status == resolve_installment_status(i, now)
        })
}
