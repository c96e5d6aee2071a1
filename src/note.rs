use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ids::IdGenerator;
use crate::payments::Payment;
use crate::status;
use crate::types::{CustomerId, InstallmentId, NoteId, PaymentId, Status};

/// one scheduled portion of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: InstallmentId,
    pub number: u32,
    pub amount: Money,
    pub amount_paid: Money,
    pub due_date: DateTime<Utc>,
    pub paid: bool,
    pub paid_late: bool,
    pub status: Status,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Installment {
    pub fn new(id: InstallmentId, number: u32, amount: Money, due_date: DateTime<Utc>) -> Self {
        Self {
            id,
            number,
            amount,
            amount_paid: Money::ZERO,
            due_date,
            paid: false,
            paid_late: false,
            status: Status::Pending,
            payments: Vec::new(),
        }
    }

    /// amount still owed
    pub fn remaining(&self) -> Money {
        self.amount.saturating_sub(self.amount_paid)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.amount_paid >= self.amount
    }

    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == id)
    }
}

/// promissory note: a debt owed by a customer, optionally split into installments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub amount_paid: Money,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub installment: bool,
    pub installment_count: Option<u32>,
    #[serde(default)]
    pub installments: Vec<Installment>,
    pub status: Status,
    /// direct payments, only used when `installment` is false
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub description: Option<String>,
}

/// terms for issuing or amending a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub amount: Money,
    pub issue_date: DateTime<Utc>,
    /// required for single-payment notes, ignored when split into installments
    pub due_date: Option<DateTime<Utc>>,
    /// `Some(n)` splits the note into n monthly installments
    pub installments: Option<u32>,
    pub description: Option<String>,
}

impl NoteDraft {
    /// single-payment note due on `due_date`
    pub fn single(amount: Money, issue_date: DateTime<Utc>, due_date: DateTime<Utc>) -> Self {
        Self {
            amount,
            issue_date,
            due_date: Some(due_date),
            installments: None,
            description: None,
        }
    }

    /// note split into `count` installments
    pub fn split(amount: Money, issue_date: DateTime<Utc>, count: u32) -> Self {
        Self {
            amount,
            issue_date,
            due_date: None,
            installments: Some(count),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self, config: &LedgerConfig) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(LedgerError::InvalidNoteTerms {
                message: format!("amount must be positive, got {}", self.amount),
            });
        }

        match self.installments {
            Some(0) => Err(LedgerError::InvalidNoteTerms {
                message: "installment count must be at least one".to_string(),
            }),
            Some(n) if n > config.max_installments => Err(LedgerError::InvalidNoteTerms {
                message: format!(
                    "installment count {} exceeds maximum {}",
                    n, config.max_installments
                ),
            }),
            Some(n) if Money::from_cents(n as i64) > self.amount => {
                Err(LedgerError::InvalidNoteTerms {
                    message: format!("amount {} too small for {} installments", self.amount, n),
                })
            }
            Some(_) => Ok(()),
            None => match self.due_date {
                None => Err(LedgerError::InvalidNoteTerms {
                    message: "single-payment note requires a due date".to_string(),
                }),
                Some(due) if due < self.issue_date => Err(LedgerError::InvalidNoteTerms {
                    message: "due date precedes issue date".to_string(),
                }),
                Some(_) => Ok(()),
            },
        }
    }
}

/// due dates `issue + k * interval` months for k in 1..=count
fn schedule_due_dates(
    issue_date: DateTime<Utc>,
    count: u32,
    interval_months: u32,
) -> Result<Vec<DateTime<Utc>>> {
    (1..=count)
        .map(|k| {
            issue_date
                .checked_add_months(Months::new(k * interval_months))
                .ok_or(LedgerError::InvalidNoteTerms {
                    message: format!("installment {} due date out of range", k),
                })
        })
        .collect()
}

impl Note {
    /// build a note snapshot from already scheduled installments
    pub fn from_installments(
        id: NoteId,
        customer_id: CustomerId,
        issue_date: DateTime<Utc>,
        installments: Vec<Installment>,
    ) -> Self {
        let amount = installments.iter().map(|i| i.amount).sum();
        let amount_paid = installments.iter().map(|i| i.amount_paid).sum();
        let due_date = installments
            .iter()
            .map(|i| i.due_date)
            .max()
            .unwrap_or(issue_date);

        Self {
            id,
            customer_id,
            amount,
            amount_paid,
            issue_date,
            due_date,
            installment: true,
            installment_count: Some(installments.len() as u32),
            installments,
            status: Status::Pending,
            payments: Vec::new(),
            description: None,
        }
    }

    /// build a single-payment note snapshot
    pub fn single(
        id: NoteId,
        customer_id: CustomerId,
        amount: Money,
        issue_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            amount,
            amount_paid: Money::ZERO,
            issue_date,
            due_date,
            installment: false,
            installment_count: None,
            installments: Vec::new(),
            status: Status::Pending,
            payments: Vec::new(),
            description: None,
        }
    }

    /// issue a new note, generating its installment schedule
    pub fn issue(
        draft: &NoteDraft,
        customer_id: CustomerId,
        config: &LedgerConfig,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        draft.validate(config)?;

        let mut note = match draft.installments {
            Some(count) => {
                let due_dates = schedule_due_dates(
                    draft.issue_date,
                    count,
                    config.installment_interval_months,
                )?;
                let installments = draft
                    .amount
                    .split(count)
                    .into_iter()
                    .zip(due_dates)
                    .enumerate()
                    .map(|(i, (amount, due))| Installment::new(ids.next_id(), i as u32 + 1, amount, due))
                    .collect();
                Note::from_installments(ids.next_id(), customer_id, draft.issue_date, installments)
            }
            None => {
                let due_date = draft.due_date.unwrap_or(draft.issue_date);
                Note::single(ids.next_id(), customer_id, draft.amount, draft.issue_date, due_date)
            }
        };

        note.description = draft.description.clone();
        status::refresh_note(&mut note, now);
        Ok(note)
    }

    /// rebuild the schedule under new terms, keeping what was already paid.
    ///
    /// installments are matched by number; a match keeps its id, paid amount,
    /// late flag and payments.
    pub fn regenerate(
        &self,
        draft: &NoteDraft,
        config: &LedgerConfig,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let mut note = Note::issue(draft, self.customer_id, config, ids, now)?;
        note.id = self.id;
        if note.description.is_none() {
            note.description = self.description.clone();
        }

        match (self.installment, note.installment) {
            (true, true) => {
                for old in &self.installments {
                    let carries_payments = old.amount_paid.is_positive() || !old.payments.is_empty();
                    let Some(new) = note.installments.iter_mut().find(|i| i.number == old.number) else {
                        if carries_payments {
                            return Err(LedgerError::InvalidNoteTerms {
                                message: format!(
                                    "installment {} has payments and cannot be dropped",
                                    old.number
                                ),
                            });
                        }
                        continue;
                    };

                    if old.amount_paid > new.amount {
                        return Err(LedgerError::InvalidNoteTerms {
                            message: format!(
                                "installment {} already has {} paid, above new amount {}",
                                old.number, old.amount_paid, new.amount
                            ),
                        });
                    }

                    new.id = old.id;
                    new.amount_paid = old.amount_paid;
                    new.paid_late = old.paid_late || became_paid_late(old, new.amount, new.due_date);
                    new.payments = old.payments.clone();
                }
            }
            (false, false) => {
                if self.amount_paid > note.amount {
                    return Err(LedgerError::InvalidNoteTerms {
                        message: format!(
                            "note already has {} paid, above new amount {}",
                            self.amount_paid, note.amount
                        ),
                    });
                }
                note.payments = self.payments.clone();
            }
            _ => {
                if self.has_payments() {
                    return Err(LedgerError::InvalidNoteTerms {
                        message: "cannot switch payment mode of a note with recorded payments"
                            .to_string(),
                    });
                }
            }
        }

        note.reconcile(now);
        Ok(note)
    }

    pub fn remaining(&self) -> Money {
        self.amount.saturating_sub(self.amount_paid)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.amount_paid >= self.amount
    }

    pub fn has_payments(&self) -> bool {
        !self.payments.is_empty() || self.installments.iter().any(|i| !i.payments.is_empty())
    }

    pub fn installment(&self, id: InstallmentId) -> Option<&Installment> {
        self.installments.iter().find(|i| i.id == id)
    }


    /// installment that owns a payment, `None` for direct note payments
    pub fn payment_owner(&self, payment_id: PaymentId) -> Option<Option<InstallmentId>> {
        if self.payments.iter().any(|p| p.id == payment_id) {
            return Some(None);
        }
        self.installments
            .iter()
            .find(|i| i.payment(payment_id).is_some())
            .map(|i| Some(i.id))
    }

    /// paid total derived from the parts, never patched incrementally
    pub fn derived_amount_paid(&self) -> Money {
        if self.installment {
            self.installments.iter().map(|i| i.amount_paid).sum()
        } else {
            self.payments.iter().map(|p| p.amount).sum()
        }
    }

    /// re-derive the paid total and refresh every cached status
    pub fn reconcile(&mut self, now: DateTime<Utc>) {
        self.amount_paid = self.derived_amount_paid();
        status::refresh_note(self, now);
    }

    /// check reconciliation and schedule invariants
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| {
            Err(LedgerError::InconsistentState {
                message: format!("note {}: {}", self.id, message),
            })
        };

        if self.amount_paid.is_negative() || self.amount_paid > self.amount {
            return fail(format!("paid {} outside 0..={}", self.amount_paid, self.amount));
        }

        let derived = self.derived_amount_paid();
        if derived != self.amount_paid {
            return fail(format!("recorded paid {} but parts sum to {}", self.amount_paid, derived));
        }

        if !self.installment {
            if !self.installments.is_empty() {
                return fail("single-payment note carries installments".to_string());
            }
            return Ok(());
        }

        if !self.payments.is_empty() {
            return fail("installment note carries direct payments".to_string());
        }

        if self.installment_count != Some(self.installments.len() as u32) {
            return fail(format!(
                "installment count {:?} but {} installments",
                self.installment_count,
                self.installments.len()
            ));
        }

        let mut previous_due: Option<DateTime<Utc>> = None;
        for (index, inst) in self.installments.iter().enumerate() {
            if inst.number != index as u32 + 1 {
                return fail(format!("installment numbering broken at position {}", index + 1));
            }
            if previous_due.is_some_and(|prev| inst.due_date <= prev) {
                return fail(format!("installment {} due date not increasing", inst.number));
            }
            previous_due = Some(inst.due_date);

            if inst.amount_paid.is_negative() || inst.amount_paid > inst.amount {
                return fail(format!(
                    "installment {} paid {} outside 0..={}",
                    inst.number, inst.amount_paid, inst.amount
                ));
            }
            let payments: Money = inst.payments.iter().map(|p| p.amount).sum();
            if payments != inst.amount_paid {
                return fail(format!(
                    "installment {} paid {} but payments sum to {}",
                    inst.number, inst.amount_paid, payments
                ));
            }
        }

        Ok(())
    }
}

/// an installment that becomes fully paid only because its amount shrank
fn became_paid_late(old: &Installment, new_amount: Money, new_due: DateTime<Utc>) -> bool {
    if old.is_fully_paid() || old.amount_paid < new_amount {
        return false;
    }
    old.payments
        .iter()
        .map(|p| p.timestamp)
        .max()
        .is_some_and(|last| last > new_due)
}
