pub mod applier;
pub mod cascade;
pub mod distribution;
pub mod history;
pub mod overpayment;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{InstallmentId, NoteId, PaymentId, PaymentMethod};

pub use applier::{apply_payment, AppliedPayment};
pub use cascade::{pay_note, pay_note_directly, NotePayment};
pub use distribution::{distribute_payment, Allocation, AllocationTarget, Distribution};
pub use history::{
    delete_note_payment, delete_payment, edit_note_payment, edit_payment, DeletedPayment,
    EditedPayment, PaymentEdit,
};
pub use overpayment::{OverpaymentCheck, OverpaymentGuard};

/// a recorded funds application against an installment or a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
    pub note_id: Option<NoteId>,
    pub installment_id: Option<InstallmentId>,
    pub notes: Option<String>,
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub edit_history: Vec<EditEntry>,
}

/// immutable record of a change to a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub amount_before: Money,
    pub amount_after: Money,
}

/// caller-supplied details attached to every payment created by a request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentMeta {
    pub method: PaymentMethod,
    pub notes: Option<String>,
    /// the caller accepted that the excess over the amount due is not applied
    pub confirm_overpayment: bool,
}

impl PaymentMeta {
    pub fn new(method: PaymentMethod) -> Self {
        Self {
            method,
            notes: None,
            confirm_overpayment: false,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirm_overpayment = true;
        self
    }
}

/// reject zero and negative request amounts before anything is touched
pub(crate) fn validate_amount(amount: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount { amount });
    }
    Ok(())
}
