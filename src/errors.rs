use thiserror::Error;

use crate::decimal::Money;
use crate::types::{CustomerId, InstallmentId, NoteId, PaymentId};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid payment amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("customer not found: {id}")]
    CustomerNotFound {
        id: CustomerId,
    },

    #[error("note not found: {id}")]
    NoteNotFound {
        id: NoteId,
    },

    #[error("installment not found: {id}")]
    InstallmentNotFound {
        id: InstallmentId,
    },

    #[error("payment not found: {id}")]
    PaymentNotFound {
        id: PaymentId,
    },

    #[error("note {id} is not installment based")]
    NotInstallmentBased {
        id: NoteId,
    },

    #[error("installment {id} is already paid")]
    InstallmentAlreadyPaid {
        id: InstallmentId,
    },

    #[error("overpayment: amount due {amount_due}, requested {requested}")]
    Overpayment {
        amount_due: Money,
        requested: Money,
    },

    #[error("customer {id} is not eligible for new notes")]
    CustomerNotEligible {
        id: CustomerId,
    },

    #[error("invalid note terms: {message}")]
    InvalidNoteTerms {
        message: String,
    },

    #[error("invalid customer: {message}")]
    InvalidCustomer {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("inconsistent state: {message}")]
    InconsistentState {
        message: String,
    },

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

impl LedgerError {
    /// failures of the persistence layer rather than of the request
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            LedgerError::Io(_) | LedgerError::Serialization(_) | LedgerError::Storage { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
