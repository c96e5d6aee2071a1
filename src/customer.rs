use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::note::Note;
use crate::types::{Actor, CustomerId, Eligibility, InstallmentId, NoteId, PaymentId};

/// a customer and the notes they owe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// CPF or CNPJ, stored as typed
    pub document: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub eligibility: Eligibility,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// registration data for a new customer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// where a payment lives inside a customer's notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentLocation {
    pub note_id: NoteId,
    /// `None` for a direct payment on a single-payment note
    pub installment_id: Option<InstallmentId>,
}

impl Customer {
    pub fn register(id: CustomerId, data: NewCustomer, now: DateTime<Utc>) -> Result<Self> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::InvalidCustomer {
                message: "customer name is required".to_string(),
            });
        }

        Ok(Self {
            id,
            name,
            document: data.document,
            phone: data.phone,
            email: data.email,
            address: data.address,
            eligibility: Eligibility::Eligible,
            created_at: now,
            notes: Vec::new(),
        })
    }

    /// eligibility gate for issuing new notes
    pub fn ensure_can_receive_note(&self, actor: Actor, enforce: bool) -> Result<()> {
        let blocked = enforce && self.eligibility == Eligibility::NotEligible && actor != Actor::Manager;
        if blocked {
            return Err(LedgerError::CustomerNotEligible { id: self.id });
        }
        Ok(())
    }

    pub fn note(&self, id: NoteId) -> Result<&Note> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or(LedgerError::NoteNotFound { id })
    }

    pub fn note_index(&self, id: NoteId) -> Result<usize> {
        self.notes
            .iter()
            .position(|n| n.id == id)
            .ok_or(LedgerError::NoteNotFound { id })
    }

    /// note index and installment index for an installment id
    pub fn installment_index(&self, id: InstallmentId) -> Result<(usize, usize)> {
        self.notes
            .iter()
            .enumerate()
            .find_map(|(n, note)| {
                note.installments
                    .iter()
                    .position(|i| i.id == id)
                    .map(|i| (n, i))
            })
            .ok_or(LedgerError::InstallmentNotFound { id })
    }

    pub fn locate_payment(&self, id: PaymentId) -> Result<PaymentLocation> {
        self.notes
            .iter()
            .find_map(|note| {
                note.payment_owner(id).map(|installment_id| PaymentLocation {
                    note_id: note.id,
                    installment_id,
                })
            })
            .ok_or(LedgerError::PaymentNotFound { id })
    }

    /// notes that still have something owed
    pub fn open_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| !n.is_fully_paid())
    }
}
