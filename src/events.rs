use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{CustomerId, Eligibility, InstallmentId, NoteId, PaymentId, PaymentMethod, Status};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // customer events
    CustomerRegistered {
        customer_id: CustomerId,
        timestamp: DateTime<Utc>,
    },
    EligibilityChanged {
        customer_id: CustomerId,
        old: Eligibility,
        new: Eligibility,
        timestamp: DateTime<Utc>,
    },

    // note lifecycle events
    NoteIssued {
        customer_id: CustomerId,
        note_id: NoteId,
        amount: Money,
        installments: Option<u32>,
        timestamp: DateTime<Utc>,
    },
    NoteAmended {
        customer_id: CustomerId,
        note_id: NoteId,
        old_amount: Money,
        new_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentApplied {
        customer_id: CustomerId,
        note_id: NoteId,
        installment_id: Option<InstallmentId>,
        payment_id: PaymentId,
        amount: Money,
        method: PaymentMethod,
        timestamp: DateTime<Utc>,
    },
    RemainderReturned {
        customer_id: CustomerId,
        requested: Money,
        remainder: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentEdited {
        customer_id: CustomerId,
        payment_id: PaymentId,
        amount_before: Money,
        amount_after: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentDeleted {
        customer_id: CustomerId,
        payment_id: PaymentId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // status change events
    NoteStatusChanged {
        customer_id: CustomerId,
        note_id: NoteId,
        old_status: Status,
        new_status: Status,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
