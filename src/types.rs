use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a customer
pub type CustomerId = Uuid;

/// unique identifier for a promissory note
pub type NoteId = Uuid;

/// unique identifier for an installment
pub type InstallmentId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// derived status shared by installments and notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// open and not yet due
    #[default]
    Pending,
    /// fully paid on or before the due date
    Paid,
    /// open past its due date
    Overdue,
    /// fully paid after the due date
    PaidLate,
}

impl Status {
    pub fn is_settled(&self) -> bool {
        matches!(self, Status::Paid | Status::PaidLate)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Pending => "pending",
            Status::Paid => "paid",
            Status::Overdue => "overdue",
            Status::PaidLate => "paid_late",
        };
        f.write_str(label)
    }
}

/// how the funds were received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Pix,
    Card,
    Cash,
    Check,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Check => "check",
        };
        f.write_str(label)
    }
}

/// whether new notes may be issued to a customer without manager override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    #[default]
    Eligible,
    NotEligible,
}

/// who is performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Operator,
    /// may override the eligibility gate
    Manager,
}

/// where an inbound payment should go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentTarget {
    /// distribute across every open note of the customer
    Customer,
    /// cascade within one note
    Note(NoteId),
    /// apply to a single installment
    Installment(InstallmentId),
}

/// policy for manual payments above the amount due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// fail unless the request explicitly confirms the overpayment
    #[default]
    Reject,
    /// cap at the amount due and return the excess
    Cap,
}
