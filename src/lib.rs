pub mod config;
pub mod customer;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ids;
pub mod ledger;
pub mod note;
pub mod payments;
pub mod status;
pub mod store;
pub mod summary;
pub mod types;

// re-export key types
pub use config::LedgerConfig;
pub use customer::{Customer, NewCustomer, PaymentLocation};
pub use decimal::Money;
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use ledger::{CreditLedger, PaymentReceipt};
pub use note::{Installment, Note, NoteDraft};
pub use payments::{
    apply_payment, delete_note_payment, delete_payment, distribute_payment, edit_note_payment,
    edit_payment, pay_note, pay_note_directly, Allocation, AllocationTarget, Distribution,
    EditEntry, NotePayment, OverpaymentGuard, Payment, PaymentEdit, PaymentMeta,
};
pub use status::{resolve_installment_status, resolve_note_status};
pub use store::{CustomerRepository, FallbackRepository, JsonFileRepository, MemoryRepository};
pub use summary::CustomerStatement;
pub use types::{
    Actor, CustomerId, Eligibility, InstallmentId, NoteId, OverpaymentPolicy, PaymentId,
    PaymentMethod, PaymentTarget, Status,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
