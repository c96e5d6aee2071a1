use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::OverpaymentPolicy;

use super::PaymentMeta;

/// outcome of checking a manual request against the amount due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverpaymentCheck {
    /// request fits in what is owed
    WithinDue,
    /// request exceeds what is owed; `excess` will come back as remainder
    Capped { excess: Money },
}

/// gate for payments aimed at one note or one installment.
///
/// distribution across a customer never goes through here: it always caps
/// and hands the remainder back.
#[derive(Debug, Clone, Copy)]
pub struct OverpaymentGuard {
    policy: OverpaymentPolicy,
}

impl OverpaymentGuard {
    pub fn new(policy: OverpaymentPolicy) -> Self {
        Self { policy }
    }

    pub fn check(&self, requested: Money, amount_due: Money, meta: &PaymentMeta) -> Result<OverpaymentCheck> {
        if requested <= amount_due {
            return Ok(OverpaymentCheck::WithinDue);
        }

        match self.policy {
            OverpaymentPolicy::Reject if !meta.confirm_overpayment => {
                tracing::warn!(
                    requested = %requested,
                    amount_due = %amount_due,
                    "rejected unconfirmed overpayment"
                );
                Err(LedgerError::Overpayment {
                    amount_due,
                    requested,
                })
            }
            OverpaymentPolicy::Reject | OverpaymentPolicy::Cap => Ok(OverpaymentCheck::Capped {
                excess: requested - amount_due,
            }),
        }
    }
}
