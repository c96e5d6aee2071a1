use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::types::OverpaymentPolicy;

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// how manual payments above the amount due are handled.
    /// distribution across a customer always caps and returns the remainder.
    pub overpayment_policy: OverpaymentPolicy,
    /// months between consecutive installment due dates
    pub installment_interval_months: u32,
    /// upper bound on installments per note
    pub max_installments: u32,
    /// non-manager actors cannot issue notes to ineligible customers
    pub enforce_eligibility: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            overpayment_policy: OverpaymentPolicy::Reject,
            installment_interval_months: 1,
            max_installments: 120,
            enforce_eligibility: true,
        }
    }
}

impl LedgerConfig {
    /// parse from json, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.installment_interval_months == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "installment interval must be at least one month".to_string(),
            });
        }

        if self.max_installments == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "max installments must be at least one".to_string(),
            });
        }

        Ok(())
    }
}
