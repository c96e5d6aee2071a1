use crate::customer::Customer;
use crate::errors::Result;
use crate::types::CustomerId;

use super::CustomerRepository;

/// tries `primary` first and falls back to `secondary` when the primary
/// fails at the storage level. request errors such as a missing customer
/// are returned as-is.
#[derive(Debug, Clone)]
pub struct FallbackRepository<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackRepository<P, S>
where
    P: CustomerRepository,
    S: CustomerRepository,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

impl<P, S> CustomerRepository for FallbackRepository<P, S>
where
    P: CustomerRepository,
    S: CustomerRepository,
{
    fn load_customer(&self, id: CustomerId) -> Result<Customer> {
        match self.primary.load_customer(id) {
            Err(err) if err.is_storage() => {
                tracing::warn!(customer_id = %id, error = %err, "primary store failed, reading fallback");
                self.secondary.load_customer(id)
            }
            other => other,
        }
    }

    fn save_customer(&mut self, customer: &Customer) -> Result<()> {
        match self.primary.save_customer(customer) {
            Err(err) if err.is_storage() => {
                tracing::warn!(customer_id = %customer.id, error = %err, "primary store failed, writing fallback");
                self.secondary.save_customer(customer)
            }
            other => other,
        }
    }

    fn list_customers(&self) -> Result<Vec<CustomerId>> {
        match self.primary.list_customers() {
            Err(err) if err.is_storage() => {
                tracing::warn!(error = %err, "primary store failed, listing fallback");
                self.secondary.list_customers()
            }
            other => other,
        }
    }
}
