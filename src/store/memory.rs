use std::collections::BTreeMap;

use crate::customer::Customer;
use crate::errors::{LedgerError, Result};
use crate::types::CustomerId;

use super::CustomerRepository;

/// in-process repository, also the reference for tests
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    customers: BTreeMap<CustomerId, Customer>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl CustomerRepository for MemoryRepository {
    fn load_customer(&self, id: CustomerId) -> Result<Customer> {
        self.customers
            .get(&id)
            .cloned()
            .ok_or(LedgerError::CustomerNotFound { id })
    }

    fn save_customer(&mut self, customer: &Customer) -> Result<()> {
        self.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    fn list_customers(&self) -> Result<Vec<CustomerId>> {
        Ok(self.customers.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::NewCustomer;
    use crate::decimal::Money;
    use crate::note::Note;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_round_trip_and_notes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut repo = MemoryRepository::new();
        let customer = Customer::register(Uuid::from_u64_pair(0, 1), NewCustomer::named("Ana"), now).unwrap();
        repo.save_customer(&customer).unwrap();

        assert_eq!(repo.load_customer(customer.id).unwrap(), customer);
        assert!(repo.load_notes_for_customer(customer.id).unwrap().is_empty());

        let note = Note::single(Uuid::from_u64_pair(0, 2), customer.id, Money::from_major(10), now, now);
        repo.save_notes(customer.id, &[note.clone()]).unwrap();
        assert_eq!(repo.load_notes_for_customer(customer.id).unwrap(), vec![note]);
        assert_eq!(repo.list_customers().unwrap(), vec![customer.id]);
    }

    #[test]
    fn test_missing_customer() {
        let repo = MemoryRepository::new();
        assert!(matches!(
            repo.load_customer(Uuid::nil()),
            Err(LedgerError::CustomerNotFound { .. })
        ));
    }
}
