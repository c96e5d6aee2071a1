pub mod fallback;
pub mod json_file;
pub mod memory;

use crate::customer::Customer;
use crate::errors::Result;
use crate::note::Note;
use crate::types::CustomerId;

pub use fallback::FallbackRepository;
pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;

/// storage of customers together with the notes they own; only the ledger
/// loads and saves through it
pub trait CustomerRepository {
    fn load_customer(&self, id: CustomerId) -> Result<Customer>;

    /// insert or replace the whole customer snapshot
    fn save_customer(&mut self, customer: &Customer) -> Result<()>;

    fn list_customers(&self) -> Result<Vec<CustomerId>>;

    fn load_notes_for_customer(&self, id: CustomerId) -> Result<Vec<Note>> {
        Ok(self.load_customer(id)?.notes)
    }

    fn save_notes(&mut self, id: CustomerId, notes: &[Note]) -> Result<()> {
        let mut customer = self.load_customer(id)?;
        customer.notes = notes.to_vec();
        self.save_customer(&customer)
    }
}
