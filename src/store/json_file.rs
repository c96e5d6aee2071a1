use std::fs;
use std::path::PathBuf;

use uuid::Uuid;

use crate::customer::Customer;
use crate::errors::{LedgerError, Result};
use crate::types::CustomerId;

use super::CustomerRepository;

/// one pretty-printed json document per customer inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, id: CustomerId) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}

impl CustomerRepository for JsonFileRepository {
    fn load_customer(&self, id: CustomerId) -> Result<Customer> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(LedgerError::CustomerNotFound { id });
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save_customer(&mut self, customer: &Customer) -> Result<()> {
        let json = serde_json::to_string_pretty(customer)?;
        let path = self.path_for(customer.id);
        let staging = path.with_extension("json.tmp");

        // rename keeps a crash from leaving half a document behind
        fs::write(&staging, json)?;
        fs::rename(&staging, &path)?;

        tracing::debug!(customer_id = %customer.id, path = %path.display(), "saved customer");
        Ok(())
    }

    fn list_customers(&self) -> Result<Vec<CustomerId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
