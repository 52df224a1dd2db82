//! Storage layer: inventory counts, the loan ledger and the member directory

pub mod inventory;
pub mod ledger;
pub mod users;

use std::sync::Arc;

/// Main repository struct holding the shared stores
#[derive(Clone)]
pub struct Repository {
    pub inventory: Arc<inventory::InventoryStore>,
    pub ledger: Arc<ledger::LoanLedger>,
    pub users: Arc<users::UserDirectory>,
}

impl Repository {
    pub fn new() -> Self {
        Self {
            inventory: Arc::new(inventory::InventoryStore::new()),
            ledger: Arc::new(ledger::LoanLedger::new()),
            users: Arc::new(users::UserDirectory::new()),
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
