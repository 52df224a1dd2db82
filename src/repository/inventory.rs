//! Inventory store: per-title copy counts and catalog metadata
//!
//! The single source of truth for "can this title be borrowed right now".
//! All count mutations on a title go through the store's write lock, so
//! concurrent decrements on the last copy cannot both succeed.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::title::{CreateTitle, Title, TitleQuery},
};

#[derive(Default)]
pub struct InventoryStore {
    titles: RwLock<HashMap<Uuid, Title>>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a new catalog entry. All copies start available.
    pub fn insert(&self, req: CreateTitle) -> Title {
        let title = Title {
            id: Uuid::new_v4(),
            isbn: req.isbn,
            title: req.title,
            author: req.author,
            category: req.category.unwrap_or_else(|| "general".to_string()),
            total_copies: req.total_copies,
            available_copies: req.total_copies,
        };
        let mut titles = self.titles.write().expect("inventory lock poisoned");
        titles.insert(title.id, title.clone());
        title
    }

    pub fn get(&self, id: Uuid) -> AppResult<Title> {
        let titles = self.titles.read().expect("inventory lock poisoned");
        titles
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Title {} not found", id)))
    }

    pub fn list(&self, query: &TitleQuery) -> Vec<Title> {
        let titles = self.titles.read().expect("inventory lock poisoned");
        let mut result: Vec<Title> = titles
            .values()
            .filter(|t| {
                query
                    .category
                    .as_ref()
                    .map(|c| t.category.eq_ignore_ascii_case(c))
                    .unwrap_or(true)
            })
            .filter(|t| {
                query
                    .search
                    .as_ref()
                    .map(|s| {
                        let s = s.to_lowercase();
                        t.title.to_lowercase().contains(&s) || t.author.to_lowercase().contains(&s)
                    })
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.title.cmp(&b.title));
        result
    }

    pub fn get_available(&self, id: Uuid) -> AppResult<u32> {
        Ok(self.get(id)?.available_copies)
    }

    /// Take one copy if any is available. Returns false, with no side
    /// effect, when the count is already zero.
    pub fn try_decrement(&self, id: Uuid) -> AppResult<bool> {
        let mut titles = self.titles.write().expect("inventory lock poisoned");
        let title = titles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Title {} not found", id)))?;
        if title.available_copies == 0 {
            return Ok(false);
        }
        title.available_copies -= 1;
        Ok(true)
    }

    /// Put one copy back. Exceeding `total_copies` means a double return
    /// slipped past the ledger, which is a bug, not a user mistake.
    pub fn increment(&self, id: Uuid) -> AppResult<()> {
        let mut titles = self.titles.write().expect("inventory lock poisoned");
        let title = titles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Title {} not found", id)))?;
        if title.available_copies >= title.total_copies {
            return Err(AppError::Internal(format!(
                "available copies would exceed total for title {}",
                id
            )));
        }
        title.available_copies += 1;
        Ok(())
    }

    /// Catalog copy-count edit. Both fields are reconciled together against
    /// the current number of outstanding loans; shrinking below that number
    /// is rejected to keep the conservation invariant intact.
    pub fn set_total_copies(&self, id: Uuid, new_total: u32, outstanding: u32) -> AppResult<Title> {
        let mut titles = self.titles.write().expect("inventory lock poisoned");
        let title = titles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Title {} not found", id)))?;
        if new_total < outstanding {
            return Err(AppError::Validation(format!(
                "Cannot reduce copies to {} while {} are on loan",
                new_total, outstanding
            )));
        }
        title.total_copies = new_total;
        title.available_copies = new_total - outstanding;
        Ok(title.clone())
    }

    /// Recovery pass: recompute every available count from authoritative
    /// outstanding-loan counts. The ledger, not the stored counter, is
    /// trusted after a crash between a ledger commit and a count adjustment.
    pub fn reconcile(&self, outstanding_by_title: &HashMap<Uuid, u32>) {
        let mut titles = self.titles.write().expect("inventory lock poisoned");
        for title in titles.values_mut() {
            let outstanding = outstanding_by_title.get(&title.id).copied().unwrap_or(0);
            let recomputed = title.total_copies.saturating_sub(outstanding);
            if recomputed != title.available_copies {
                tracing::warn!(
                    title_id = %title.id,
                    stored = title.available_copies,
                    recomputed,
                    "reconciled stale available-copy count"
                );
                title.available_copies = recomputed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_title(copies: u32) -> CreateTitle {
        CreateTitle {
            isbn: "978-0-00-000000-0".to_string(),
            title: "The Test Book".to_string(),
            author: "A. Writer".to_string(),
            category: Some("fiction".to_string()),
            total_copies: copies,
        }
    }

    #[test]
    fn decrement_stops_at_zero() {
        let store = InventoryStore::new();
        let title = store.insert(sample_title(2));

        assert!(store.try_decrement(title.id).unwrap());
        assert!(store.try_decrement(title.id).unwrap());
        assert!(!store.try_decrement(title.id).unwrap());
        assert_eq!(store.get_available(title.id).unwrap(), 0);
    }

    #[test]
    fn increment_past_total_is_an_invariant_violation() {
        let store = InventoryStore::new();
        let title = store.insert(sample_title(1));

        assert!(matches!(
            store.increment(title.id),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn copy_edit_reconciles_against_outstanding() {
        let store = InventoryStore::new();
        let title = store.insert(sample_title(3));
        store.try_decrement(title.id).unwrap();
        store.try_decrement(title.id).unwrap();

        // 2 outstanding; growing to 5 leaves 3 available
        let updated = store.set_total_copies(title.id, 5, 2).unwrap();
        assert_eq!(updated.total_copies, 5);
        assert_eq!(updated.available_copies, 3);

        // shrinking below outstanding is rejected
        assert!(matches!(
            store.set_total_copies(title.id, 1, 2),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn reconcile_recomputes_from_ledger_counts() {
        let store = InventoryStore::new();
        let title = store.insert(sample_title(4));
        // counter drifted: says 4 available but two loans are outstanding
        let mut outstanding = HashMap::new();
        outstanding.insert(title.id, 2);

        store.reconcile(&outstanding);
        assert_eq!(store.get_available(title.id).unwrap(), 2);
    }

    #[test]
    fn list_filters_by_category_and_search() {
        let store = InventoryStore::new();
        store.insert(sample_title(1));
        store.insert(CreateTitle {
            isbn: "978-0-00-000001-7".to_string(),
            title: "Systems at Scale".to_string(),
            author: "B. Builder".to_string(),
            category: Some("tech".to_string()),
            total_copies: 1,
        });

        let query = TitleQuery {
            category: Some("tech".to_string()),
            search: None,
        };
        assert_eq!(store.list(&query).len(), 1);

        let query = TitleQuery {
            category: None,
            search: Some("writer".to_string()),
        };
        assert_eq!(store.list(&query).len(), 1);
    }
}
