//! Read-only circulation projections for UI collaborators
//!
//! Thin joins over the ledger, the catalog and the member directory. Never
//! mutates anything.

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{CurrentLoanView, LoanQuery, LoanTransaction, TitleHistoryView},
    repository::Repository,
};

#[derive(Clone)]
pub struct QueryService {
    repository: Repository,
}

impl QueryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Current (non-terminal) loans of a user, with catalog metadata.
    pub fn current_loans(&self, user_id: Uuid) -> AppResult<Vec<CurrentLoanView>> {
        let loans = self.repository.ledger.list_by_user(user_id, false);
        let mut views = Vec::with_capacity(loans.len());
        for loan in loans {
            let title = self.repository.inventory.get(loan.title_id)?;
            views.push(CurrentLoanView {
                trans_id: loan.id,
                title_id: loan.title_id,
                book_title: title.title,
                book_author: title.author,
                borrow_time: loan.borrow_time,
                due_time: loan.due_time,
                status: loan.status,
                renew_count: loan.renew_count,
            });
        }
        Ok(views)
    }

    /// Full borrow history of a title, returned rows included.
    pub fn title_history(&self, title_id: Uuid) -> AppResult<Vec<TitleHistoryView>> {
        // surface NotFound for unknown titles rather than an empty list
        self.repository.inventory.get(title_id)?;
        let views = self
            .repository
            .ledger
            .list_by_title(title_id)
            .into_iter()
            .map(|loan| TitleHistoryView {
                trans_id: loan.id,
                user_id: loan.user_id,
                user_name: self
                    .repository
                    .users
                    .name_of(loan.user_id)
                    .unwrap_or_else(|| "unknown".to_string()),
                borrow_time: loan.borrow_time,
                return_time: loan.return_time,
                status: loan.status,
            })
            .collect();
        Ok(views)
    }

    /// Admin-wide loan listing with filters.
    pub fn list_loans(&self, query: &LoanQuery) -> Vec<LoanTransaction> {
        self.repository.ledger.list_filtered(query)
    }
}
