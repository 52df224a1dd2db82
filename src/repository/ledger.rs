//! Loan ledger: the append-mostly record of circulation events
//!
//! One row per borrow event, never deleted. Status transitions go through a
//! compare-and-set update so racing writers (return vs renew vs sweeper)
//! cannot lose each other's updates. The open-loan checks (duplicate loan,
//! per-user cap) run under the same write lock as the insert, so two
//! concurrent borrows by the same user cannot both pass them.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use snowflaked::sync::Generator;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::loan::{LoanQuery, LoanStatus, LoanTransaction, LoanUpdate, NewLoan},
};

pub struct LoanLedger {
    // BTreeMap keeps listings in transaction-id (and therefore borrow) order
    loans: RwLock<BTreeMap<u64, LoanTransaction>>,
    ids: Generator,
}

impl Default for LoanLedger {
    fn default() -> Self {
        Self {
            loans: RwLock::new(BTreeMap::new()),
            ids: Generator::new(0),
        }
    }
}

impl LoanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new loan. The duplicate-loan and per-user-cap checks are
    /// atomic with the insert.
    pub fn append(&self, new: NewLoan, max_loans: u32) -> AppResult<LoanTransaction> {
        if new.due_time < new.borrow_time {
            return Err(AppError::Internal(
                "due time precedes borrow time".to_string(),
            ));
        }

        let mut loans = self.loans.write().expect("ledger lock poisoned");

        let duplicate = loans
            .values()
            .any(|l| l.user_id == new.user_id && l.title_id == new.title_id && l.status.is_outstanding());
        if duplicate {
            return Err(AppError::AlreadyBorrowed(
                "You already have this title on loan".to_string(),
            ));
        }

        let outstanding = loans
            .values()
            .filter(|l| l.user_id == new.user_id && l.status.is_outstanding())
            .count() as u32;
        if outstanding >= max_loans {
            return Err(AppError::LoanLimitExceeded(format!(
                "Loan limit reached ({}/{})",
                outstanding, max_loans
            )));
        }

        let loan = LoanTransaction {
            id: self.ids.generate(),
            title_id: new.title_id,
            user_id: new.user_id,
            borrow_time: new.borrow_time,
            due_time: new.due_time,
            return_time: None,
            status: LoanStatus::Borrowed,
            renew_count: 0,
        };
        loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    pub fn get(&self, trans_id: u64) -> AppResult<LoanTransaction> {
        let loans = self.loans.read().expect("ledger lock poisoned");
        loans
            .get(&trans_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", trans_id)))
    }

    /// Compare-and-set status update. Fails with `AlreadyReturned` on a
    /// terminal row and with `Conflict` when the row no longer carries the
    /// status the caller observed, preventing lost updates under races.
    pub fn update_status(
        &self,
        trans_id: u64,
        expected: LoanStatus,
        update: LoanUpdate,
    ) -> AppResult<LoanTransaction> {
        let mut loans = self.loans.write().expect("ledger lock poisoned");
        let loan = loans
            .get_mut(&trans_id)
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", trans_id)))?;

        if loan.status.is_terminal() {
            return Err(AppError::AlreadyReturned(
                "This loan has already been returned".to_string(),
            ));
        }
        if loan.status != expected {
            return Err(AppError::Conflict(format!(
                "Loan {} changed concurrently (expected {}, found {})",
                trans_id, expected, loan.status
            )));
        }

        loan.status = update.status;
        if let Some(due_time) = update.due_time {
            loan.due_time = due_time;
        }
        // return_time, once set, is immutable; the terminal check above
        // guarantees we only get here while it is still None
        if let Some(return_time) = update.return_time {
            loan.return_time = Some(return_time);
        }
        if let Some(renew_count) = update.renew_count {
            loan.renew_count = renew_count;
        }
        Ok(loan.clone())
    }

    /// The non-terminal loan of a (user, title) pair, if any. The append
    /// path guarantees there is at most one.
    pub fn find_active(&self, user_id: Uuid, title_id: Uuid) -> Option<LoanTransaction> {
        let loans = self.loans.read().expect("ledger lock poisoned");
        loans
            .values()
            .find(|l| l.user_id == user_id && l.title_id == title_id && l.status.is_outstanding())
            .cloned()
    }

    /// All non-terminal loans, for the sweeper.
    pub fn list_outstanding(&self) -> Vec<LoanTransaction> {
        let loans = self.loans.read().expect("ledger lock poisoned");
        loans
            .values()
            .filter(|l| l.status.is_outstanding())
            .cloned()
            .collect()
    }

    /// Outstanding-loan counts per title, the authoritative input for
    /// inventory recovery.
    pub fn outstanding_by_title(&self) -> HashMap<Uuid, u32> {
        let loans = self.loans.read().expect("ledger lock poisoned");
        let mut counts: HashMap<Uuid, u32> = HashMap::new();
        for loan in loans.values().filter(|l| l.status.is_outstanding()) {
            *counts.entry(loan.title_id).or_default() += 1;
        }
        counts
    }

    pub fn list_by_user(&self, user_id: Uuid, include_returned: bool) -> Vec<LoanTransaction> {
        let loans = self.loans.read().expect("ledger lock poisoned");
        loans
            .values()
            .filter(|l| l.user_id == user_id && (include_returned || l.status.is_outstanding()))
            .cloned()
            .collect()
    }

    pub fn list_by_title(&self, title_id: Uuid) -> Vec<LoanTransaction> {
        let loans = self.loans.read().expect("ledger lock poisoned");
        loans
            .values()
            .filter(|l| l.title_id == title_id)
            .cloned()
            .collect()
    }

    /// Admin-wide listing with optional filters.
    pub fn list_filtered(&self, query: &LoanQuery) -> Vec<LoanTransaction> {
        let now = chrono::Utc::now();
        let loans = self.loans.read().expect("ledger lock poisoned");
        loans
            .values()
            .filter(|l| query.user_id.map(|u| l.user_id == u).unwrap_or(true))
            .filter(|l| query.title_id.map(|t| l.title_id == t).unwrap_or(true))
            .filter(|l| query.status.map(|s| l.status == s).unwrap_or(true))
            .filter(|l| {
                if query.overdue.unwrap_or(false) {
                    l.status.is_outstanding() && l.due_time < now
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn new_loan(user_id: Uuid, title_id: Uuid) -> NewLoan {
        let now = Utc::now();
        NewLoan {
            title_id,
            user_id,
            borrow_time: now,
            due_time: now + Duration::days(14),
        }
    }

    #[test]
    fn transaction_ids_are_monotonic() {
        let ledger = LoanLedger::new();
        let user = Uuid::new_v4();
        let a = ledger.append(new_loan(user, Uuid::new_v4()), 10).unwrap();
        let b = ledger.append(new_loan(user, Uuid::new_v4()), 10).unwrap();
        let c = ledger.append(new_loan(user, Uuid::new_v4()), 10).unwrap();
        assert!(a.id < b.id && b.id < c.id);
    }

    #[test]
    fn duplicate_outstanding_loan_is_rejected() {
        let ledger = LoanLedger::new();
        let user = Uuid::new_v4();
        let title = Uuid::new_v4();

        ledger.append(new_loan(user, title), 10).unwrap();
        assert!(matches!(
            ledger.append(new_loan(user, title), 10),
            Err(AppError::AlreadyBorrowed(_))
        ));

        // a different user may still borrow the same title
        ledger.append(new_loan(Uuid::new_v4(), title), 10).unwrap();
    }

    #[test]
    fn per_user_cap_counts_only_outstanding_loans() {
        let ledger = LoanLedger::new();
        let user = Uuid::new_v4();

        let first = ledger.append(new_loan(user, Uuid::new_v4()), 2).unwrap();
        ledger.append(new_loan(user, Uuid::new_v4()), 2).unwrap();
        assert!(matches!(
            ledger.append(new_loan(user, Uuid::new_v4()), 2),
            Err(AppError::LoanLimitExceeded(_))
        ));

        // returning one frees a slot
        ledger
            .update_status(first.id, LoanStatus::Borrowed, LoanUpdate::returned(Utc::now()))
            .unwrap();
        ledger.append(new_loan(user, Uuid::new_v4()), 2).unwrap();
    }

    #[test]
    fn cas_rejects_stale_expected_status() {
        let ledger = LoanLedger::new();
        let loan = ledger
            .append(new_loan(Uuid::new_v4(), Uuid::new_v4()), 5)
            .unwrap();

        let now = Utc::now();
        ledger
            .update_status(
                loan.id,
                LoanStatus::Borrowed,
                LoanUpdate::renewed(now + Duration::days(7), 1),
            )
            .unwrap();

        // a writer that still thinks the loan is Borrowed loses
        assert!(matches!(
            ledger.update_status(loan.id, LoanStatus::Borrowed, LoanUpdate::overdue()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn terminal_rows_reject_every_update() {
        let ledger = LoanLedger::new();
        let loan = ledger
            .append(new_loan(Uuid::new_v4(), Uuid::new_v4()), 5)
            .unwrap();

        let returned = ledger
            .update_status(loan.id, LoanStatus::Borrowed, LoanUpdate::returned(Utc::now()))
            .unwrap();
        let first_return_time = returned.return_time;

        for update in [
            LoanUpdate::returned(Utc::now() + Duration::hours(1)),
            LoanUpdate::overdue(),
            LoanUpdate::renewed(Utc::now() + Duration::days(7), 1),
        ] {
            assert!(matches!(
                ledger.update_status(loan.id, LoanStatus::Returned, update),
                Err(AppError::AlreadyReturned(_))
            ));
        }

        // return_time never moved
        assert_eq!(ledger.get(loan.id).unwrap().return_time, first_return_time);
    }

    #[test]
    fn outstanding_counts_group_by_title() {
        let ledger = LoanLedger::new();
        let title = Uuid::new_v4();
        ledger.append(new_loan(Uuid::new_v4(), title), 5).unwrap();
        ledger.append(new_loan(Uuid::new_v4(), title), 5).unwrap();
        let other = ledger
            .append(new_loan(Uuid::new_v4(), Uuid::new_v4()), 5)
            .unwrap();
        ledger
            .update_status(other.id, LoanStatus::Borrowed, LoanUpdate::returned(Utc::now()))
            .unwrap();

        let counts = ledger.outstanding_by_title();
        assert_eq!(counts.get(&title), Some(&2));
        assert_eq!(counts.get(&other.title_id), None);
    }

    #[test]
    fn filtered_listing_supports_overdue() {
        let ledger = LoanLedger::new();
        let now = Utc::now();
        let late = ledger
            .append(
                NewLoan {
                    title_id: Uuid::new_v4(),
                    user_id: Uuid::new_v4(),
                    borrow_time: now - Duration::days(30),
                    due_time: now - Duration::days(2),
                },
                5,
            )
            .unwrap();
        ledger
            .append(new_loan(Uuid::new_v4(), Uuid::new_v4()), 5)
            .unwrap();

        let query = LoanQuery {
            overdue: Some(true),
            ..Default::default()
        };
        let listed = ledger.list_filtered(&query);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, late.id);
    }
}
