//! Overdue sweeper: periodic derivation of the `OVERDUE` status
//!
//! Reads the ledger and flips outstanding loans whose due time has passed.
//! Never touches inventory; returning a book, not expiring it, is what frees
//! a copy. Updates go through the CAS contract so a concurrent return or
//! renewal always wins over the sweeper.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::{
    error::AppError,
    models::loan::{LoanStatus, LoanUpdate},
    repository::ledger::LoanLedger,
};

pub struct OverdueSweeper {
    ledger: Arc<LoanLedger>,
    interval: Duration,
}

impl OverdueSweeper {
    pub fn new(ledger: Arc<LoanLedger>, interval: Duration) -> Self {
        Self { ledger, interval }
    }

    /// Run the sweep loop forever. Spawned as a background task at startup.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let flipped = self.sweep_once();
            if flipped > 0 {
                tracing::info!(flipped, "overdue sweep completed");
            }
        }
    }

    /// One sweep pass. Returns how many loans were flipped to `OVERDUE`.
    /// One bad row never halts the sweep.
    pub fn sweep_once(&self) -> usize {
        let now = Utc::now();
        let mut flipped = 0;
        for loan in self.ledger.list_outstanding() {
            if loan.status == LoanStatus::Overdue || loan.due_time >= now {
                continue;
            }
            match self
                .ledger
                .update_status(loan.id, loan.status, LoanUpdate::overdue())
            {
                Ok(_) => flipped += 1,
                // a return or renewal raced ahead of us; their update stands
                Err(AppError::Conflict(_)) | Err(AppError::AlreadyReturned(_)) => {
                    tracing::debug!(trans_id = loan.id, "sweeper lost the race, skipping");
                }
                Err(err) => {
                    tracing::warn!(trans_id = loan.id, error = %err, "sweep failed for loan");
                }
            }
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::NewLoan;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    fn sweeper_with_ledger() -> (OverdueSweeper, Arc<LoanLedger>) {
        let ledger = Arc::new(LoanLedger::new());
        let sweeper = OverdueSweeper::new(Arc::clone(&ledger), Duration::from_secs(60));
        (sweeper, ledger)
    }

    fn append_loan(ledger: &LoanLedger, due_in_days: i64) -> u64 {
        let now = Utc::now();
        ledger
            .append(
                NewLoan {
                    title_id: Uuid::new_v4(),
                    user_id: Uuid::new_v4(),
                    borrow_time: now - ChronoDuration::days(30),
                    due_time: now + ChronoDuration::days(due_in_days),
                },
                10,
            )
            .unwrap()
            .id
    }

    #[test]
    fn flips_only_loans_past_their_due_time() {
        let (sweeper, ledger) = sweeper_with_ledger();
        let late = append_loan(&ledger, -2);
        let on_time = append_loan(&ledger, 7);

        assert_eq!(sweeper.sweep_once(), 1);
        assert_eq!(ledger.get(late).unwrap().status, LoanStatus::Overdue);
        assert_eq!(ledger.get(on_time).unwrap().status, LoanStatus::Borrowed);
    }

    #[test]
    fn sweeping_is_idempotent() {
        let (sweeper, ledger) = sweeper_with_ledger();
        let late = append_loan(&ledger, -2);

        assert_eq!(sweeper.sweep_once(), 1);
        assert_eq!(sweeper.sweep_once(), 0);
        assert_eq!(ledger.get(late).unwrap().status, LoanStatus::Overdue);
    }

    #[test]
    fn returned_loans_stay_returned() {
        let (sweeper, ledger) = sweeper_with_ledger();
        let late = append_loan(&ledger, -2);
        ledger
            .update_status(late, LoanStatus::Borrowed, LoanUpdate::returned(Utc::now()))
            .unwrap();

        assert_eq!(sweeper.sweep_once(), 0);
        assert_eq!(ledger.get(late).unwrap().status, LoanStatus::Returned);
    }

    #[test]
    fn renewed_overdue_loans_are_flipped_too() {
        let (sweeper, ledger) = sweeper_with_ledger();
        let late = append_loan(&ledger, -10);
        ledger
            .update_status(
                late,
                LoanStatus::Borrowed,
                LoanUpdate::renewed(Utc::now() - ChronoDuration::days(1), 1),
            )
            .unwrap();

        assert_eq!(sweeper.sweep_once(), 1);
        let loan = ledger.get(late).unwrap();
        assert_eq!(loan.status, LoanStatus::Overdue);
        // the renewal counter survives the flip
        assert_eq!(loan.renew_count, 1);
    }
}
