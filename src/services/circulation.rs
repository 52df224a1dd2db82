//! Circulation service: borrow, return and renew as atomic operations
//!
//! The single writer for inventory counts and ledger rows. Each operation
//! either fully commits or fully rolls back; callers get typed errors and
//! decide about retries themselves. A lost CAS is retried once here before
//! `Conflict` is surfaced.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{
        loan::{LoanTransaction, LoanUpdate, NewLoan},
        user::{Role, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: CirculationConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a title for a user. On success the available-copy count has
    /// been decremented and a `BORROWED` ledger row exists.
    pub fn borrow(&self, user_id: Uuid, role: Role, title_id: Uuid) -> AppResult<LoanTransaction> {
        let policy = self.config.policy(role);

        // fast-path rejection; the authoritative check runs inside append,
        // atomically with the insert
        if self.repository.ledger.find_active(user_id, title_id).is_some() {
            return Err(AppError::AlreadyBorrowed(
                "You already have this title on loan".to_string(),
            ));
        }

        if !self.repository.inventory.try_decrement(title_id)? {
            return Err(AppError::NoCopiesAvailable(
                "No copies of this title are currently available".to_string(),
            ));
        }

        let now = Utc::now();
        let new = NewLoan {
            title_id,
            user_id,
            borrow_time: now,
            due_time: now + Duration::days(policy.loan_period_days),
        };

        // the copy is already taken; a failed append must give it back
        match self.repository.ledger.append(new, policy.max_loans) {
            Ok(loan) => {
                tracing::info!(trans_id = loan.id, %user_id, %title_id, "loan opened");
                Ok(loan)
            }
            Err(err) => {
                if let Err(rollback) = self.repository.inventory.increment(title_id) {
                    tracing::error!(%title_id, error = %rollback, "compensating increment failed");
                }
                Err(err)
            }
        }
    }

    /// Return a loan. The copy is freed only after the ledger row commits
    /// to `RETURNED`; a second return on the same row is rejected and never
    /// double-increments the count.
    pub fn return_loan(&self, trans_id: u64, actor: &UserClaims) -> AppResult<LoanTransaction> {
        for attempt in 0..2 {
            let loan = self.repository.ledger.get(trans_id)?;
            if loan.status.is_terminal() {
                return Err(AppError::AlreadyReturned(
                    "This loan has already been returned".to_string(),
                ));
            }
            self.check_ownership(&loan, actor)?;

            match self.repository.ledger.update_status(
                trans_id,
                loan.status,
                LoanUpdate::returned(Utc::now()),
            ) {
                Ok(updated) => {
                    self.repository.inventory.increment(updated.title_id)?;
                    tracing::info!(trans_id, title_id = %updated.title_id, "loan returned");
                    return Ok(updated);
                }
                Err(AppError::Conflict(_)) if attempt == 0 => continue,
                Err(err) => return Err(err),
            }
        }
        Err(AppError::Conflict(format!(
            "Loan {} kept changing concurrently, please retry",
            trans_id
        )))
    }

    /// Renew a loan: the due time strictly increases, the renewal counter
    /// goes up by one and inventory is untouched. The renewal policy is the
    /// loan owner's, not the actor's.
    pub fn renew(&self, trans_id: u64, actor: &UserClaims) -> AppResult<LoanTransaction> {
        for attempt in 0..2 {
            let loan = self.repository.ledger.get(trans_id)?;
            if loan.status.is_terminal() {
                return Err(AppError::AlreadyReturned(
                    "Cannot renew a returned loan".to_string(),
                ));
            }
            self.check_ownership(&loan, actor)?;

            let owner = self.repository.users.get(loan.user_id)?;
            let policy = self.config.policy(owner.role);
            if loan.renew_count >= policy.max_renewals {
                return Err(AppError::RenewalLimitExceeded(format!(
                    "Renewal limit reached ({}/{})",
                    loan.renew_count, policy.max_renewals
                )));
            }

            let now = Utc::now();
            let new_due = loan.due_time.max(now) + Duration::days(policy.renewal_period_days);
            match self.repository.ledger.update_status(
                trans_id,
                loan.status,
                LoanUpdate::renewed(new_due, loan.renew_count + 1),
            ) {
                Ok(updated) => {
                    tracing::info!(trans_id, due_time = %updated.due_time, "loan renewed");
                    return Ok(updated);
                }
                Err(AppError::Conflict(_)) if attempt == 0 => continue,
                Err(err) => return Err(err),
            }
        }
        Err(AppError::Conflict(format!(
            "Loan {} kept changing concurrently, please retry",
            trans_id
        )))
    }

    /// Recovery pass: recompute every available-copy count from the ledger.
    /// Run at startup, before the service takes traffic.
    pub fn reconcile_inventory(&self) {
        let outstanding = self.repository.ledger.outstanding_by_title();
        self.repository.inventory.reconcile(&outstanding);
    }

    fn check_ownership(&self, loan: &LoanTransaction, actor: &UserClaims) -> AppResult<()> {
        if loan.user_id == actor.sub || actor.role.is_administrative() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "This loan belongs to another member".to_string(),
            ))
        }
    }
}
