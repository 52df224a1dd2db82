//! Loan transaction model and projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Loan lifecycle status.
///
/// `Returned` is the only terminal state. `Overdue` is derived from the due
/// time by the sweeper and never causes inventory changes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Borrowed,
    Renewed,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Returned)
    }

    /// Outstanding loans hold a copy of the title.
    pub fn is_outstanding(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoanStatus::Borrowed => "BORROWED",
            LoanStatus::Renewed => "RENEWED",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Overdue => "OVERDUE",
        };
        write!(f, "{}", s)
    }
}

/// One borrow-to-return lifecycle instance. Rows are never deleted; the
/// ledger is the permanent record of circulation events.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanTransaction {
    /// Unique, monotonically increasing transaction id
    pub id: u64,
    pub title_id: Uuid,
    pub user_id: Uuid,
    pub borrow_time: DateTime<Utc>,
    pub due_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub renew_count: u32,
}

/// Fields of a new loan row; the ledger assigns the id.
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub title_id: Uuid,
    pub user_id: Uuid,
    pub borrow_time: DateTime<Utc>,
    pub due_time: DateTime<Utc>,
}

/// Compare-and-set update against a ledger row. The caller states the status
/// it observed; the update fails if the row moved on in the meantime.
#[derive(Debug, Clone, Copy)]
pub struct LoanUpdate {
    pub status: LoanStatus,
    pub due_time: Option<DateTime<Utc>>,
    pub return_time: Option<DateTime<Utc>>,
    pub renew_count: Option<u32>,
}

impl LoanUpdate {
    pub fn returned(at: DateTime<Utc>) -> Self {
        Self {
            status: LoanStatus::Returned,
            due_time: None,
            return_time: Some(at),
            renew_count: None,
        }
    }

    pub fn renewed(due_time: DateTime<Utc>, renew_count: u32) -> Self {
        Self {
            status: LoanStatus::Renewed,
            due_time: Some(due_time),
            return_time: None,
            renew_count: Some(renew_count),
        }
    }

    pub fn overdue() -> Self {
        Self {
            status: LoanStatus::Overdue,
            due_time: None,
            return_time: None,
            renew_count: None,
        }
    }
}

/// Current loan of the session user, joined with catalog metadata
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentLoanView {
    pub trans_id: u64,
    pub title_id: Uuid,
    pub book_title: String,
    pub book_author: String,
    pub borrow_time: DateTime<Utc>,
    pub due_time: DateTime<Utc>,
    pub status: LoanStatus,
    pub renew_count: u32,
}

/// One row of a title's borrow history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TitleHistoryView {
    pub trans_id: u64,
    pub user_id: Uuid,
    pub user_name: String,
    pub borrow_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

/// Admin-wide loan listing filters
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct LoanQuery {
    pub user_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
    pub status: Option<LoanStatus>,
    /// Only loans past their due time and not yet returned
    pub overdue: Option<bool>,
}
