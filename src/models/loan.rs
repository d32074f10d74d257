//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Loan status codes. Stored in the database as a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    Borrowed,
    Reserved,
    Available,
    Overdue,
    Completed,
}

impl LoanStatus {
    /// Return the single-character code for this status
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "B",
            LoanStatus::Reserved => "R",
            LoanStatus::Available => "A",
            LoanStatus::Overdue => "O",
            LoanStatus::Completed => "C",
        }
    }
}

impl From<&str> for LoanStatus {
    fn from(s: &str) -> Self {
        match s {
            "R" => LoanStatus::Reserved,
            "A" => LoanStatus::Available,
            "O" => LoanStatus::Overdue,
            "C" => LoanStatus::Completed,
            _ => LoanStatus::Borrowed,
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub loan_date: DateTime<Utc>,
    pub return_due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from(self.status.as_str())
    }

    /// A loan is overdue when it is still open past its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.return_date.is_none() && now > self.return_due_date
    }
}

/// Loan with book and borrower details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_isbn: String,
    pub borrower_id: i32,
    pub borrower_username: String,
    pub loan_date: DateTime<Utc>,
    pub return_due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

/// Create loan request. `borrower_id` is honored for staff callers only;
/// everyone else borrows for themselves.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    pub book_id: i32,
    pub return_due_date: DateTime<Utc>,
    pub borrower_id: Option<i32>,
}

/// Update loan request (due date only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLoan {
    pub return_due_date: DateTime<Utc>,
}

/// Loan query parameters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LoanQuery {
    /// Only loans that have not been returned yet
    pub active_only: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_loan(due: DateTime<Utc>) -> Loan {
        Loan {
            id: 1,
            book_id: 1,
            borrower_id: 1,
            loan_date: due - Duration::days(14),
            return_due_date: due,
            return_date: None,
            status: "B".to_string(),
        }
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            LoanStatus::Borrowed,
            LoanStatus::Reserved,
            LoanStatus::Available,
            LoanStatus::Overdue,
            LoanStatus::Completed,
        ] {
            assert_eq!(LoanStatus::from(status.as_code()), status);
        }
    }

    #[test]
    fn unknown_status_defaults_to_borrowed() {
        assert_eq!(LoanStatus::from("X"), LoanStatus::Borrowed);
        assert_eq!(LoanStatus::from(""), LoanStatus::Borrowed);
    }

    #[test]
    fn open_loan_past_due_is_overdue() {
        let now = Utc::now();
        assert!(open_loan(now - Duration::hours(1)).is_overdue(now));
        assert!(!open_loan(now + Duration::hours(1)).is_overdue(now));
    }

    #[test]
    fn closed_loan_is_never_overdue() {
        let now = Utc::now();
        let mut loan = open_loan(now - Duration::days(3));
        loan.return_date = Some(now - Duration::days(1));
        loan.status = "C".to_string();
        assert!(!loan.is_overdue(now));
        assert_eq!(loan.status(), LoanStatus::Completed);
    }
}
