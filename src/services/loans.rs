//! Loan management service: borrow, reserve, return.

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::LoanConfig,
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, LoanDetails, LoanStatus, UpdateLoan},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoanConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoanConfig) -> Self {
        Self { repository, config }
    }

    /// List loans visible to the caller: staff see everything, members only
    /// their own.
    pub async fn list_loans(
        &self,
        claims: &UserClaims,
        active_only: bool,
    ) -> AppResult<Vec<LoanDetails>> {
        let scope = if claims.is_staff {
            None
        } else {
            Some(claims.user_id)
        };
        self.repository.loans.list(scope, active_only).await
    }

    /// Get a single loan, owner or staff only
    pub async fn get_loan(&self, claims: &UserClaims, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        if !claims.can_access_loan(loan.borrower_id) {
            return Err(AppError::Authorization(
                "You can only view your own loans".to_string(),
            ));
        }
        self.repository.loans.get_details(loan_id).await
    }

    /// Borrow a book. The borrower defaults to the caller; staff may lend on
    /// behalf of another user.
    pub async fn create_loan(
        &self,
        claims: &UserClaims,
        request: CreateLoan,
    ) -> AppResult<LoanDetails> {
        let borrower_id = match request.borrower_id {
            Some(other) if other != claims.user_id => {
                claims.require_staff()?;
                self.repository.users.get_by_id(other).await?.id
            }
            _ => claims.user_id,
        };

        check_due_date_in_future(request.return_due_date, Utc::now())?;

        let loan = self
            .repository
            .loans
            .create(
                request.book_id,
                borrower_id,
                request.return_due_date,
                LoanStatus::Borrowed,
            )
            .await?;
        self.repository.loans.get_details(loan.id).await
    }

    /// Reserve a book for the caller. A reservation holds a copy for a short
    /// configured window (one day by default).
    pub async fn reserve_book(&self, claims: &UserClaims, book_id: i32) -> AppResult<LoanDetails> {
        let due = Utc::now() + Duration::days(self.config.reservation_days);
        let loan = self
            .repository
            .loans
            .create(book_id, claims.user_id, due, LoanStatus::Reserved)
            .await?;
        self.repository.loans.get_details(loan.id).await
    }

    /// Return a borrowed or reserved book
    pub async fn return_loan(&self, claims: &UserClaims, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        if !claims.can_access_loan(loan.borrower_id) {
            return Err(AppError::Authorization(
                "You can only return your own loans".to_string(),
            ));
        }
        self.repository.loans.close(loan_id).await
    }

    /// Move the due date of an open loan
    pub async fn update_loan(
        &self,
        claims: &UserClaims,
        loan_id: i32,
        request: UpdateLoan,
    ) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        if !claims.can_access_loan(loan.borrower_id) {
            return Err(AppError::Authorization(
                "You can only modify your own loans".to_string(),
            ));
        }
        if loan.return_date.is_some() {
            return Err(AppError::AlreadyReturned(format!(
                "Loan {} has already been returned",
                loan_id
            )));
        }
        if request.return_due_date <= loan.loan_date {
            return Err(AppError::Validation(
                "return_due_date: Due date must be after the loan date".to_string(),
            ));
        }
        self.repository
            .loans
            .update_due_date(loan_id, request.return_due_date)
            .await?;
        self.repository.loans.get_details(loan_id).await
    }

    /// Delete a loan record (staff only)
    pub async fn delete_loan(&self, claims: &UserClaims, loan_id: i32) -> AppResult<()> {
        claims.require_staff()?;
        self.repository.loans.delete(loan_id).await
    }
}

/// Loans cannot start already overdue
fn check_due_date_in_future(due: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    if due <= now {
        return Err(AppError::Validation(
            "return_due_date: Return date must be in the future".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_must_be_in_the_future() {
        let now = Utc::now();
        assert!(check_due_date_in_future(now + Duration::days(14), now).is_ok());
        assert!(check_due_date_in_future(now - Duration::seconds(1), now).is_err());
        assert!(check_due_date_in_future(now, now).is_err());
    }
}
