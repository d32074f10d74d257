//! Loans repository for database operations.
//!
//! Loan transitions and the book availability counter are always written in
//! the same transaction: a loan row never exists without its decrement, and a
//! return never lands without its increment. The counter updates are guarded
//! so `available_copies` stays within `[0, total_copies]` even under
//! concurrent requests for the last copy.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanDetails, LoanStatus},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// List loans with book and borrower details.
    /// `borrower_id` scopes the result to a single user; `active_only`
    /// restricts it to loans that have not been returned.
    pub async fn list(
        &self,
        borrower_id: Option<i32>,
        active_only: bool,
    ) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.book_id, l.borrower_id, l.loan_date,
                   l.return_due_date, l.return_date, l.status,
                   b.title AS book_title, b.isbn AS book_isbn,
                   u.username AS borrower_username
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.borrower_id
            WHERE ($1::int IS NULL OR l.borrower_id = $1)
              AND (NOT $2 OR l.return_date IS NULL)
            ORDER BY l.loan_date DESC
            "#,
        )
        .bind(borrower_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        let loans = rows.into_iter().map(|row| details_from_row(&row, now)).collect();
        Ok(loans)
    }

    /// Get loan details by ID
    pub async fn get_details(&self, id: i32) -> AppResult<LoanDetails> {
        let row = sqlx::query(
            r#"
            SELECT l.id, l.book_id, l.borrower_id, l.loan_date,
                   l.return_due_date, l.return_date, l.status,
                   b.title AS book_title, b.isbn AS book_isbn,
                   u.username AS borrower_username
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.borrower_id
            WHERE l.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        Ok(details_from_row(&row, Utc::now()))
    }

    /// Create a loan and decrement the book's available copies atomically.
    /// Fails when the book does not exist or has no copies left.
    pub async fn create(
        &self,
        book_id: i32,
        borrower_id: i32,
        return_due_date: DateTime<Utc>,
        status: LoanStatus,
    ) -> AppResult<Loan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let decremented = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if decremented == 0 {
            // Either the book is gone or every copy is out
            let title: Option<String> =
                sqlx::query_scalar("SELECT title FROM books WHERE id = $1")
                    .bind(book_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return match title {
                Some(title) => Err(AppError::NotAvailable(format!(
                    "Book \"{}\" is not available",
                    title
                ))),
                None => Err(AppError::NotFound(format!(
                    "Book with id {} not found",
                    book_id
                ))),
            };
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, borrower_id, loan_date, return_due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(borrower_id)
        .bind(now)
        .bind(return_due_date)
        .bind(status.as_code())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Close a loan and increment the book's available copies atomically.
    /// Closing is guarded on `return_date IS NULL`, so a second return of the
    /// same loan fails instead of incrementing the counter again.
    pub async fn close(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.return_date.is_some() || loan.status() == LoanStatus::Completed {
            return Err(AppError::AlreadyReturned(format!(
                "Loan {} has already been returned",
                loan_id
            )));
        }

        sqlx::query(
            "UPDATE loans SET return_date = $2, status = $3 WHERE id = $1 AND return_date IS NULL",
        )
        .bind(loan_id)
        .bind(now)
        .bind(LoanStatus::Completed.as_code())
        .execute(&mut *tx)
        .await?;

        // The guard keeps available_copies from ever exceeding total_copies
        sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = $2
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(loan.book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_details(loan_id).await
    }

    /// Move the due date of an open loan
    pub async fn update_due_date(
        &self,
        loan_id: i32,
        return_due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET return_due_date = $2 WHERE id = $1 RETURNING *",
        )
        .bind(loan_id)
        .bind(return_due_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;
        Ok(updated)
    }

    /// Delete a loan. Deleting an open loan releases its copy, so the
    /// availability counter stays consistent with the remaining loan rows.
    pub async fn delete(&self, loan_id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        if loan.return_date.is_none() {
            sqlx::query(
                r#"
                UPDATE books
                SET available_copies = available_copies + 1, updated_at = $2
                WHERE id = $1 AND available_copies < total_copies
                "#,
            )
            .bind(loan.book_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn details_from_row(row: &sqlx::postgres::PgRow, now: DateTime<Utc>) -> LoanDetails {
    let return_due_date: DateTime<Utc> = row.get("return_due_date");
    let return_date: Option<DateTime<Utc>> = row.get("return_date");
    let status: String = row.get("status");

    LoanDetails {
        id: row.get("id"),
        book_id: row.get("book_id"),
        book_title: row.get("book_title"),
        book_isbn: row.get("book_isbn"),
        borrower_id: row.get("borrower_id"),
        borrower_username: row.get("borrower_username"),
        loan_date: row.get("loan_date"),
        return_due_date,
        return_date,
        status: LoanStatus::from(status.as_str()),
        is_overdue: return_date.is_none() && now > return_due_date,
    }
}
