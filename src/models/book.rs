//! Book (catalogue entry) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::author::Author;
use super::category::Category;

static ISBN13_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{13}$").unwrap());

/// Full book model (DB + API). Authors and category are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub category_id: Option<i32>,
    pub summary: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub publication_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub authors: Vec<Author>,
    #[sqlx(skip)]
    #[serde(default)]
    pub category: Option<Category>,
}

impl Book {
    /// A book is available when at least one copy is not out on loan
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Create book request. `available_copies` is never accepted from clients;
/// it starts at `total_copies` and moves only through loan transitions.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(custom(function = validate_isbn13))]
    pub isbn: String,
    #[serde(default)]
    pub author_ids: Vec<i32>,
    pub category_id: Option<i32>,
    #[serde(default)]
    pub summary: String,
    #[validate(range(min = 0, message = "Total copies cannot be negative"))]
    #[serde(default = "default_total_copies")]
    pub total_copies: i32,
    pub publication_date: Option<NaiveDate>,
}

fn default_total_copies() -> i32 {
    1
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(custom(function = validate_isbn13))]
    pub isbn: Option<String>,
    pub author_ids: Option<Vec<i32>>,
    pub category_id: Option<i32>,
    pub summary: Option<String>,
    #[validate(range(min = 0, message = "Total copies cannot be negative"))]
    pub total_copies: Option<i32>,
    pub publication_date: Option<NaiveDate>,
}

/// Book query parameters (API)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Free-text match over title, ISBN and author names
    pub query: Option<String>,
    /// Category ID filter
    pub category: Option<i32>,
    /// Only books with at least one available copy
    pub available_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// ISBN must be exactly 13 digits
pub fn validate_isbn13(isbn: &str) -> Result<(), ValidationError> {
    if ISBN13_RE.is_match(isbn) {
        Ok(())
    } else {
        let mut err = ValidationError::new("isbn");
        err.message = Some("ISBN must be a 13-digit number".into());
        Err(err)
    }
}

/// Check that a publication date is not in the future
pub fn publication_date_valid(publication_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    publication_date.map(|d| d <= today).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_must_be_13_digits() {
        assert!(validate_isbn13("9782070612758").is_ok());
        assert!(validate_isbn13("978207061275").is_err()); // 12 digits
        assert!(validate_isbn13("97820706127580").is_err()); // 14 digits
        assert!(validate_isbn13("978-20706-1275").is_err()); // separators
        assert!(validate_isbn13("").is_err());
    }

    #[test]
    fn publication_date_cannot_be_in_the_future() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert!(publication_date_valid(None, today));
        assert!(publication_date_valid(Some(today), today));
        assert!(publication_date_valid(
            NaiveDate::from_ymd_opt(1954, 6, 1),
            today
        ));
        assert!(!publication_date_valid(
            NaiveDate::from_ymd_opt(2027, 1, 1),
            today
        ));
    }

    #[test]
    fn availability_follows_copy_count() {
        let book = Book {
            id: 1,
            title: "Le Petit Prince".to_string(),
            isbn: "9782070612758".to_string(),
            category_id: None,
            summary: String::new(),
            total_copies: 3,
            available_copies: 0,
            publication_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            authors: Vec::new(),
            category: None,
        };
        assert!(!book.is_available());
        assert!(Book { available_copies: 1, ..book }.is_available());
    }
}
