//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
}

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    #[serde(default)]
    pub biography: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
}

/// Update author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
}

/// Author query parameters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AuthorQuery {
    /// Substring match on first or last name
    pub name: Option<String>,
}

/// Check that a death date does not precede the birth date.
/// Both dates are optional; the ordering only applies when both are set.
pub fn dates_ordered(birth_date: Option<NaiveDate>, death_date: Option<NaiveDate>) -> bool {
    match (birth_date, death_date) {
        (Some(birth), Some(death)) => death >= birth,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn death_before_birth_is_rejected() {
        assert!(!dates_ordered(Some(date(1950, 6, 1)), Some(date(1949, 1, 1))));
    }

    #[test]
    fn death_after_birth_is_accepted() {
        assert!(dates_ordered(Some(date(1920, 1, 2)), Some(date(1999, 12, 31))));
        assert!(dates_ordered(Some(date(1920, 1, 2)), Some(date(1920, 1, 2))));
    }

    #[test]
    fn missing_dates_are_accepted() {
        assert!(dates_ordered(None, None));
        assert!(dates_ordered(Some(date(1920, 1, 2)), None));
        assert!(dates_ordered(None, Some(date(1999, 1, 2))));
    }
}
