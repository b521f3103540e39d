//! Book (catalog entry) model and related types.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Normalized ISBN-10 (9 digits plus a digit or X) or ISBN-13 (13 digits)
static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").expect("invalid ISBN pattern"));

/// Strip separators and upper-case the ISBN-10 check digit.
///
/// Stored and compared in this form so that `978-0-13-468599-1` and
/// `9780134685991` resolve to the same book.
pub fn normalize_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect::<String>()
        .to_uppercase()
}

/// Whether `raw` is a well-formed ISBN-10 or ISBN-13 after normalization
pub fn is_valid_isbn(raw: &str) -> bool {
    ISBN_PATTERN.is_match(&normalize_isbn(raw))
}

/// Full book model (DB + API)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// ISBN in normalized form, unique when present
    pub isbn: Option<String>,
    pub published_date: Option<NaiveDate>,
    /// Number of copies the library owns
    pub copies_total: i64,
    /// Copies currently on the shelf; bounded by `copies_total`
    pub copies_available: i64,
    pub created_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    /// ISBN-10 or ISBN-13, separators allowed (optional)
    pub isbn: Option<String>,
    pub published_date: Option<NaiveDate>,
    /// Number of copies (default: 1); new books start fully available
    #[validate(range(min = 0, message = "copies_total must not be negative"))]
    #[serde(default = "default_copies_total")]
    pub copies_total: i64,
}

fn default_copies_total() -> i64 {
    1
}

/// Update book request. All fields optional; only provided fields change.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_date: Option<NaiveDate>,
    /// Changing the total shifts `copies_available` by the same amount,
    /// floored at zero
    #[validate(range(min = 0, message = "copies_total must not be negative"))]
    pub copies_total: Option<i64>,
}

/// Search and pagination parameters for book listings
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Free-text search over title and author
    pub q: Option<String>,
    /// Title substring filter
    pub title: Option<String>,
    /// Author substring filter
    pub author: Option<String>,
    /// Exact ISBN match (separators allowed)
    pub isbn: Option<String>,
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 20)
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_isbn("978-0-13-468599-1"), "9780134685991");
        assert_eq!(normalize_isbn("0 306 40615 x"), "030640615X");
    }

    #[test]
    fn accepts_isbn10_and_isbn13() {
        assert!(is_valid_isbn("9780134685991"));
        assert!(is_valid_isbn("978-0-13-468599-1"));
        assert!(is_valid_isbn("030640615X"));
        assert!(is_valid_isbn("0-306-40615-x"));
    }

    #[test]
    fn rejects_malformed_isbn() {
        assert!(!is_valid_isbn(""));
        assert!(!is_valid_isbn("not-an-isbn"));
        assert!(!is_valid_isbn("12345"));
        assert!(!is_valid_isbn("97801346859911"));
        assert!(!is_valid_isbn("X780134685991"));
    }
}
