//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Loan model from database.
///
/// A loan with no `returned_at` is active. Loans are never deleted;
/// returning sets `returned_at` and the row stays as history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Loan with book and user details for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub book_title: String,
    pub book_author: String,
    pub user_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub returned_at: Option<DateTime<Utc>>,
    /// Active and past its due date
    #[sqlx(skip)]
    pub is_overdue: bool,
}

/// Filter and pagination parameters for loan listings
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    /// Only active (true) or only returned (false) loans
    pub active: Option<bool>,
    /// Filter by borrower
    pub user_id: Option<i64>,
    /// Filter by book
    pub book_id: Option<i64>,
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 20)
    pub per_page: Option<i64>,
}
