//! Loans repository for database operations

use chrono::{Duration, Utc};
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanDetails, LoanQuery},
};

const LOAN_COLUMNS: &str = "id, book_id, user_id, borrowed_at, due_date, returned_at";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        let query = format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS);

        sqlx::query_as::<_, Loan>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Borrow a book for a user.
    ///
    /// Runs in one transaction: the availability decrement is guarded by
    /// `copies_available > 0`, so two concurrent borrows of the last copy
    /// cannot both succeed.
    pub async fn borrow(&self, book_id: i64, user_id: i64, period_days: i64) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let book_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }

        let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if !user_exists {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                user_id
            )));
        }

        let decremented = sqlx::query(
            "UPDATE books SET copies_available = copies_available - 1 WHERE id = ? AND copies_available > 0",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(AppError::NotAvailable("No copies available".to_string()));
        }

        let now = Utc::now();
        let due_date = (now + Duration::days(period_days)).date_naive();

        let inserted = sqlx::query(
            "INSERT INTO loans (book_id, user_id, borrowed_at, due_date) VALUES (?, ?, ?, ?)",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .bind(due_date)
        .execute(&mut *tx)
        .await?;

        let select = format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS);
        let loan = sqlx::query_as::<_, Loan>(&select)
            .bind(inserted.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Return the oldest active loan for a book and user.
    ///
    /// The loan row is kept as history with `returned_at` set, and the book
    /// gets one copy back, capped at copies_total.
    pub async fn return_loan(&self, book_id: i64, user_id: i64) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan_id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM loans
            WHERE book_id = ? AND user_id = ? AND returned_at IS NULL
            ORDER BY borrowed_at, id
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let loan_id = loan_id.ok_or_else(|| {
            AppError::NotFound("No active loan for this book and user".to_string())
        })?;

        sqlx::query("UPDATE loans SET returned_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE books SET copies_available = MIN(copies_total, copies_available + 1) WHERE id = ?",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        let select = format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS);
        let loan = sqlx::query_as::<_, Loan>(&select)
            .bind(loan_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Search loans with pagination, newest first.
    ///
    /// Books and users may have been deleted since the loan was taken, so
    /// display fields fall back to empty strings.
    pub async fn search(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).max(1);
        let offset = (page - 1) * per_page;

        let mut conditions: Vec<String> = Vec::new();

        if let Some(active) = query.active {
            if active {
                conditions.push("l.returned_at IS NULL".to_string());
            } else {
                conditions.push("l.returned_at IS NOT NULL".to_string());
            }
        }

        if let Some(user_id) = query.user_id {
            conditions.push(format!("l.user_id = {}", user_id));
        }

        if let Some(book_id) = query.book_id {
            conditions.push(format!("l.book_id = {}", book_id));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM loans l {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_query).fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT l.id, l.book_id, l.user_id,
                   COALESCE(b.title, '') as book_title,
                   COALESCE(b.author, '') as book_author,
                   COALESCE(u.name, '') as user_name,
                   l.borrowed_at, l.due_date, l.returned_at
            FROM loans l
            LEFT JOIN books b ON b.id = l.book_id
            LEFT JOIN users u ON u.id = l.user_id
            {}
            ORDER BY l.borrowed_at DESC, l.id DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut loans = sqlx::query_as::<_, LoanDetails>(&select_query)
            .fetch_all(&self.pool)
            .await?;

        let today = Utc::now().date_naive();
        for loan in &mut loans {
            loan.is_overdue = loan.returned_at.is_none() && loan.due_date < today;
        }

        Ok((loans, total))
    }

    /// Get all loans for a user, newest first
    pub async fn get_user_loans(&self, user_id: i64) -> AppResult<Vec<LoanDetails>> {
        let mut loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.book_id, l.user_id,
                   COALESCE(b.title, '') as book_title,
                   COALESCE(b.author, '') as book_author,
                   COALESCE(u.name, '') as user_name,
                   l.borrowed_at, l.due_date, l.returned_at
            FROM loans l
            LEFT JOIN books b ON b.id = l.book_id
            LEFT JOIN users u ON u.id = l.user_id
            WHERE l.user_id = ?
            ORDER BY l.borrowed_at DESC, l.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        for loan in &mut loans {
            loan.is_overdue = loan.returned_at.is_none() && loan.due_date < today;
        }

        Ok(loans)
    }
}
