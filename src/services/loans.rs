//! Loan management service

use crate::{
    config::{LoansConfig, PaginationConfig},
    error::{AppError, AppResult},
    models::loan::{Loan, LoanDetails, LoanQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    pagination: PaginationConfig,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, pagination: PaginationConfig, config: LoansConfig) -> Self {
        Self {
            repository,
            pagination,
            config,
        }
    }

    /// List loans with filters and pagination
    pub async fn list_loans(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let mut query = query.clone();
        query.page = Some(query.page.unwrap_or(1).max(1));
        query.per_page = Some(
            query
                .per_page
                .unwrap_or(self.pagination.default_page_size)
                .clamp(1, self.pagination.max_page_size),
        );

        self.repository.loans.search(&query).await
    }

    /// Borrow a book for a user. The borrow period falls back to the
    /// configured default when not given.
    pub async fn borrow(
        &self,
        book_id: i64,
        user_id: i64,
        period_days: Option<i64>,
    ) -> AppResult<Loan> {
        let period_days = period_days.unwrap_or(self.config.period_days);
        if period_days < 1 {
            return Err(AppError::Validation(
                "period_days must be at least 1".to_string(),
            ));
        }

        let loan = self.repository.loans.borrow(book_id, user_id, period_days).await?;
        tracing::info!(
            "User {} borrowed book {} (loan {}, due {})",
            user_id,
            book_id,
            loan.id,
            loan.due_date
        );
        Ok(loan)
    }

    /// Return the oldest active loan for a book and user
    pub async fn return_loan(&self, book_id: i64, user_id: i64) -> AppResult<Loan> {
        let loan = self.repository.loans.return_loan(book_id, user_id).await?;
        tracing::info!("User {} returned book {} (loan {})", user_id, book_id, loan.id);
        Ok(loan)
    }
}
