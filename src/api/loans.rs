//! Loan circulation endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanDetails, LoanQuery},
};

use super::books::PaginatedResponse;

/// Request to borrow a book
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Book to borrow
    pub book_id: i64,
    /// Borrowing user
    pub user_id: i64,
    /// Loan period in days (default from configuration)
    pub period_days: Option<i64>,
}

/// Request to return a borrowed book
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Book being returned
    pub book_id: i64,
    /// User returning it
    pub user_id: i64,
}

/// List loans with filters and pagination
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(
        ("active" = Option<bool>, Query, description = "true for open loans only, false for returned only"),
        ("user_id" = Option<i64>, Query, description = "Filter by user"),
        ("book_id" = Option<i64>, Query, description = "Filter by book"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "Page of loans", body = PaginatedResponse<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    let (items, total) = state.services.loans.list_loans(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1).max(1),
        per_page: query
            .per_page
            .unwrap_or(state.config.pagination.default_page_size)
            .clamp(1, state.config.pagination.max_page_size),
    }))
}

/// Borrow a book for a user
#[utoipa::path(
    post,
    path = "/loans/borrow",
    tag = "loans",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "No copies available")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state
        .services
        .loans
        .borrow(request.book_id, request.user_id, request.period_days)
        .await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/return",
    tag = "loans",
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Loan closed", body = Loan),
        (status = 404, description = "No active loan for this book and user")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .loans
        .return_loan(request.book_id, request.user_id)
        .await?;
    Ok(Json(loan))
}
