//! User management service

use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        loan::LoanDetails,
        user::{CreateUser, UpdateUser, User, UserQuery},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    pagination: PaginationConfig,
}

impl UsersService {
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    /// List users with filters and pagination
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let mut query = query.clone();
        query.page = Some(query.page.unwrap_or(1).max(1));
        query.per_page = Some(
            query
                .per_page
                .unwrap_or(self.pagination.default_page_size)
                .clamp(1, self.pagination.max_page_size),
        );

        self.repository.users.search(&query).await
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a new user
    pub async fn create_user(&self, mut user: CreateUser) -> AppResult<User> {
        user.name = user.name.trim().to_string();
        user.email = user.email.trim().to_string();
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.users.email_exists(&user.email, None).await? {
            return Err(AppError::Validation("Email already registered".to_string()));
        }

        let created = self.repository.users.create(&user).await?;
        tracing::info!("Created user {} <{}>", created.id, created.email);
        Ok(created)
    }

    /// Update an existing user
    pub async fn update_user(&self, id: i64, mut changes: UpdateUser) -> AppResult<User> {
        if let Some(ref name) = changes.name {
            changes.name = Some(name.trim().to_string());
        }
        if let Some(ref email) = changes.email {
            changes.email = Some(email.trim().to_string());
        }
        changes
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(ref email) = changes.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Validation("Email already registered".to_string()));
            }
        }

        self.repository.users.update(id, &changes).await
    }

    /// Delete a user. Refused while the user has active loans.
    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Full loan history for a user, newest first
    pub async fn get_user_loans(&self, id: i64) -> AppResult<Vec<LoanDetails>> {
        // 404 for unknown users rather than an empty list
        self.repository.users.get_by_id(id).await?;
        self.repository.loans.get_user_loans(id).await
    }
}
