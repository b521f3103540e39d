//! Business logic services

pub mod batch;
pub mod catalog;
pub mod loans;
pub mod stats;
pub mod users;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub loans: loans::LoansService,
    pub batch: batch::BatchService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), config.pagination.clone()),
            users: users::UsersService::new(repository.clone(), config.pagination.clone()),
            loans: loans::LoansService::new(
                repository.clone(),
                config.pagination.clone(),
                config.loans.clone(),
            ),
            batch: batch::BatchService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
