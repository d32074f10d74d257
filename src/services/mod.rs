//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;

use crate::{
    config::{AuthConfig, LoanConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    repository: Repository,
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, loan_config: LoanConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), loan_config),
            repository,
        }
    }

    /// Check that the database behind the services is reachable
    pub async fn ping_database(&self) -> Result<(), sqlx::Error> {
        self.repository.ping().await
    }
}
