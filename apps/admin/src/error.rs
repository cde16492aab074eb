//! # Application Error Type
//!
//! What the services and the shell can fail with.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in SERMAC Admin                           │
//! │                                                                         │
//! │  ValidationError ──┐                                                   │
//! │                    ├──► RepositoryError ──┐                             │
//! │  DbError ──────────┘    (translate)       │                             │
//! │                                           ├──► AppError ──► anyhow     │
//! │  CoreError ───────────────────────────────┤     (services)   (main)    │
//! │  ConfigError ─────────────────────────────┤                             │
//! │  io::Error ───────────────────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation failures raised by a service travel as
//! `RepositoryError::Validation`, the same variant a repository caller
//! would see.

use sermac_core::{CoreError, ValidationError};
use sermac_db::{DbError, RepositoryError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Repository(RepositoryError::Validation(err))
    }
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Repository(err) if err.is_not_found())
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Repository(RepositoryError::Validation(_))
                | AppError::Core(CoreError::Validation(_))
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_travels_as_repository_error() {
        let err: AppError = ValidationError::required("rut").into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "rut is required");
    }

    #[test]
    fn test_not_found() {
        let err: AppError = RepositoryError::NotFound {
            entity: "Cliente",
            key: "1-9".to_string(),
        }
        .into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Cliente not found: 1-9");
    }

    #[test]
    fn test_config_message() {
        let err: AppError = ConfigError::InvalidValue("stock_minimo".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value for stock_minimo"
        );
    }
}
