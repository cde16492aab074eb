//! # Error Types
//!
//! Domain-specific error types for sermac-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sermac-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Required-field and range failures              │
//! │                                                                         │
//! │  sermac-db errors (separate crate)                                     │
//! │  ├── DbError          - Classified sqlx failures                       │
//! │  └── RepositoryError  - What callers of a repository see               │
//! │                                                                         │
//! │  apps/admin errors                                                     │
//! │  └── AppError         - Config, repository and I/O failures            │
//! │                                                                         │
//! │  Flow: ValidationError → RepositoryError → AppError → anyhow (main)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock to dispatch a sale line.
    ///
    /// ## When This Occurs
    /// ```text
    /// Guía de despacho: 12 bandejas de "P-001"
    ///      │
    ///      ▼
    /// Producto.unidades = 8
    ///      │
    ///      ▼
    /// InsufficientStock { codigo: "P-001", disponible: 8, solicitado: 12 }
    /// ```
    #[error("Stock insuficiente para {codigo}: disponible {disponible}, solicitado {solicitado}")]
    InsufficientStock {
        codigo: String,
        disponible: i64,
        solicitado: i64,
    },

    /// A receipt was submitted without any line carrying a product code.
    #[error("La recepción no tiene líneas con código de producto")]
    EmptyReceipt,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any statement reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long for its column.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. RUT without check digit).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date range whose start is after its end.
    #[error("{field}: start date is after end date")]
    InvertedRange { field: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
