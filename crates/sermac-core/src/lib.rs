//! # sermac-core: Domain Types for SERMAC Admin
//!
//! Entities, peso arithmetic and required-field rules for the SERMAC back
//! office. Nothing in here touches the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SERMAC Admin Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                apps/admin (services + report CLI)               │   │
//! │  │   ClienteService • InventarioService • NotificationService      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                sermac-db (repositories, unit of work)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sermac-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   money   │  │ validation│                  │   │
//! │  │   │  Cliente  │  │   Money   │  │  required │                  │   │
//! │  │   │  Venta... │  │  (pesos)  │  │  fields   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Cliente, Producto, Venta, Inventario, Abono, receipts
//! - [`money`] - Whole-peso `Money`
//! - [`error`] - Domain error types
//! - [`validation`] - Required-field checks
//!
//! With the `sqlx` feature, the entities derive `sqlx::FromRow` and `Money`
//! maps to an INTEGER column.

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Units below which a product counts as low on stock, unless configured.
pub const DEFAULT_STOCK_MINIMO: i64 = 10;

/// Days ahead that count as "about to expire", unless configured.
pub const DEFAULT_DIAS_VENCIMIENTO: i64 = 7;
