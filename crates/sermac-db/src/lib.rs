//! # sermac-db: Database Layer for SERMAC Admin
//!
//! Every SQL statement of the back office lives here. SQLite through sqlx,
//! async all the way down.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SERMAC Admin Data Flow                            │
//! │                                                                         │
//! │  sermac-admin (CLI / services)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sermac-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  UnitOfWork  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ Cliente       │    │ begin        │  │   │
//! │  │   │ SqlitePool    │◄───│ Producto      │◄───│ commit       │  │   │
//! │  │   │ Schema        │    │ Venta         │    │ rollback     │  │   │
//! │  │   │ bootstrap     │    │ Inventario    │    │ save_changes │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   AdminSERMAC.db  (Clientes, Productos, Ventas, Inventario,     │   │
//! │  │                    Abonos, Proveedores, Vendedores)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection strings, pool creation, repository factories
//! - [`schema`] - Table bootstrap
//! - [`error`] - Storage and repository error types
//! - [`repository`] - Repository implementations
//! - [`unit_of_work`] - Transactions spanning several repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sermac_db::Database;
//!
//! let db = Database::connect("Data Source=AdminSERMAC.db;Version=3;").await?;
//!
//! let deudores = db.clientes().get_clientes_con_deuda().await?;
//!
//! let uow = db.unit_of_work();
//! uow.begin().await?;
//! uow.productos().actualizar_stock("P-1", 10, 25.0).await?;
//! uow.save_changes().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pool;
pub mod repository;
pub mod schema;
mod session;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, RepositoryError, RepositoryResult};
pub use pool::{Database, DbConfig};
pub use repository::Repository;
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::cliente::ClienteRepository;
pub use repository::compra::CompraRepository;
pub use repository::inventario::InventarioRepository;
pub use repository::producto::ProductoRepository;
pub use repository::venta::VentaRepository;
