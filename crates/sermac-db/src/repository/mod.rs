//! # Repository Module
//!
//! Database repository implementations for SERMAC Admin.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Contract                                  │
//! │                                                                         │
//! │  get_all()          every row, store order                             │
//! │  get_by_key(key)    the row, or RepositoryError::NotFound              │
//! │  add(entity)        one local transaction, rolled back on failure      │
//! │  update(entity)     same; zero rows affected → NotFound                │
//! │  delete(key)        same; zero rows affected → NotFound                │
//! │                                                                         │
//! │  Every value is bound as a parameter. Every call logs:                 │
//! │    info!  on success                                                   │
//! │    warn!  on not found                                                 │
//! │    error! on storage failure                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside an active [`UnitOfWork`](crate::UnitOfWork) transaction the same
//! calls run on the shared transaction instead, and nothing commits until
//! the unit of work does.
//!
//! ## Available Repositories
//!
//! - [`ClienteRepository`](cliente::ClienteRepository) - Clients, debt, payments
//! - [`ProductoRepository`](producto::ProductoRepository) - Products and stock
//! - [`VentaRepository`](venta::VentaRepository) - Sale lines and totals
//! - [`InventarioRepository`](inventario::InventarioRepository) - Stock movements
//! - [`CompraRepository`](compra::CompraRepository) - Purchase lookups

use std::future::Future;

use crate::error::RepositoryResult;

pub mod cliente;
pub mod compra;
pub mod inventario;
pub mod producto;
pub mod venta;

#[cfg(test)]
pub(crate) mod fixtures;

/// CRUD contract shared by the entity repositories.
///
/// Implementors write these as `async fn`; the futures are `Send` so they
/// can run on the multi-threaded runtime.
pub trait Repository {
    /// The row type.
    type Entity;

    /// The business key (`str` for RUT / product code, a struct for
    /// composite keys).
    type Key: ?Sized;

    fn get_all(&self) -> impl Future<Output = RepositoryResult<Vec<Self::Entity>>> + Send;

    fn get_by_key(
        &self,
        key: &Self::Key,
    ) -> impl Future<Output = RepositoryResult<Self::Entity>> + Send;

    fn add(&self, entity: &Self::Entity) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn update(&self, entity: &Self::Entity) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn delete(&self, key: &Self::Key) -> impl Future<Output = RepositoryResult<()>> + Send;
}
