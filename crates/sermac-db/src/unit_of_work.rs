//! # Unit of Work
//!
//! Groups calls on several repositories into one transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let uow = db.unit_of_work();                                          │
//! │                                                                         │
//! │  uow.begin()        ──► BEGIN, stored in the shared slot               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  uow.productos().actualizar_stock(..)   ┐  all run on the slot's       │
//! │  uow.inventario().registrar_movimiento() ├─ transaction; reads see      │
//! │  uow.compras().incrementar_numero_compra┘  the pending writes          │
//! │       │                                                                 │
//! │       ├── uow.commit() / uow.save_changes() ──► COMMIT                 │
//! │       └── uow.rollback() / drop(uow)        ──► ROLLBACK               │
//! │                                                                         │
//! │  Without begin(), every repository call runs in its own scope.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed call inside an open transaction does not roll it back by
//! itself; the owner of the unit of work decides.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, RepositoryError, RepositoryResult};
use crate::repository::cliente::ClienteRepository;
use crate::repository::compra::CompraRepository;
use crate::repository::inventario::InventarioRepository;
use crate::repository::producto::ProductoRepository;
use crate::repository::venta::VentaRepository;
use crate::session::{Session, SharedTransaction};

/// Repositories sharing one optional transaction.
#[derive(Debug)]
pub struct UnitOfWork {
    pool: SqlitePool,
    shared: Arc<SharedTransaction>,
    clientes: ClienteRepository,
    productos: ProductoRepository,
    ventas: VentaRepository,
    inventario: InventarioRepository,
    compras: CompraRepository,
}

impl UnitOfWork {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        let shared = Arc::new(SharedTransaction::default());
        let session = Session::shared(pool.clone(), Arc::clone(&shared));

        UnitOfWork {
            clientes: ClienteRepository::new(session.clone()),
            productos: ProductoRepository::new(session.clone()),
            ventas: VentaRepository::new(session.clone()),
            inventario: InventarioRepository::new(session.clone()),
            compras: CompraRepository::new(session),
            pool,
            shared,
        }
    }

    pub fn clientes(&self) -> &ClienteRepository {
        &self.clientes
    }

    pub fn productos(&self) -> &ProductoRepository {
        &self.productos
    }

    pub fn ventas(&self) -> &VentaRepository {
        &self.ventas
    }

    pub fn inventario(&self) -> &InventarioRepository {
        &self.inventario
    }

    pub fn compras(&self) -> &CompraRepository {
        &self.compras
    }

    /// Opens the shared transaction.
    ///
    /// ## Errors
    /// - `TransactionAlreadyActive` if `begin` was already called
    /// - `Storage` if no connection could be obtained
    pub async fn begin(&self) -> RepositoryResult<()> {
        let mut slot = self.shared.slot.lock().await;
        if slot.is_some() {
            warn!("begin called with a transaction already active");
            return Err(RepositoryError::TransactionAlreadyActive);
        }

        let tx = self.pool.begin().await.map_err(|e| storage("begin", e.into()))?;
        *slot = Some(tx);
        self.shared.writes.store(0, Ordering::Relaxed);
        debug!("Transaction started");
        Ok(())
    }

    /// Commits the shared transaction.
    pub async fn commit(&self) -> RepositoryResult<()> {
        self.commit_counted().await.map(|_| ())
    }

    /// Rolls back the shared transaction.
    pub async fn rollback(&self) -> RepositoryResult<()> {
        let tx = self
            .shared
            .slot
            .lock()
            .await
            .take()
            .ok_or(RepositoryError::NoActiveTransaction)?;

        let discarded = self.shared.writes.swap(0, Ordering::Relaxed);
        tx.rollback()
            .await
            .map_err(|e| storage("roll back", e.into()))?;
        info!(discarded, "Transaction rolled back");
        Ok(())
    }

    /// True between `begin` and `commit`/`rollback`.
    pub async fn has_active_transaction(&self) -> bool {
        self.shared.slot.lock().await.is_some()
    }

    /// Commits the shared transaction and returns how many write calls it
    /// carried. With no transaction open there is nothing pending, so this
    /// returns 0.
    pub async fn save_changes(&self) -> RepositoryResult<u64> {
        match self.commit_counted().await {
            Err(RepositoryError::NoActiveTransaction) => Ok(0),
            other => other,
        }
    }

    async fn commit_counted(&self) -> RepositoryResult<u64> {
        let tx = self
            .shared
            .slot
            .lock()
            .await
            .take()
            .ok_or(RepositoryError::NoActiveTransaction)?;

        let writes = self.shared.writes.swap(0, Ordering::Relaxed);
        tx.commit().await.map_err(|e| storage("commit", e.into()))?;
        info!(writes, "Transaction committed");
        Ok(writes)
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // An unfinished transaction rolls back when the sqlx handle drops.
        if let Ok(mut slot) = self.shared.slot.try_lock() {
            if slot.take().is_some() {
                warn!("Unit of work dropped with an active transaction; rolling back");
            }
        }
    }
}

fn storage(operation: &'static str, source: DbError) -> RepositoryError {
    tracing::error!(operation, error = ?source, "Transaction control failed");
    RepositoryError::Storage {
        entity: "UnitOfWork",
        message: format!("Failed to {} transaction", operation),
        source,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{cliente, db, producto};
    use crate::repository::Repository;
    use sermac_core::Money;

    #[tokio::test]
    async fn test_commit_and_rollback_without_begin_fail() {
        let db = db().await;
        let uow = db.unit_of_work();

        assert!(!uow.has_active_transaction().await);
        assert!(matches!(
            uow.commit().await,
            Err(RepositoryError::NoActiveTransaction)
        ));
        assert!(matches!(
            uow.rollback().await,
            Err(RepositoryError::NoActiveTransaction)
        ));
        assert_eq!(uow.save_changes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_double_begin_fails() {
        let db = db().await;
        let uow = db.unit_of_work();

        uow.begin().await.unwrap();
        assert!(matches!(
            uow.begin().await,
            Err(RepositoryError::TransactionAlreadyActive)
        ));
        assert!(uow.has_active_transaction().await);
        uow.rollback().await.unwrap();
        assert!(!uow.has_active_transaction().await);
    }

    #[tokio::test]
    async fn test_rolled_back_writes_vanish() {
        let db = db().await;
        let uow = db.unit_of_work();

        uow.begin().await.unwrap();
        uow.clientes().add(&cliente("1-9", 0)).await.unwrap();
        uow.productos().add(&producto("P-1", 5, 5.0)).await.unwrap();

        // visible inside the transaction
        assert!(uow.clientes().get_by_key("1-9").await.is_ok());

        uow.rollback().await.unwrap();

        assert!(db.clientes().get_all().await.unwrap().is_empty());
        assert!(db.productos().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_changes_commits_and_counts_writes() {
        let db = db().await;
        let uow = db.unit_of_work();

        uow.begin().await.unwrap();
        uow.clientes().add(&cliente("1-9", 0)).await.unwrap();
        uow.clientes()
            .actualizar_deuda("1-9", Money::from_pesos(700))
            .await
            .unwrap();
        uow.compras().incrementar_numero_compra().await.unwrap();
        // reads are not counted
        uow.clientes().get_all().await.unwrap();

        assert_eq!(uow.save_changes().await.unwrap(), 3);
        assert!(!uow.has_active_transaction().await);

        assert_eq!(
            db.clientes().get_by_key("1-9").await.unwrap().deuda,
            Money::from_pesos(700)
        );
        assert_eq!(db.compras().ultimo_numero_compra().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_without_begin_each_call_commits() {
        let db = db().await;
        let uow = db.unit_of_work();

        uow.clientes().add(&cliente("1-9", 0)).await.unwrap();

        assert!(!uow.has_active_transaction().await);
        assert_eq!(db.clientes().get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_call_inside_transaction_keeps_it_open() {
        let db = db().await;
        let uow = db.unit_of_work();

        uow.begin().await.unwrap();
        uow.clientes().add(&cliente("1-9", 0)).await.unwrap();
        let err = uow.clientes().delete("2-7").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(uow.has_active_transaction().await);

        uow.commit().await.unwrap();
        assert_eq!(db.clientes().get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = db().await;
        {
            let uow = db.unit_of_work();
            uow.begin().await.unwrap();
            uow.clientes().add(&cliente("1-9", 0)).await.unwrap();
        }

        assert!(db.clientes().get_all().await.unwrap().is_empty());
    }
}
