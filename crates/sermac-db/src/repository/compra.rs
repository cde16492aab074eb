//! # Compra Repository
//!
//! Lookups used while entering a purchase: suppliers, sellers, the running
//! purchase number, and product names by code.

use tracing::info;

use crate::error::{translate, DbError, DbResult, RepositoryResult};
use crate::session::Session;

const ENTITY: &str = "Compra";

/// Repository for purchase lookup tables.
#[derive(Debug, Clone)]
pub struct CompraRepository {
    session: Session,
}

impl CompraRepository {
    pub(crate) fn new(session: Session) -> Self {
        CompraRepository { session }
    }

    /// Supplier names, alphabetical.
    pub async fn proveedores(&self) -> RepositoryResult<Vec<String>> {
        let nombres = self
            .nombres("SELECT Nombre FROM Proveedores ORDER BY Nombre")
            .await
            .map_err(|e| translate("Proveedor", "list", &"*", e))?;
        info!(count = nombres.len(), "Fetched proveedores");
        Ok(nombres)
    }

    /// Seller names, alphabetical.
    pub async fn vendedores(&self) -> RepositoryResult<Vec<String>> {
        let nombres = self
            .nombres("SELECT Nombre FROM Vendedores ORDER BY Nombre")
            .await
            .map_err(|e| translate("Vendedor", "list", &"*", e))?;
        info!(count = nombres.len(), "Fetched vendedores");
        Ok(nombres)
    }

    /// Registers a supplier. Already known names are left alone.
    pub async fn agregar_proveedor(&self, nombre: &str) -> RepositoryResult<()> {
        self.insertar_nombre("INSERT OR IGNORE INTO Proveedores (Nombre) VALUES (?1)", nombre)
            .await
            .map_err(|e| translate("Proveedor", "add", &nombre, e))?;
        info!(nombre = %nombre, "Added proveedor");
        Ok(())
    }

    /// Registers a seller. Already known names are left alone.
    pub async fn agregar_vendedor(&self, nombre: &str) -> RepositoryResult<()> {
        self.insertar_nombre("INSERT OR IGNORE INTO Vendedores (Nombre) VALUES (?1)", nombre)
            .await
            .map_err(|e| translate("Vendedor", "add", &nombre, e))?;
        info!(nombre = %nombre, "Added vendedor");
        Ok(())
    }

    /// The last purchase number handed out (0 before the first).
    pub async fn ultimo_numero_compra(&self) -> RepositoryResult<i64> {
        let result: DbResult<i64> = async {
            let mut scope = self.session.read().await?;
            let ultimo = sqlx::query_scalar::<_, i64>(
                "SELECT COALESCE((SELECT Ultimo FROM NumeroCompra WHERE Id = 1), 0)",
            )
            .fetch_one(scope.conn())
            .await?;
            Ok(ultimo)
        }
        .await;

        let ultimo = result.map_err(|e| translate(ENTITY, "read last number", &"NumeroCompra", e))?;
        info!(ultimo, "Fetched ultimo numero de compra");
        Ok(ultimo)
    }

    /// Hands out the next purchase number.
    pub async fn incrementar_numero_compra(&self) -> RepositoryResult<i64> {
        let result: DbResult<i64> = async {
            let mut scope = self.session.write().await?;
            let outcome: DbResult<i64> = async {
                sqlx::query(
                    "INSERT INTO NumeroCompra (Id, Ultimo) VALUES (1, 1) \
                     ON CONFLICT (Id) DO UPDATE SET Ultimo = Ultimo + 1",
                )
                .execute(scope.conn())
                .await?;
                let siguiente =
                    sqlx::query_scalar::<_, i64>("SELECT Ultimo FROM NumeroCompra WHERE Id = 1")
                        .fetch_one(scope.conn())
                        .await?;
                Ok(siguiente)
            }
            .await;
            scope.finish(outcome).await
        }
        .await;

        let numero = result.map_err(|e| translate(ENTITY, "increment", &"NumeroCompra", e))?;
        info!(numero, "Issued numero de compra");
        Ok(numero)
    }

    /// The name of the product with `codigo`.
    pub async fn nombre_producto(&self, codigo: &str) -> RepositoryResult<String> {
        let result: DbResult<String> = async {
            let mut scope = self.session.read().await?;
            sqlx::query_scalar::<_, String>("SELECT Nombre FROM Productos WHERE Codigo = ?1")
                .bind(codigo)
                .fetch_optional(scope.conn())
                .await?
                .ok_or_else(|| DbError::not_found("Producto", codigo))
        }
        .await;

        let nombre = result.map_err(|e| translate("Producto", "look up name of", &codigo, e))?;
        info!(codigo = %codigo, nombre = %nombre, "Resolved nombre de producto");
        Ok(nombre)
    }

    async fn nombres(&self, sql: &'static str) -> DbResult<Vec<String>> {
        let mut scope = self.session.read().await?;
        let nombres = sqlx::query_scalar::<_, String>(sql)
            .fetch_all(scope.conn())
            .await?;
        Ok(nombres)
    }

    async fn insertar_nombre(&self, sql: &'static str, nombre: &str) -> DbResult<()> {
        let mut scope = self.session.write().await?;
        let outcome = sqlx::query(sql)
            .bind(nombre.trim())
            .execute(scope.conn())
            .await
            .map(|_| ())
            .map_err(DbError::from);
        scope.finish(outcome).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{db, producto};
    use crate::repository::Repository;

    #[tokio::test]
    async fn test_proveedores_and_vendedores() {
        let db = db().await;
        let repo = db.compras();

        repo.agregar_proveedor("Super Pollo").await.unwrap();
        repo.agregar_proveedor("Ariztía").await.unwrap();
        repo.agregar_proveedor("Ariztía").await.unwrap();
        repo.agregar_vendedor("Pedro").await.unwrap();

        assert_eq!(repo.proveedores().await.unwrap(), ["Ariztía", "Super Pollo"]);
        assert_eq!(repo.vendedores().await.unwrap(), ["Pedro"]);
    }

    #[tokio::test]
    async fn test_numero_compra_sequence() {
        let db = db().await;
        let repo = db.compras();

        assert_eq!(repo.ultimo_numero_compra().await.unwrap(), 0);
        assert_eq!(repo.incrementar_numero_compra().await.unwrap(), 1);
        assert_eq!(repo.incrementar_numero_compra().await.unwrap(), 2);
        assert_eq!(repo.ultimo_numero_compra().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_nombre_producto() {
        let db = db().await;
        db.productos().add(&producto("P-1", 0, 0.0)).await.unwrap();

        let repo = db.compras();
        assert_eq!(repo.nombre_producto("P-1").await.unwrap(), "Producto P-1");
        assert!(repo.nombre_producto("NOPE").await.unwrap_err().is_not_found());
    }
}
