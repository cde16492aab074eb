//! # Producto Repository
//!
//! Products and their stock, counted twice: units (trays) and kilos.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Stock always moves by delta, never by absolute value:              │
//! │                                                                     │
//! │     UPDATE Productos SET Unidades = Unidades + ?2,                  │
//! │                          Kilos    = Kilos    + ?3                   │
//! │                                                                     │
//! │  A dispatch passes negative deltas, a receipt positive ones.        │
//! │  A receipt running in a unit of work sees its own earlier lines.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sermac_core::Producto;
use tracing::{debug, info};

use crate::error::{translate, DbError, DbResult, RepositoryResult};
use crate::repository::Repository;
use crate::session::Session;

const ENTITY: &str = "Producto";

macro_rules! select_productos {
    ($tail:literal) => {
        concat!(
            "SELECT Codigo AS codigo, Nombre AS nombre, Unidades AS unidades, Kilos AS kilos, ",
            "FechaMasAntigua AS fecha_mas_antigua, FechaMasNueva AS fecha_mas_nueva ",
            "FROM Productos ",
            $tail
        )
    };
}

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductoRepository {
    session: Session,
}

impl ProductoRepository {
    pub(crate) fn new(session: Session) -> Self {
        ProductoRepository { session }
    }

    /// Products with fewer than `stock_minimo` units, scarcest first.
    pub async fn get_productos_bajos_de_stock(
        &self,
        stock_minimo: i64,
    ) -> RepositoryResult<Vec<Producto>> {
        let result: DbResult<Vec<Producto>> = async {
            let mut scope = self.session.read().await?;
            let productos = sqlx::query_as::<_, Producto>(select_productos!(
                "WHERE Unidades < ?1 ORDER BY Unidades, Codigo"
            ))
            .bind(stock_minimo)
            .fetch_all(scope.conn())
            .await?;
            Ok(productos)
        }
        .await;

        let productos =
            result.map_err(|e| translate(ENTITY, "list low stock", &stock_minimo, e))?;
        info!(stock_minimo, count = productos.len(), "Fetched productos bajos de stock");
        Ok(productos)
    }

    /// Moves stock by the given deltas.
    pub async fn actualizar_stock(
        &self,
        codigo: &str,
        unidades: i64,
        kilos: f64,
    ) -> RepositoryResult<()> {
        debug!(codigo = %codigo, unidades, kilos, "Updating stock");

        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                "UPDATE Productos SET Unidades = Unidades + ?2, Kilos = Kilos + ?3 \
                 WHERE Codigo = ?1",
            )
            .bind(codigo)
            .bind(unidades)
            .bind(kilos)
            .execute(scope.conn())
            .await
            .map_err(DbError::from)
            .and_then(|r| match r.rows_affected() {
                0 => Err(DbError::not_found(ENTITY, codigo)),
                _ => Ok(()),
            });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "update stock of", &codigo, e))?;
        info!(codigo = %codigo, unidades, kilos, "Updated stock");
        Ok(())
    }

    /// True when the product has at least the given units and kilos.
    /// An unknown code has no stock.
    pub async fn validar_stock_disponible(
        &self,
        codigo: &str,
        unidades: i64,
        kilos: f64,
    ) -> RepositoryResult<bool> {
        let result: DbResult<i64> = async {
            let mut scope = self.session.read().await?;
            let disponibles = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM Productos \
                 WHERE Codigo = ?1 AND Unidades >= ?2 AND Kilos >= ?3",
            )
            .bind(codigo)
            .bind(unidades)
            .bind(kilos)
            .fetch_one(scope.conn())
            .await?;
            Ok(disponibles)
        }
        .await;

        let disponible = result.map_err(|e| translate(ENTITY, "check stock of", &codigo, e))? > 0;
        info!(codigo = %codigo, unidades, kilos, disponible, "Checked stock");
        Ok(disponible)
    }

    /// Adds a received lot to the product's stock.
    ///
    /// `FechaMasAntigua` only moves back to `fecha_compra`, and
    /// `FechaMasNueva` only moves forward to `fecha_lote`.
    pub async fn ingresar_lote(
        &self,
        codigo: &str,
        unidades: i64,
        kilos: f64,
        fecha_compra: NaiveDate,
        fecha_lote: NaiveDate,
    ) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                r#"
                UPDATE Productos SET
                    Unidades = Unidades + ?2,
                    Kilos = Kilos + ?3,
                    FechaMasAntigua = CASE
                        WHEN FechaMasAntigua IS NULL OR FechaMasAntigua > ?4 THEN ?4
                        ELSE FechaMasAntigua END,
                    FechaMasNueva = CASE
                        WHEN FechaMasNueva IS NULL OR FechaMasNueva < ?5 THEN ?5
                        ELSE FechaMasNueva END
                WHERE Codigo = ?1
                "#,
            )
            .bind(codigo)
            .bind(unidades)
            .bind(kilos)
            .bind(fecha_compra)
            .bind(fecha_lote)
            .execute(scope.conn())
            .await
            .map_err(DbError::from)
            .and_then(|r| match r.rows_affected() {
                0 => Err(DbError::not_found(ENTITY, codigo)),
                _ => Ok(()),
            });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "receive lot of", &codigo, e))?;
        info!(codigo = %codigo, unidades, kilos, "Received lot");
        Ok(())
    }
}

impl Repository for ProductoRepository {
    type Entity = Producto;
    type Key = str;

    async fn get_all(&self) -> RepositoryResult<Vec<Producto>> {
        let result: DbResult<Vec<Producto>> = async {
            let mut scope = self.session.read().await?;
            let productos = sqlx::query_as::<_, Producto>(select_productos!(""))
                .fetch_all(scope.conn())
                .await?;
            Ok(productos)
        }
        .await;

        let productos = result.map_err(|e| translate(ENTITY, "list", &"*", e))?;
        info!(count = productos.len(), "Fetched productos");
        Ok(productos)
    }

    async fn get_by_key(&self, codigo: &str) -> RepositoryResult<Producto> {
        let result: DbResult<Producto> = async {
            let mut scope = self.session.read().await?;
            sqlx::query_as::<_, Producto>(select_productos!("WHERE Codigo = ?1"))
                .bind(codigo)
                .fetch_optional(scope.conn())
                .await?
                .ok_or_else(|| DbError::not_found(ENTITY, codigo))
        }
        .await;

        let producto = result.map_err(|e| translate(ENTITY, "get", &codigo, e))?;
        info!(codigo = %codigo, "Found producto");
        Ok(producto)
    }

    async fn add(&self, producto: &Producto) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                "INSERT INTO Productos \
                 (Codigo, Nombre, Unidades, Kilos, FechaMasAntigua, FechaMasNueva) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&producto.codigo)
            .bind(&producto.nombre)
            .bind(producto.unidades)
            .bind(producto.kilos)
            .bind(producto.fecha_mas_antigua)
            .bind(producto.fecha_mas_nueva)
            .execute(scope.conn())
            .await
            .map(|_| ())
            .map_err(DbError::from);
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "add", &producto.codigo, e))?;
        info!(codigo = %producto.codigo, "Added producto");
        Ok(())
    }

    async fn update(&self, producto: &Producto) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                "UPDATE Productos SET Nombre = ?2, Unidades = ?3, Kilos = ?4, \
                 FechaMasAntigua = ?5, FechaMasNueva = ?6 WHERE Codigo = ?1",
            )
            .bind(&producto.codigo)
            .bind(&producto.nombre)
            .bind(producto.unidades)
            .bind(producto.kilos)
            .bind(producto.fecha_mas_antigua)
            .bind(producto.fecha_mas_nueva)
            .execute(scope.conn())
            .await
            .map_err(DbError::from)
            .and_then(|r| match r.rows_affected() {
                0 => Err(DbError::not_found(ENTITY, &producto.codigo)),
                _ => Ok(()),
            });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "update", &producto.codigo, e))?;
        info!(codigo = %producto.codigo, "Updated producto");
        Ok(())
    }

    async fn delete(&self, codigo: &str) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query("DELETE FROM Productos WHERE Codigo = ?1")
                .bind(codigo)
                .execute(scope.conn())
                .await
                .map_err(DbError::from)
                .and_then(|r| match r.rows_affected() {
                    0 => Err(DbError::not_found(ENTITY, codigo)),
                    _ => Ok(()),
                });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "delete", &codigo, e))?;
        info!(codigo = %codigo, "Deleted producto");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{db, fecha, producto};

    #[tokio::test]
    async fn test_crud() {
        let db = db().await;
        let repo = db.productos();
        let mut p = producto("P-1", 10, 25.5);
        p.fecha_mas_antigua = Some(fecha(2024, 1, 2));

        repo.add(&p).await.unwrap();
        assert_eq!(repo.get_by_key("P-1").await.unwrap(), p);

        p.nombre = "Pechuga deshuesada".to_string();
        p.fecha_mas_nueva = Some(fecha(2024, 1, 9));
        repo.update(&p).await.unwrap();
        assert_eq!(repo.get_all().await.unwrap(), vec![p.clone()]);

        repo.delete("P-1").await.unwrap();
        assert!(repo.get_by_key("P-1").await.unwrap_err().is_not_found());
        assert!(repo.update(&p).await.unwrap_err().is_not_found());
        assert!(repo.delete("P-1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_bajos_de_stock() {
        let db = db().await;
        let repo = db.productos();
        repo.add(&producto("P-1", 12, 1.0)).await.unwrap();
        repo.add(&producto("P-2", 3, 1.0)).await.unwrap();
        repo.add(&producto("P-3", 0, 0.0)).await.unwrap();
        repo.add(&producto("P-4", 10, 1.0)).await.unwrap();

        let codigos: Vec<String> = repo
            .get_productos_bajos_de_stock(10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.codigo)
            .collect();
        assert_eq!(codigos, ["P-3", "P-2"]);
    }

    #[tokio::test]
    async fn test_actualizar_stock_is_a_delta() {
        let db = db().await;
        let repo = db.productos();
        repo.add(&producto("P-1", 10, 20.0)).await.unwrap();

        repo.actualizar_stock("P-1", -4, -8.5).await.unwrap();
        repo.actualizar_stock("P-1", 1, 0.5).await.unwrap();

        let p = repo.get_by_key("P-1").await.unwrap();
        assert_eq!(p.unidades, 7);
        assert!((p.kilos - 12.0).abs() < 1e-9);

        let err = repo.actualizar_stock("NOPE", 1, 1.0).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_validar_stock_disponible() {
        let db = db().await;
        let repo = db.productos();
        repo.add(&producto("P-1", 10, 20.0)).await.unwrap();

        assert!(repo.validar_stock_disponible("P-1", 10, 20.0).await.unwrap());
        assert!(!repo.validar_stock_disponible("P-1", 11, 1.0).await.unwrap());
        assert!(!repo.validar_stock_disponible("P-1", 1, 20.5).await.unwrap());
        assert!(!repo.validar_stock_disponible("NOPE", 0, 0.0).await.unwrap());
    }

    #[tokio::test]
    async fn test_ingresar_lote_widens_date_window() {
        let db = db().await;
        let repo = db.productos();
        repo.add(&producto("P-1", 0, 0.0)).await.unwrap();

        repo.ingresar_lote("P-1", 5, 50.0, fecha(2024, 2, 10), fecha(2024, 2, 12))
            .await
            .unwrap();
        repo.ingresar_lote("P-1", 2, 20.0, fecha(2024, 2, 15), fecha(2024, 2, 11))
            .await
            .unwrap();

        let p = repo.get_by_key("P-1").await.unwrap();
        assert_eq!(p.unidades, 7);
        assert_eq!(p.fecha_mas_antigua, Some(fecha(2024, 2, 10)));
        assert_eq!(p.fecha_mas_nueva, Some(fecha(2024, 2, 12)));

        let err = repo
            .ingresar_lote("NOPE", 1, 1.0, fecha(2024, 2, 1), fecha(2024, 2, 1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
