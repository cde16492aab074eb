//! # Venta Repository
//!
//! Sale lines of dispatch notes (guías de despacho).
//!
//! A note with three products is three rows sharing a `NumeroGuia`; the
//! key of a row is `(NumeroGuia, CodigoProducto)`.

use chrono::NaiveDate;
use sermac_core::{Money, Venta, VentaKey};
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{translate, DbError, DbResult, RepositoryResult};
use crate::repository::Repository;
use crate::session::Session;

const ENTITY: &str = "Venta";

macro_rules! select_ventas {
    ($tail:literal) => {
        concat!(
            "SELECT NumeroGuia AS numero_guia, CodigoProducto AS codigo_producto, ",
            "Descripcion AS descripcion, Bandejas AS bandejas, KilosNeto AS kilos_neto, ",
            "FechaVenta AS fecha_venta, PagadoConCredito AS pagado_con_credito, ",
            "RUT AS rut, ClienteNombre AS cliente_nombre, ",
            "CAST(ROUND(Total) AS INTEGER) AS total FROM Ventas ",
            $tail
        )
    };
}

/// Sales billed to `rut`, oldest first. Shared with the client repository.
pub(crate) async fn fetch_ventas_por_cliente(
    conn: &mut SqliteConnection,
    rut: &str,
) -> DbResult<Vec<Venta>> {
    let ventas = sqlx::query_as::<_, Venta>(select_ventas!(
        "WHERE RUT = ?1 ORDER BY FechaVenta, NumeroGuia, CodigoProducto"
    ))
    .bind(rut)
    .fetch_all(conn)
    .await?;
    Ok(ventas)
}

/// Repository for sale lines.
#[derive(Debug, Clone)]
pub struct VentaRepository {
    session: Session,
}

impl VentaRepository {
    pub(crate) fn new(session: Session) -> Self {
        VentaRepository { session }
    }

    /// Sales billed to a client, oldest first.
    pub async fn get_ventas_por_cliente(&self, rut: &str) -> RepositoryResult<Vec<Venta>> {
        let result: DbResult<Vec<Venta>> = async {
            let mut scope = self.session.read().await?;
            fetch_ventas_por_cliente(scope.conn(), rut).await
        }
        .await;

        let ventas = result.map_err(|e| translate(ENTITY, "list by client", &rut, e))?;
        info!(rut = %rut, count = ventas.len(), "Fetched ventas por cliente");
        Ok(ventas)
    }

    /// Sales dated between `inicio` and `fin`, both inclusive.
    pub async fn get_ventas_en_rango(
        &self,
        inicio: NaiveDate,
        fin: NaiveDate,
    ) -> RepositoryResult<Vec<Venta>> {
        let rango = format!("{inicio}..={fin}");
        let result: DbResult<Vec<Venta>> = async {
            let mut scope = self.session.read().await?;
            let ventas = sqlx::query_as::<_, Venta>(select_ventas!(
                "WHERE FechaVenta BETWEEN ?1 AND ?2 ORDER BY FechaVenta, NumeroGuia, CodigoProducto"
            ))
            .bind(inicio)
            .bind(fin)
            .fetch_all(scope.conn())
            .await?;
            Ok(ventas)
        }
        .await;

        let ventas = result.map_err(|e| translate(ENTITY, "list range", &rango, e))?;
        info!(rango = %rango, count = ventas.len(), "Fetched ventas en rango");
        Ok(ventas)
    }

    /// Sum of `Total` for sales dated between `inicio` and `fin`, both
    /// inclusive. Cash and credit sales alike.
    pub async fn calcular_total_ventas(
        &self,
        inicio: NaiveDate,
        fin: NaiveDate,
    ) -> RepositoryResult<Money> {
        let rango = format!("{inicio}..={fin}");
        let result: DbResult<i64> = async {
            let mut scope = self.session.read().await?;
            let total = sqlx::query_scalar::<_, i64>(
                "SELECT CAST(ROUND(COALESCE(SUM(Total), 0)) AS INTEGER) \
                 FROM Ventas WHERE FechaVenta BETWEEN ?1 AND ?2",
            )
            .bind(inicio)
            .bind(fin)
            .fetch_one(scope.conn())
            .await?;
            Ok(total)
        }
        .await;

        let total = Money::from_pesos(
            result.map_err(|e| translate(ENTITY, "sum range", &rango, e))?,
        );
        info!(rango = %rango, total = %total, "Computed total de ventas");
        Ok(total)
    }
}

impl Repository for VentaRepository {
    type Entity = Venta;
    type Key = VentaKey;

    async fn get_all(&self) -> RepositoryResult<Vec<Venta>> {
        let result: DbResult<Vec<Venta>> = async {
            let mut scope = self.session.read().await?;
            let ventas = sqlx::query_as::<_, Venta>(select_ventas!(""))
                .fetch_all(scope.conn())
                .await?;
            Ok(ventas)
        }
        .await;

        let ventas = result.map_err(|e| translate(ENTITY, "list", &"*", e))?;
        info!(count = ventas.len(), "Fetched ventas");
        Ok(ventas)
    }

    async fn get_by_key(&self, key: &VentaKey) -> RepositoryResult<Venta> {
        let result: DbResult<Venta> = async {
            let mut scope = self.session.read().await?;
            sqlx::query_as::<_, Venta>(select_ventas!(
                "WHERE NumeroGuia = ?1 AND CodigoProducto = ?2"
            ))
            .bind(key.numero_guia)
            .bind(&key.codigo_producto)
            .fetch_optional(scope.conn())
            .await?
            .ok_or_else(|| DbError::not_found(ENTITY, key))
        }
        .await;

        let venta = result.map_err(|e| translate(ENTITY, "get", key, e))?;
        info!(key = %key, "Found venta");
        Ok(venta)
    }

    async fn add(&self, venta: &Venta) -> RepositoryResult<()> {
        let key = venta.key();
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                r#"
                INSERT INTO Ventas (
                    NumeroGuia, CodigoProducto, Descripcion, Bandejas, KilosNeto,
                    FechaVenta, PagadoConCredito, RUT, ClienteNombre, Total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(venta.numero_guia)
            .bind(&venta.codigo_producto)
            .bind(&venta.descripcion)
            .bind(venta.bandejas)
            .bind(venta.kilos_neto)
            .bind(venta.fecha_venta)
            .bind(venta.pagado_con_credito)
            .bind(&venta.rut)
            .bind(&venta.cliente_nombre)
            .bind(venta.total)
            .execute(scope.conn())
            .await
            .map(|_| ())
            .map_err(DbError::from);
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "add", &key, e))?;
        info!(key = %key, rut = %venta.rut, total = %venta.total, "Added venta");
        Ok(())
    }

    async fn update(&self, venta: &Venta) -> RepositoryResult<()> {
        let key = venta.key();
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                r#"
                UPDATE Ventas SET
                    Descripcion = ?3,
                    Bandejas = ?4,
                    KilosNeto = ?5,
                    FechaVenta = ?6,
                    PagadoConCredito = ?7,
                    RUT = ?8,
                    ClienteNombre = ?9,
                    Total = ?10
                WHERE NumeroGuia = ?1 AND CodigoProducto = ?2
                "#,
            )
            .bind(venta.numero_guia)
            .bind(&venta.codigo_producto)
            .bind(&venta.descripcion)
            .bind(venta.bandejas)
            .bind(venta.kilos_neto)
            .bind(venta.fecha_venta)
            .bind(venta.pagado_con_credito)
            .bind(&venta.rut)
            .bind(&venta.cliente_nombre)
            .bind(venta.total)
            .execute(scope.conn())
            .await
            .map_err(DbError::from)
            .and_then(|r| match r.rows_affected() {
                0 => Err(DbError::not_found(ENTITY, &key)),
                _ => Ok(()),
            });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "update", &key, e))?;
        info!(key = %key, "Updated venta");
        Ok(())
    }

    async fn delete(&self, key: &VentaKey) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome =
                sqlx::query("DELETE FROM Ventas WHERE NumeroGuia = ?1 AND CodigoProducto = ?2")
                    .bind(key.numero_guia)
                    .bind(&key.codigo_producto)
                    .execute(scope.conn())
                    .await
                    .map_err(DbError::from)
                    .and_then(|r| match r.rows_affected() {
                        0 => Err(DbError::not_found(ENTITY, key)),
                        _ => Ok(()),
                    });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "delete", key, e))?;
        info!(key = %key, "Deleted venta");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{db, fecha, venta};

    #[tokio::test]
    async fn test_add_then_get_by_key() {
        let db = db().await;
        let repo = db.ventas();
        let v = venta(1001, "P-1", "1-9", 12_500, true, fecha(2024, 4, 10));

        repo.add(&v).await.unwrap();

        assert_eq!(repo.get_by_key(&v.key()).await.unwrap(), v);
    }

    #[tokio::test]
    async fn test_one_guia_many_products() {
        let db = db().await;
        let repo = db.ventas();
        let dia = fecha(2024, 4, 10);
        repo.add(&venta(1001, "P-1", "1-9", 1_000, true, dia)).await.unwrap();
        repo.add(&venta(1001, "P-2", "1-9", 2_000, true, dia)).await.unwrap();

        assert_eq!(repo.get_all().await.unwrap().len(), 2);

        // same line twice is a duplicate key
        let err = repo
            .add(&venta(1001, "P-2", "1-9", 9_999, true, dia))
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(repo.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = db().await;
        let repo = db.ventas();
        let mut v = venta(1001, "P-1", "1-9", 1_000, true, fecha(2024, 4, 10));
        repo.add(&v).await.unwrap();

        v.total = Money::from_pesos(1_200);
        v.pagado_con_credito = false;
        repo.update(&v).await.unwrap();
        assert_eq!(repo.get_by_key(&v.key()).await.unwrap(), v);

        repo.delete(&v.key()).await.unwrap();
        assert!(repo.get_by_key(&v.key()).await.unwrap_err().is_not_found());
        assert!(repo.delete(&v.key()).await.unwrap_err().is_not_found());
        assert!(repo.update(&v).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rango_is_inclusive() {
        let db = db().await;
        let repo = db.ventas();
        repo.add(&venta(1, "P-1", "1-9", 100, true, fecha(2024, 3, 31))).await.unwrap();
        repo.add(&venta(2, "P-1", "1-9", 200, false, fecha(2024, 4, 1))).await.unwrap();
        repo.add(&venta(3, "P-1", "1-9", 300, true, fecha(2024, 4, 30))).await.unwrap();
        repo.add(&venta(4, "P-1", "1-9", 400, true, fecha(2024, 5, 1))).await.unwrap();

        let abril = repo
            .get_ventas_en_rango(fecha(2024, 4, 1), fecha(2024, 4, 30))
            .await
            .unwrap();
        let guias: Vec<i64> = abril.iter().map(|v| v.numero_guia).collect();
        assert_eq!(guias, [2, 3]);

        let total = repo
            .calcular_total_ventas(fecha(2024, 4, 1), fecha(2024, 4, 30))
            .await
            .unwrap();
        assert_eq!(total, Money::from_pesos(500));
    }

    #[tokio::test]
    async fn test_total_of_empty_range_is_zero() {
        let db = db().await;
        let total = db
            .ventas()
            .calcular_total_ventas(fecha(2020, 1, 1), fecha(2020, 12, 31))
            .await
            .unwrap();
        assert!(total.is_zero());
    }
}
