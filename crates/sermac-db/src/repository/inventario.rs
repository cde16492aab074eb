//! # Inventario Repository
//!
//! Stock movements: what came in, when, under which purchase number, and
//! when it expires. One row per product per day; a second receipt of the
//! same product on the same day is folded into the existing row by
//! [`InventarioRepository::registrar_movimiento`].

use chrono::{Duration, Local, NaiveDate};
use sermac_core::{Inventario, InventarioKey};
use tracing::info;

use crate::error::{translate, DbError, DbResult, RepositoryResult};
use crate::repository::Repository;
use crate::session::Session;

const ENTITY: &str = "Inventario";

macro_rules! select_inventario {
    ($tail:literal) => {
        concat!(
            "SELECT Codigo AS codigo, Producto AS producto, Unidades AS unidades, ",
            "Kilos AS kilos, Fecha AS fecha, FechaVencimiento AS fecha_vencimiento, ",
            "NumeroCompra AS numero_compra, Proveedor AS proveedor, Vendedor AS vendedor ",
            "FROM Inventario ",
            $tail
        )
    };
}

/// Upper bound for expiry windows. Later years print with a sign and
/// would no longer compare as `YYYY-MM-DD` text.
fn ultima_fecha() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Repository for stock movements.
#[derive(Debug, Clone)]
pub struct InventarioRepository {
    session: Session,
}

impl InventarioRepository {
    pub(crate) fn new(session: Session) -> Self {
        InventarioRepository { session }
    }

    /// Movements recorded on `fecha`.
    pub async fn get_inventario_por_fecha(
        &self,
        fecha: NaiveDate,
    ) -> RepositoryResult<Vec<Inventario>> {
        let result: DbResult<Vec<Inventario>> = async {
            let mut scope = self.session.read().await?;
            let movimientos =
                sqlx::query_as::<_, Inventario>(select_inventario!("WHERE Fecha = ?1 ORDER BY Codigo"))
                    .bind(fecha)
                    .fetch_all(scope.conn())
                    .await?;
            Ok(movimientos)
        }
        .await;

        let movimientos = result.map_err(|e| translate(ENTITY, "list by date", &fecha, e))?;
        info!(fecha = %fecha, count = movimientos.len(), "Fetched inventario por fecha");
        Ok(movimientos)
    }

    /// Moves the newest movement of `codigo` by the given deltas.
    pub async fn actualizar_inventario(
        &self,
        codigo: &str,
        unidades: i64,
        kilos: f64,
    ) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                r#"
                UPDATE Inventario SET Unidades = Unidades + ?2, Kilos = Kilos + ?3
                WHERE Codigo = ?1
                  AND Fecha = (SELECT MAX(Fecha) FROM Inventario WHERE Codigo = ?1)
                "#,
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

        result.map_err(|e| translate(ENTITY, "update", &codigo, e))?;
        info!(codigo = %codigo, unidades, kilos, "Updated inventario");
        Ok(())
    }

    /// Movements expiring between today and today + `dias_limite`,
    /// soonest first.
    pub async fn get_inventario_proximo_a_vencer(
        &self,
        dias_limite: i64,
    ) -> RepositoryResult<Vec<Inventario>> {
        if dias_limite < 0 {
            return Ok(Vec::new());
        }
        let hoy = Local::now().date_naive();
        let hasta = Duration::try_days(dias_limite)
            .and_then(|dias| hoy.checked_add_signed(dias))
            .map_or(ultima_fecha(), |fecha| fecha.min(ultima_fecha()));
        self.get_inventario_con_vencimiento_entre(hoy, hasta).await
    }

    /// Movements whose expiry date falls between `desde` and `hasta`, both
    /// inclusive, soonest first.
    pub async fn get_inventario_con_vencimiento_entre(
        &self,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> RepositoryResult<Vec<Inventario>> {
        let rango = format!("{desde}..={hasta}");
        let result: DbResult<Vec<Inventario>> = async {
            let mut scope = self.session.read().await?;
            let movimientos = sqlx::query_as::<_, Inventario>(select_inventario!(
                "WHERE FechaVencimiento BETWEEN ?1 AND ?2 ORDER BY FechaVencimiento, Codigo"
            ))
            .bind(desde)
            .bind(hasta)
            .fetch_all(scope.conn())
            .await?;
            Ok(movimientos)
        }
        .await;

        let movimientos = result.map_err(|e| translate(ENTITY, "list expiring", &rango, e))?;
        info!(rango = %rango, count = movimientos.len(), "Fetched inventario por vencer");
        Ok(movimientos)
    }

    /// Records a receipt line. A movement already present for the same
    /// product and day accumulates the amounts and takes the new purchase
    /// details.
    pub async fn registrar_movimiento(&self, movimiento: &Inventario) -> RepositoryResult<()> {
        let key = movimiento.key();
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                r#"
                INSERT INTO Inventario (
                    Codigo, Producto, Unidades, Kilos, Fecha, FechaVencimiento,
                    NumeroCompra, Proveedor, Vendedor
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT (Codigo, Fecha) DO UPDATE SET
                    Unidades = Unidades + excluded.Unidades,
                    Kilos = Kilos + excluded.Kilos,
                    FechaVencimiento = excluded.FechaVencimiento,
                    NumeroCompra = excluded.NumeroCompra,
                    Proveedor = excluded.Proveedor,
                    Vendedor = excluded.Vendedor
                "#,
            )
            .bind(&movimiento.codigo)
            .bind(&movimiento.producto)
            .bind(movimiento.unidades)
            .bind(movimiento.kilos)
            .bind(movimiento.fecha)
            .bind(movimiento.fecha_vencimiento)
            .bind(movimiento.numero_compra)
            .bind(&movimiento.proveedor)
            .bind(&movimiento.vendedor)
            .execute(scope.conn())
            .await
            .map(|_| ())
            .map_err(DbError::from);
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "record", &key, e))?;
        info!(
            key = %key,
            numero_compra = movimiento.numero_compra,
            "Recorded movimiento"
        );
        Ok(())
    }
}

impl Repository for InventarioRepository {
    type Entity = Inventario;
    type Key = InventarioKey;

    async fn get_all(&self) -> RepositoryResult<Vec<Inventario>> {
        let result: DbResult<Vec<Inventario>> = async {
            let mut scope = self.session.read().await?;
            let movimientos = sqlx::query_as::<_, Inventario>(select_inventario!(""))
                .fetch_all(scope.conn())
                .await?;
            Ok(movimientos)
        }
        .await;

        let movimientos = result.map_err(|e| translate(ENTITY, "list", &"*", e))?;
        info!(count = movimientos.len(), "Fetched inventario");
        Ok(movimientos)
    }

    async fn get_by_key(&self, key: &InventarioKey) -> RepositoryResult<Inventario> {
        let result: DbResult<Inventario> = async {
            let mut scope = self.session.read().await?;
            sqlx::query_as::<_, Inventario>(select_inventario!("WHERE Codigo = ?1 AND Fecha = ?2"))
                .bind(&key.codigo)
                .bind(key.fecha)
                .fetch_optional(scope.conn())
                .await?
                .ok_or_else(|| DbError::not_found(ENTITY, key))
        }
        .await;

        let movimiento = result.map_err(|e| translate(ENTITY, "get", key, e))?;
        info!(key = %key, "Found movimiento");
        Ok(movimiento)
    }

    async fn add(&self, movimiento: &Inventario) -> RepositoryResult<()> {
        let key = movimiento.key();
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                r#"
                INSERT INTO Inventario (
                    Codigo, Producto, Unidades, Kilos, Fecha, FechaVencimiento,
                    NumeroCompra, Proveedor, Vendedor
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&movimiento.codigo)
            .bind(&movimiento.producto)
            .bind(movimiento.unidades)
            .bind(movimiento.kilos)
            .bind(movimiento.fecha)
            .bind(movimiento.fecha_vencimiento)
            .bind(movimiento.numero_compra)
            .bind(&movimiento.proveedor)
            .bind(&movimiento.vendedor)
            .execute(scope.conn())
            .await
            .map(|_| ())
            .map_err(DbError::from);
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "add", &key, e))?;
        info!(key = %key, "Added movimiento");
        Ok(())
    }

    async fn update(&self, movimiento: &Inventario) -> RepositoryResult<()> {
        let key = movimiento.key();
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                r#"
                UPDATE Inventario SET
                    Producto = ?3,
                    Unidades = ?4,
                    Kilos = ?5,
                    FechaVencimiento = ?6,
                    NumeroCompra = ?7,
                    Proveedor = ?8,
                    Vendedor = ?9
                WHERE Codigo = ?1 AND Fecha = ?2
                "#,
            )
            .bind(&movimiento.codigo)
            .bind(movimiento.fecha)
            .bind(&movimiento.producto)
            .bind(movimiento.unidades)
            .bind(movimiento.kilos)
            .bind(movimiento.fecha_vencimiento)
            .bind(movimiento.numero_compra)
            .bind(&movimiento.proveedor)
            .bind(&movimiento.vendedor)
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
        info!(key = %key, "Updated movimiento");
        Ok(())
    }

    async fn delete(&self, key: &InventarioKey) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query("DELETE FROM Inventario WHERE Codigo = ?1 AND Fecha = ?2")
                .bind(&key.codigo)
                .bind(key.fecha)
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
        info!(key = %key, "Deleted movimiento");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{db, fecha, movimiento};

    #[tokio::test]
    async fn test_crud() {
        let db = db().await;
        let repo = db.inventario();
        let mut m = movimiento("P-1", fecha(2024, 3, 1), Some(fecha(2024, 3, 20)));

        repo.add(&m).await.unwrap();
        assert_eq!(repo.get_by_key(&m.key()).await.unwrap(), m);

        m.unidades = 3;
        m.vendedor = "Juana".to_string();
        repo.update(&m).await.unwrap();
        assert_eq!(repo.get_all().await.unwrap(), vec![m.clone()]);

        repo.delete(&m.key()).await.unwrap();
        assert!(repo.get_by_key(&m.key()).await.unwrap_err().is_not_found());
        assert!(repo.delete(&m.key()).await.unwrap_err().is_not_found());
        assert!(repo.update(&m).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_por_fecha() {
        let db = db().await;
        let repo = db.inventario();
        repo.add(&movimiento("P-2", fecha(2024, 3, 1), None)).await.unwrap();
        repo.add(&movimiento("P-1", fecha(2024, 3, 1), None)).await.unwrap();
        repo.add(&movimiento("P-1", fecha(2024, 3, 2), None)).await.unwrap();

        let codigos: Vec<String> = repo
            .get_inventario_por_fecha(fecha(2024, 3, 1))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.codigo)
            .collect();
        assert_eq!(codigos, ["P-1", "P-2"]);
    }

    #[tokio::test]
    async fn test_actualizar_inventario_touches_newest_only() {
        let db = db().await;
        let repo = db.inventario();
        let viejo = movimiento("P-1", fecha(2024, 3, 1), None);
        let nuevo = movimiento("P-1", fecha(2024, 3, 5), None);
        repo.add(&viejo).await.unwrap();
        repo.add(&nuevo).await.unwrap();

        repo.actualizar_inventario("P-1", -4, -40.0).await.unwrap();

        assert_eq!(repo.get_by_key(&viejo.key()).await.unwrap().unidades, 10);
        assert_eq!(repo.get_by_key(&nuevo.key()).await.unwrap().unidades, 6);

        let err = repo.actualizar_inventario("NOPE", 1, 1.0).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_proximo_a_vencer() {
        let db = db().await;
        let repo = db.inventario();
        let hoy = Local::now().date_naive();
        let dia = fecha(2024, 1, 1);

        repo.add(&movimiento("VENCIDO", dia, Some(hoy - Duration::days(1))))
            .await
            .unwrap();
        repo.add(&movimiento("HOY", dia, Some(hoy))).await.unwrap();
        repo.add(&movimiento("LIMITE", dia, Some(hoy + Duration::days(7))))
            .await
            .unwrap();
        repo.add(&movimiento("LEJOS", dia, Some(hoy + Duration::days(8))))
            .await
            .unwrap();
        repo.add(&movimiento("SIN", dia, None)).await.unwrap();

        let codigos: Vec<String> = repo
            .get_inventario_proximo_a_vencer(7)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.codigo)
            .collect();
        assert_eq!(codigos, ["HOY", "LIMITE"]);
    }

    #[tokio::test]
    async fn test_proximo_a_vencer_with_huge_window() {
        let db = db().await;
        let repo = db.inventario();
        let hoy = Local::now().date_naive();
        let dia = fecha(2024, 1, 1);

        repo.add(&movimiento("VENCIDO", dia, Some(hoy - Duration::days(1))))
            .await
            .unwrap();
        repo.add(&movimiento("LEJOS", dia, Some(hoy + Duration::days(3650))))
            .await
            .unwrap();
        repo.add(&movimiento("FIN", dia, Some(fecha(9999, 12, 31))))
            .await
            .unwrap();

        for dias in [1_000_000_000, i64::MAX] {
            let codigos: Vec<String> = repo
                .get_inventario_proximo_a_vencer(dias)
                .await
                .unwrap()
                .into_iter()
                .map(|m| m.codigo)
                .collect();
            assert_eq!(codigos, ["LEJOS", "FIN"]);
        }

        assert!(repo.get_inventario_proximo_a_vencer(i64::MIN).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registrar_movimiento_accumulates_same_day() {
        let db = db().await;
        let repo = db.inventario();
        let mut m = movimiento("P-1", fecha(2024, 3, 1), None);

        repo.registrar_movimiento(&m).await.unwrap();
        m.numero_compra = 2;
        repo.registrar_movimiento(&m).await.unwrap();

        let guardado = repo.get_by_key(&m.key()).await.unwrap();
        assert_eq!(guardado.unidades, 20);
        assert!((guardado.kilos - 200.0).abs() < 1e-9);
        assert_eq!(guardado.numero_compra, 2);
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }
}
