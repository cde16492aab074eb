//! # Cliente Repository
//!
//! Clients, their stored debt, and payments against it.
//!
//! ## Debt
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two numbers describe what a client owes:                               │
//! │                                                                         │
//! │  Clientes.Deuda          stored balance, moved by actualizar_deuda      │
//! │                          and registrar_abono                            │
//! │                                                                         │
//! │  calcular_deuda_total    recomputed from history:                       │
//! │                            SUM(Ventas.Total  WHERE PagadoConCredito)    │
//! │                          - SUM(Abonos.Monto)                            │
//! │                                                                         │
//! │  Cash sales never count as debt.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sermac_core::{Abono, Cliente, Money, Venta};
use tracing::info;

use crate::error::{translate, DbError, DbResult, RepositoryResult};
use crate::repository::venta::fetch_ventas_por_cliente;
use crate::repository::Repository;
use crate::session::Session;

const ENTITY: &str = "Cliente";

macro_rules! select_clientes {
    ($tail:literal) => {
        concat!(
            "SELECT RUT AS rut, Nombre AS nombre, Direccion AS direccion, ",
            "Giro AS giro, CAST(ROUND(Deuda) AS INTEGER) AS deuda FROM Clientes ",
            $tail
        )
    };
}

/// Repository for clients.
#[derive(Debug, Clone)]
pub struct ClienteRepository {
    session: Session,
}

impl ClienteRepository {
    pub(crate) fn new(session: Session) -> Self {
        ClienteRepository { session }
    }

    /// Clients whose stored balance is above zero.
    pub async fn get_clientes_con_deuda(&self) -> RepositoryResult<Vec<Cliente>> {
        let result: DbResult<Vec<Cliente>> = async {
            let mut scope = self.session.read().await?;
            let clientes = sqlx::query_as::<_, Cliente>(select_clientes!("WHERE Deuda > 0"))
                .fetch_all(scope.conn())
                .await?;
            Ok(clientes)
        }
        .await;

        let clientes = result.map_err(|e| translate(ENTITY, "list indebted", &"*", e))?;
        info!(count = clientes.len(), "Fetched clientes con deuda");
        Ok(clientes)
    }

    /// Credit sales minus payments, recomputed from history.
    ///
    /// A RUT with no sales and no payments owes zero; this does not check
    /// that the client exists.
    pub async fn calcular_deuda_total(&self, rut: &str) -> RepositoryResult<Money> {
        let result: DbResult<i64> = async {
            let mut scope = self.session.read().await?;
            let total = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT CAST(ROUND(
                    COALESCE((SELECT SUM(Total) FROM Ventas
                              WHERE RUT = ?1 AND PagadoConCredito = 1), 0)
                  - COALESCE((SELECT SUM(Monto) FROM Abonos WHERE RUT = ?1), 0)
                ) AS INTEGER)
                "#,
            )
            .bind(rut)
            .fetch_one(scope.conn())
            .await?;
            Ok(total)
        }
        .await;

        let deuda = Money::from_pesos(
            result.map_err(|e| translate(ENTITY, "compute debt of", &rut, e))?,
        );
        info!(rut = %rut, deuda = %deuda, "Computed deuda total");
        Ok(deuda)
    }

    /// Adds `monto` to the stored balance (negative to reduce it).
    pub async fn actualizar_deuda(&self, rut: &str, monto: Money) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query("UPDATE Clientes SET Deuda = Deuda + ?2 WHERE RUT = ?1")
                .bind(rut)
                .bind(monto)
                .execute(scope.conn())
                .await
                .map_err(DbError::from)
                .and_then(|r| match r.rows_affected() {
                    0 => Err(DbError::not_found(ENTITY, rut)),
                    _ => Ok(()),
                });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "update debt of", &rut, e))?;
        info!(rut = %rut, monto = %monto, "Updated deuda");
        Ok(())
    }

    /// Sale lines billed to the client, oldest first.
    pub async fn get_ventas_por_cliente(&self, rut: &str) -> RepositoryResult<Vec<Venta>> {
        let result: DbResult<Vec<Venta>> = async {
            let mut scope = self.session.read().await?;
            fetch_ventas_por_cliente(scope.conn(), rut).await
        }
        .await;

        let ventas = result.map_err(|e| translate(ENTITY, "list sales of", &rut, e))?;
        info!(rut = %rut, count = ventas.len(), "Fetched ventas del cliente");
        Ok(ventas)
    }

    /// Records a payment and lowers the stored balance by its amount, in
    /// one transaction. Returns the new payment id.
    ///
    /// An unknown RUT fails with `NotFound` and records nothing.
    pub async fn registrar_abono(&self, abono: &Abono) -> RepositoryResult<i64> {
        let result: DbResult<i64> = async {
            let mut scope = self.session.write().await?;
            let outcome: DbResult<i64> = async {
                let updated = sqlx::query("UPDATE Clientes SET Deuda = Deuda - ?2 WHERE RUT = ?1")
                    .bind(&abono.rut)
                    .bind(abono.monto)
                    .execute(scope.conn())
                    .await?;
                if updated.rows_affected() == 0 {
                    return Err(DbError::not_found(ENTITY, &abono.rut));
                }

                let inserted =
                    sqlx::query("INSERT INTO Abonos (RUT, Monto, Fecha) VALUES (?1, ?2, ?3)")
                        .bind(&abono.rut)
                        .bind(abono.monto)
                        .bind(abono.fecha)
                        .execute(scope.conn())
                        .await?;
                Ok(inserted.last_insert_rowid())
            }
            .await;
            scope.finish(outcome).await
        }
        .await;

        let id = result.map_err(|e| translate(ENTITY, "register payment of", &abono.rut, e))?;
        info!(rut = %abono.rut, monto = %abono.monto, id, "Registered abono");
        Ok(id)
    }

    /// Payments recorded for the client, oldest first.
    pub async fn get_abonos(&self, rut: &str) -> RepositoryResult<Vec<Abono>> {
        let result: DbResult<Vec<Abono>> = async {
            let mut scope = self.session.read().await?;
            let abonos = sqlx::query_as::<_, Abono>(
                "SELECT Id AS id, RUT AS rut, CAST(ROUND(Monto) AS INTEGER) AS monto, \
                 Fecha AS fecha FROM Abonos WHERE RUT = ?1 ORDER BY Fecha, Id",
            )
            .bind(rut)
            .fetch_all(scope.conn())
            .await?;
            Ok(abonos)
        }
        .await;

        let abonos = result.map_err(|e| translate(ENTITY, "list payments of", &rut, e))?;
        info!(rut = %rut, count = abonos.len(), "Fetched abonos");
        Ok(abonos)
    }
}

impl Repository for ClienteRepository {
    type Entity = Cliente;
    type Key = str;

    async fn get_all(&self) -> RepositoryResult<Vec<Cliente>> {
        let result: DbResult<Vec<Cliente>> = async {
            let mut scope = self.session.read().await?;
            let clientes = sqlx::query_as::<_, Cliente>(select_clientes!(""))
                .fetch_all(scope.conn())
                .await?;
            Ok(clientes)
        }
        .await;

        let clientes = result.map_err(|e| translate(ENTITY, "list", &"*", e))?;
        info!(count = clientes.len(), "Fetched clientes");
        Ok(clientes)
    }

    async fn get_by_key(&self, rut: &str) -> RepositoryResult<Cliente> {
        let result: DbResult<Cliente> = async {
            let mut scope = self.session.read().await?;
            sqlx::query_as::<_, Cliente>(select_clientes!("WHERE RUT = ?1"))
                .bind(rut)
                .fetch_optional(scope.conn())
                .await?
                .ok_or_else(|| DbError::not_found(ENTITY, rut))
        }
        .await;

        let cliente = result.map_err(|e| translate(ENTITY, "get", &rut, e))?;
        info!(rut = %rut, "Found cliente");
        Ok(cliente)
    }

    async fn add(&self, cliente: &Cliente) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                "INSERT INTO Clientes (RUT, Nombre, Direccion, Giro, Deuda) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&cliente.rut)
            .bind(&cliente.nombre)
            .bind(&cliente.direccion)
            .bind(&cliente.giro)
            .bind(cliente.deuda)
            .execute(scope.conn())
            .await
            .map(|_| ())
            .map_err(DbError::from);
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "add", &cliente.rut, e))?;
        info!(rut = %cliente.rut, "Added cliente");
        Ok(())
    }

    async fn update(&self, cliente: &Cliente) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query(
                "UPDATE Clientes SET Nombre = ?2, Direccion = ?3, Giro = ?4, Deuda = ?5 \
                 WHERE RUT = ?1",
            )
            .bind(&cliente.rut)
            .bind(&cliente.nombre)
            .bind(&cliente.direccion)
            .bind(&cliente.giro)
            .bind(cliente.deuda)
            .execute(scope.conn())
            .await
            .map_err(DbError::from)
            .and_then(|r| match r.rows_affected() {
                0 => Err(DbError::not_found(ENTITY, &cliente.rut)),
                _ => Ok(()),
            });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "update", &cliente.rut, e))?;
        info!(rut = %cliente.rut, "Updated cliente");
        Ok(())
    }

    async fn delete(&self, rut: &str) -> RepositoryResult<()> {
        let result: DbResult<()> = async {
            let mut scope = self.session.write().await?;
            let outcome = sqlx::query("DELETE FROM Clientes WHERE RUT = ?1")
                .bind(rut)
                .execute(scope.conn())
                .await
                .map_err(DbError::from)
                .and_then(|r| match r.rows_affected() {
                    0 => Err(DbError::not_found(ENTITY, rut)),
                    _ => Ok(()),
                });
            scope.finish(outcome).await
        }
        .await;

        result.map_err(|e| translate(ENTITY, "delete", &rut, e))?;
        info!(rut = %rut, "Deleted cliente");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::repository::fixtures::{cliente, db, fecha, venta};

    #[tokio::test]
    async fn test_add_then_get_by_key() {
        let db = db().await;
        let repo = db.clientes();
        let c = cliente("76.123.456-7", 0);

        repo.add(&c).await.unwrap();

        assert_eq!(repo.get_by_key("76.123.456-7").await.unwrap(), c);
        assert_eq!(repo.get_all().await.unwrap(), vec![c]);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = db().await;
        let err = db.clientes().get_by_key("1-9").await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::NotFound { entity: "Cliente", ref key } if key == "1-9"
        ));
    }

    #[tokio::test]
    async fn test_update_reflects_change() {
        let db = db().await;
        let repo = db.clientes();
        let mut c = cliente("1-9", 0);
        repo.add(&c).await.unwrap();

        c.nombre = "Comercial Los Andes".to_string();
        c.deuda = Money::from_pesos(15_000);
        repo.update(&c).await.unwrap();

        assert_eq!(repo.get_by_key("1-9").await.unwrap(), c);
    }

    #[tokio::test]
    async fn test_update_missing_leaves_store_unchanged() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 0)).await.unwrap();

        let err = repo.update(&cliente("2-7", 500)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(repo.get_all().await.unwrap(), vec![cliente("1-9", 0)]);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 0)).await.unwrap();

        repo.delete("1-9").await.unwrap();
        assert!(repo.get_by_key("1-9").await.unwrap_err().is_not_found());

        assert!(repo.delete("1-9").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_add_is_storage_error_and_keeps_original() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 100)).await.unwrap();

        let mut dup = cliente("1-9", 999);
        dup.nombre = "Otro".to_string();
        let err = repo.add(&dup).await.unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::Storage {
                source: DbError::UniqueViolation { .. },
                ..
            }
        ));
        assert_eq!(repo.get_by_key("1-9").await.unwrap(), cliente("1-9", 100));
    }

    #[tokio::test]
    async fn test_calcular_deuda_total_sums_credit_sales() {
        let db = db().await;
        db.clientes().add(&cliente("1-9", 0)).await.unwrap();
        let ventas = db.ventas();
        let hoy = fecha(2024, 5, 2);
        ventas.add(&venta(100, "P-1", "1-9", 1_000, true, hoy)).await.unwrap();
        ventas.add(&venta(101, "P-1", "1-9", 2_500, true, hoy)).await.unwrap();

        let deuda = db.clientes().calcular_deuda_total("1-9").await.unwrap();
        assert_eq!(deuda, Money::from_pesos(3_500));
    }

    #[tokio::test]
    async fn test_calcular_deuda_total_ignores_cash_and_subtracts_abonos() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 3_500)).await.unwrap();
        let hoy = fecha(2024, 5, 2);
        db.ventas().add(&venta(100, "P-1", "1-9", 3_500, true, hoy)).await.unwrap();
        db.ventas().add(&venta(101, "P-2", "1-9", 9_900, false, hoy)).await.unwrap();

        repo.registrar_abono(&Abono {
            id: None,
            rut: "1-9".to_string(),
            monto: Money::from_pesos(500),
            fecha: hoy,
        })
        .await
        .unwrap();

        assert_eq!(
            repo.calcular_deuda_total("1-9").await.unwrap(),
            Money::from_pesos(3_000)
        );
        assert_eq!(
            repo.calcular_deuda_total("9-9").await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_get_clientes_con_deuda() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 0)).await.unwrap();
        repo.add(&cliente("2-7", 1_500)).await.unwrap();
        repo.add(&cliente("3-5", -200)).await.unwrap();
        repo.add(&cliente("4-3", 1)).await.unwrap();

        let ruts: Vec<String> = repo
            .get_clientes_con_deuda()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.rut)
            .collect();
        assert_eq!(ruts, ["2-7", "4-3"]);
    }

    #[tokio::test]
    async fn test_actualizar_deuda() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 1_000)).await.unwrap();

        repo.actualizar_deuda("1-9", Money::from_pesos(2_500))
            .await
            .unwrap();
        repo.actualizar_deuda("1-9", Money::from_pesos(-500))
            .await
            .unwrap();
        assert_eq!(
            repo.get_by_key("1-9").await.unwrap().deuda,
            Money::from_pesos(3_000)
        );

        let err = repo
            .actualizar_deuda("2-7", Money::from_pesos(10))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_registrar_abono() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 5_000)).await.unwrap();

        let abono = Abono {
            id: None,
            rut: "1-9".to_string(),
            monto: Money::from_pesos(2_000),
            fecha: fecha(2024, 6, 1),
        };
        let id = repo.registrar_abono(&abono).await.unwrap();

        assert_eq!(
            repo.get_by_key("1-9").await.unwrap().deuda,
            Money::from_pesos(3_000)
        );
        assert_eq!(
            repo.get_abonos("1-9").await.unwrap(),
            vec![Abono {
                id: Some(id),
                ..abono
            }]
        );
    }

    #[tokio::test]
    async fn test_registrar_abono_unknown_client_records_nothing() {
        let db = db().await;
        let repo = db.clientes();

        let err = repo
            .registrar_abono(&Abono {
                id: None,
                rut: "1-9".to_string(),
                monto: Money::from_pesos(2_000),
                fecha: fecha(2024, 6, 1),
            })
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(repo.get_abonos("1-9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registrar_abono_rolls_back_debt_when_insert_fails() {
        let db = db().await;
        let repo = db.clientes();
        repo.add(&cliente("1-9", 5_000)).await.unwrap();

        sqlx::query("DROP TABLE Abonos")
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo
            .registrar_abono(&Abono {
                id: None,
                rut: "1-9".to_string(),
                monto: Money::from_pesos(2_000),
                fecha: fecha(2024, 6, 1),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Storage { .. }));
        assert_eq!(
            repo.get_by_key("1-9").await.unwrap().deuda,
            Money::from_pesos(5_000)
        );
    }

    #[tokio::test]
    async fn test_get_ventas_por_cliente() {
        let db = db().await;
        let ventas = db.ventas();
        ventas
            .add(&venta(200, "P-1", "1-9", 1_000, true, fecha(2024, 5, 3)))
            .await
            .unwrap();
        ventas
            .add(&venta(100, "P-1", "1-9", 1_000, false, fecha(2024, 5, 1)))
            .await
            .unwrap();
        ventas
            .add(&venta(150, "P-1", "2-7", 1_000, true, fecha(2024, 5, 2)))
            .await
            .unwrap();

        let guias: Vec<i64> = db
            .clientes()
            .get_ventas_por_cliente("1-9")
            .await
            .unwrap()
            .iter()
            .map(|v| v.numero_guia)
            .collect();
        assert_eq!(guias, [100, 200]);
    }
}
