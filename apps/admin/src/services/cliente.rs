//! # Cliente Service
//!
//! Client maintenance with required-field checks in front of the
//! repository, plus the account summary shown on the client screen.

use sermac_core::validation::{validate_abono, validate_cliente, validate_rut};
use sermac_core::{Abono, Cliente, Money, ResumenCliente};
use sermac_db::{ClienteRepository, Database, Repository};
use tracing::{info, warn};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct ClienteService {
    clientes: ClienteRepository,
}

impl ClienteService {
    pub fn new(db: &Database) -> Self {
        ClienteService {
            clientes: db.clientes(),
        }
    }

    pub async fn listar(&self) -> AppResult<Vec<Cliente>> {
        Ok(self.clientes.get_all().await?)
    }

    pub async fn obtener(&self, rut: &str) -> AppResult<Cliente> {
        validate_rut(rut)?;
        Ok(self.clientes.get_by_key(rut).await?)
    }

    pub async fn agregar(&self, cliente: &Cliente) -> AppResult<()> {
        validate_cliente(cliente)?;
        self.clientes.add(cliente).await?;
        Ok(())
    }

    pub async fn actualizar(&self, cliente: &Cliente) -> AppResult<()> {
        validate_cliente(cliente)?;
        self.clientes.update(cliente).await?;
        Ok(())
    }

    pub async fn eliminar(&self, rut: &str) -> AppResult<()> {
        validate_rut(rut)?;
        self.clientes.delete(rut).await?;
        Ok(())
    }

    /// Clients whose stored balance is above zero.
    pub async fn deudores(&self) -> AppResult<Vec<Cliente>> {
        Ok(self.clientes.get_clientes_con_deuda().await?)
    }

    /// Debt recomputed from credit sales and payments.
    pub async fn deuda_total(&self, rut: &str) -> AppResult<Money> {
        validate_rut(rut)?;
        Ok(self.clientes.calcular_deuda_total(rut).await?)
    }

    /// Records a payment; returns its id.
    pub async fn registrar_abono(&self, abono: &Abono) -> AppResult<i64> {
        validate_abono(abono)?;
        Ok(self.clientes.registrar_abono(abono).await?)
    }

    /// The client, its sales, and the debt those sales imply.
    pub async fn resumen(&self, rut: &str) -> AppResult<ResumenCliente> {
        validate_rut(rut)?;

        let cliente = self.clientes.get_by_key(rut).await?;
        let ventas = self.clientes.get_ventas_por_cliente(rut).await?;
        let deuda_calculada = self.clientes.calcular_deuda_total(rut).await?;

        let resumen = ResumenCliente {
            cliente,
            ventas,
            deuda_calculada,
        };
        if resumen.descuadrado() {
            warn!(
                rut = %rut,
                deuda = %resumen.cliente.deuda,
                deuda_calculada = %resumen.deuda_calculada,
                "Stored debt differs from sales history"
            );
        }
        info!(rut = %rut, ventas = resumen.ventas.len(), "Built resumen de cliente");
        Ok(resumen)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{cliente, db, fecha, venta};

    #[tokio::test]
    async fn test_agregar_validates_before_writing() {
        let db = db().await;
        let service = ClienteService::new(&db);

        let mut sin_nombre = cliente("76.123.456-7", 0);
        sin_nombre.nombre = "  ".to_string();
        assert!(service.agregar(&sin_nombre).await.unwrap_err().is_validation());

        let mut sin_rut = cliente("", 0);
        sin_rut.nombre = "Sin RUT".to_string();
        assert!(service.agregar(&sin_rut).await.unwrap_err().is_validation());

        assert!(service.listar().await.unwrap().is_empty());

        service.agregar(&cliente("76.123.456-7", 0)).await.unwrap();
        assert_eq!(service.listar().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_actualizar_and_eliminar_missing_are_not_found() {
        let db = db().await;
        let service = ClienteService::new(&db);

        assert!(service
            .actualizar(&cliente("1-9", 0))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(service.eliminar("1-9").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_registrar_abono_rejects_non_positive() {
        let db = db().await;
        let service = ClienteService::new(&db);
        service.agregar(&cliente("1-9", 5_000)).await.unwrap();

        let abono = Abono {
            id: None,
            rut: "1-9".to_string(),
            monto: Money::zero(),
            fecha: fecha(2024, 3, 1),
        };
        assert!(service.registrar_abono(&abono).await.unwrap_err().is_validation());

        let abono = Abono {
            monto: Money::from_pesos(2_000),
            ..abono
        };
        service.registrar_abono(&abono).await.unwrap();
        assert_eq!(
            service.obtener("1-9").await.unwrap().deuda,
            Money::from_pesos(3_000)
        );
    }

    #[tokio::test]
    async fn test_resumen() {
        let db = db().await;
        let service = ClienteService::new(&db);
        service.agregar(&cliente("1-9", 3_500)).await.unwrap();
        db.ventas()
            .add(&venta(1, "P-1", "1-9", 1_000, true, fecha(2024, 3, 1)))
            .await
            .unwrap();
        db.ventas()
            .add(&venta(2, "P-1", "1-9", 2_500, true, fecha(2024, 3, 2)))
            .await
            .unwrap();
        db.ventas()
            .add(&venta(3, "P-1", "1-9", 9_000, false, fecha(2024, 3, 3)))
            .await
            .unwrap();

        let resumen = service.resumen("1-9").await.unwrap();
        assert_eq!(resumen.ventas.len(), 3);
        assert_eq!(resumen.deuda_calculada, Money::from_pesos(3_500));
        assert!(!resumen.descuadrado());

        assert_eq!(service.deuda_total("1-9").await.unwrap(), Money::from_pesos(3_500));
        assert_eq!(service.deudores().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resumen_of_unknown_client() {
        let db = db().await;
        let service = ClienteService::new(&db);
        assert!(service.resumen("1-9").await.unwrap_err().is_not_found());
    }
}
