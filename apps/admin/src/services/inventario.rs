//! # Inventario Service
//!
//! Stock receipts and the stock reports built on them.
//!
//! ## Receipt Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  registrar_recepcion(recepcion)                                         │
//! │       │                                                                 │
//! │       ├── validate; no coded line → CoreError::EmptyReceipt             │
//! │       │                                                                 │
//! │       ▼  one unit of work                                               │
//! │  BEGIN                                                                  │
//! │    proveedor / vendedor registered                                      │
//! │    numero_compra = incrementar_numero_compra()                          │
//! │    per coded line:                                                      │
//! │      nombre_producto(codigo)       unknown code → NotFound              │
//! │      productos.ingresar_lote(..)   stock + lot dates                    │
//! │      inventario.registrar_movimiento(..)                                │
//! │  COMMIT (any failure → ROLLBACK, nothing written)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  received products under stock_minimo → Notification::StockBajo        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use sermac_core::validation::{
    validate_codigo, validate_kilos, validate_recepcion, validate_unidades,
};
use sermac_core::{CoreError, Inventario, Producto, RecepcionInventario};
use sermac_db::{Database, Repository, RepositoryResult, UnitOfWork};
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::services::configuration::ConfigurationService;
use crate::services::notification::{Notification, NotificationService};

/// What a committed receipt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecepcionRegistrada {
    pub numero_compra: i64,
    pub lineas: usize,
}

#[derive(Debug, Clone)]
pub struct InventarioService {
    db: Database,
    config: ConfigurationService,
    notifications: NotificationService,
}

impl InventarioService {
    pub fn new(
        db: Database,
        config: ConfigurationService,
        notifications: NotificationService,
    ) -> Self {
        InventarioService {
            db,
            config,
            notifications,
        }
    }

    /// Enters a purchase receipt. Lines without a product code are
    /// skipped; all others commit together or not at all.
    pub async fn registrar_recepcion(
        &self,
        recepcion: &RecepcionInventario,
    ) -> AppResult<RecepcionRegistrada> {
        validate_recepcion(recepcion)?;
        let lineas = recepcion.lineas_validas().count();
        if lineas == 0 {
            return Err(CoreError::EmptyReceipt.into());
        }

        let uow = self.db.unit_of_work();
        uow.begin().await?;

        let numero_compra = match Self::escribir_recepcion(&uow, recepcion).await {
            Ok(numero_compra) => numero_compra,
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback of receipt failed");
                }
                return Err(err.into());
            }
        };
        let writes = uow.save_changes().await?;
        drop(uow);

        info!(
            numero_compra,
            lineas,
            writes,
            proveedor = %recepcion.proveedor,
            "Registered recepcion de inventario"
        );
        self.notifications.info(format!(
            "Productos actualizados en el inventario (compra #{numero_compra})."
        ));

        let codigos: BTreeSet<&str> = recepcion
            .lineas_validas()
            .map(|linea| linea.codigo.as_str())
            .collect();
        self.avisar_stock_bajo(&codigos).await;

        Ok(RecepcionRegistrada {
            numero_compra,
            lineas,
        })
    }

    async fn escribir_recepcion(
        uow: &UnitOfWork,
        recepcion: &RecepcionInventario,
    ) -> RepositoryResult<i64> {
        uow.compras().agregar_proveedor(&recepcion.proveedor).await?;
        uow.compras().agregar_vendedor(&recepcion.vendedor).await?;
        let numero_compra = uow.compras().incrementar_numero_compra().await?;

        for linea in recepcion.lineas_validas() {
            let nombre = uow.compras().nombre_producto(&linea.codigo).await?;
            debug!(codigo = %linea.codigo, nombre = %nombre, "Receiving line");

            uow.productos()
                .ingresar_lote(
                    &linea.codigo,
                    linea.unidades,
                    linea.kilos,
                    recepcion.fecha_compra,
                    linea.fecha,
                )
                .await?;
            uow.inventario()
                .registrar_movimiento(&Inventario {
                    codigo: linea.codigo.clone(),
                    producto: nombre,
                    unidades: linea.unidades,
                    kilos: linea.kilos,
                    fecha: linea.fecha,
                    fecha_vencimiento: linea.fecha_vencimiento,
                    numero_compra,
                    proveedor: recepcion.proveedor.trim().to_string(),
                    vendedor: recepcion.vendedor.trim().to_string(),
                })
                .await?;
        }

        Ok(numero_compra)
    }

    /// Publishes a low-stock notification for each of `codigos` under the
    /// configured minimum. Failures are logged, the receipt is already in.
    async fn avisar_stock_bajo(&self, codigos: &BTreeSet<&str>) {
        let minimo = self.config.stock_minimo();
        match self.db.productos().get_productos_bajos_de_stock(minimo).await {
            Ok(productos) => {
                for producto in productos
                    .into_iter()
                    .filter(|p| codigos.contains(p.codigo.as_str()))
                {
                    self.notifications.publish(Notification::StockBajo {
                        codigo: producto.codigo,
                        nombre: producto.nombre,
                        unidades: producto.unidades,
                        minimo,
                    });
                }
            }
            Err(err) => warn!(error = %err, "Low stock check after receipt failed"),
        }
    }

    /// Takes stock out of a product, refusing to go below zero.
    pub async fn retirar_stock(&self, codigo: &str, unidades: i64, kilos: f64) -> AppResult<()> {
        validate_codigo(codigo)?;
        validate_unidades("unidades", unidades)?;
        validate_kilos("kilos", kilos)?;

        let productos = self.db.productos();
        if !productos.validar_stock_disponible(codigo, unidades, kilos).await? {
            let producto = productos.get_by_key(codigo).await?;
            return Err(CoreError::InsufficientStock {
                codigo: codigo.to_string(),
                disponible: producto.unidades,
                solicitado: unidades,
            }
            .into());
        }

        productos.actualizar_stock(codigo, -unidades, -kilos).await?;
        if let Ok(producto) = productos.get_by_key(codigo).await {
            let minimo = self.config.stock_minimo();
            if producto.bajo_stock(minimo) {
                self.notifications.publish(Notification::StockBajo {
                    codigo: producto.codigo,
                    nombre: producto.nombre,
                    unidades: producto.unidades,
                    minimo,
                });
            }
        }
        Ok(())
    }

    /// Products under `minimo` units, or under the configured minimum.
    pub async fn productos_bajo_stock(&self, minimo: Option<i64>) -> AppResult<Vec<Producto>> {
        let minimo = minimo.unwrap_or_else(|| self.config.stock_minimo());
        validate_unidades("minimo", minimo)?;
        Ok(self.db.productos().get_productos_bajos_de_stock(minimo).await?)
    }

    /// Lots expiring within `dias` days, or the configured window.
    pub async fn por_vencer(&self, dias: Option<i64>) -> AppResult<Vec<Inventario>> {
        let dias = dias.unwrap_or_else(|| self.config.dias_vencimiento());
        validate_unidades("dias", dias)?;
        Ok(self.db.inventario().get_inventario_proximo_a_vencer(dias).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
