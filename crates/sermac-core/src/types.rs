//! # Domain Types
//!
//! Core domain types used throughout SERMAC Admin.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Cliente      │   │      Venta      │   │    Producto     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  rut (key)      │◄──│  rut            │   │  codigo (key)   │       │
//! │  │  nombre         │   │  numero_guia ┐  │   │  unidades       │       │
//! │  │  deuda (Money)  │   │  codigo_prod ┘key──►│  kilos          │       │
//! │  └────────▲────────┘   │  total (Money)  │   └────────▲────────┘       │
//! │           │            └─────────────────┘            │                │
//! │  ┌────────┴────────┐                        ┌─────────┴───────┐        │
//! │  │     Abono       │                        │   Inventario    │        │
//! │  │  rut, monto     │                        │  codigo ┐       │        │
//! │  │  fecha          │                        │  fecha  ┘ key   │        │
//! │  └─────────────────┘                        └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Relationships are informal: nothing cascades, and a Venta keeps its own
//! copy of the client's name as it was on the dispatch note.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Cliente
// =============================================================================

/// A customer, identified by its Chilean RUT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cliente {
    /// Tax id, unique key (e.g. `"76.123.456-7"`).
    pub rut: String,
    pub nombre: String,
    pub direccion: String,
    /// Line of business.
    pub giro: String,
    /// Stored outstanding balance.
    pub deuda: Money,
}

impl Cliente {
    /// True when the stored balance is above zero.
    #[inline]
    pub fn tiene_deuda(&self) -> bool {
        self.deuda.is_positive()
    }
}

// =============================================================================
// Producto
// =============================================================================

/// A stocked product. Stock is tracked both in units (trays) and kilos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Producto {
    pub codigo: String,
    pub nombre: String,
    pub unidades: i64,
    pub kilos: f64,
    /// Date of the oldest lot still in stock.
    pub fecha_mas_antigua: Option<NaiveDate>,
    /// Date of the newest lot received.
    pub fecha_mas_nueva: Option<NaiveDate>,
}

impl Producto {
    /// Checks whether both units and kilos cover the requested amounts.
    ///
    /// ## Example
    /// ```rust
    /// use sermac_core::Producto;
    ///
    /// let p = Producto {
    ///     codigo: "P-001".into(),
    ///     nombre: "Pechuga".into(),
    ///     unidades: 10,
    ///     kilos: 25.5,
    ///     fecha_mas_antigua: None,
    ///     fecha_mas_nueva: None,
    /// };
    /// assert!(p.tiene_stock(10, 25.5));
    /// assert!(!p.tiene_stock(11, 1.0));
    /// ```
    pub fn tiene_stock(&self, unidades: i64, kilos: f64) -> bool {
        self.unidades >= unidades && self.kilos >= kilos
    }

    /// Units strictly below the given minimum.
    #[inline]
    pub fn bajo_stock(&self, stock_minimo: i64) -> bool {
        self.unidades < stock_minimo
    }
}

// =============================================================================
// Venta
// =============================================================================

/// Key of a sale line: one dispatch note (`numero_guia`) carries one line
/// per product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VentaKey {
    pub numero_guia: i64,
    pub codigo_producto: String,
}

impl std::fmt::Display for VentaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numero_guia, self.codigo_producto)
    }
}

/// A sale line on a dispatch note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Venta {
    pub numero_guia: i64,
    pub codigo_producto: String,
    pub descripcion: String,
    /// Trays dispatched.
    pub bandejas: i64,
    pub kilos_neto: f64,
    pub fecha_venta: NaiveDate,
    /// Credit sales add to the client's debt.
    pub pagado_con_credito: bool,
    pub rut: String,
    /// Client name as printed on the note.
    pub cliente_nombre: String,
    pub total: Money,
}

impl Venta {
    pub fn key(&self) -> VentaKey {
        VentaKey {
            numero_guia: self.numero_guia,
            codigo_producto: self.codigo_producto.clone(),
        }
    }
}

// =============================================================================
// Inventario
// =============================================================================

/// Key of a stock movement: one record per product per day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventarioKey {
    pub codigo: String,
    pub fecha: NaiveDate,
}

impl std::fmt::Display for InventarioKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.codigo, self.fecha)
    }
}

/// A stock movement (goods received against a purchase number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Inventario {
    pub codigo: String,
    /// Product name at the time of the movement.
    pub producto: String,
    pub unidades: i64,
    pub kilos: f64,
    pub fecha: NaiveDate,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub numero_compra: i64,
    pub proveedor: String,
    pub vendedor: String,
}

impl Inventario {
    pub fn key(&self) -> InventarioKey {
        InventarioKey {
            codigo: self.codigo.clone(),
            fecha: self.fecha,
        }
    }
}

// =============================================================================
// Abono
// =============================================================================

/// A payment against a client's debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Abono {
    /// Row id, `None` until stored.
    pub id: Option<i64>,
    pub rut: String,
    pub monto: Money,
    pub fecha: NaiveDate,
}

// =============================================================================
// Inventory Receipt
// =============================================================================

/// One line of an inventory receipt.
///
/// Lines with a blank `codigo` are skipped, the same way an empty grid row
/// is ignored on the entry form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineaRecepcion {
    pub codigo: String,
    pub unidades: i64,
    pub kilos: f64,
    /// Lot date for this line.
    pub fecha: NaiveDate,
    pub fecha_vencimiento: Option<NaiveDate>,
}

/// Goods received under one purchase number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecepcionInventario {
    pub fecha_compra: NaiveDate,
    pub proveedor: String,
    pub vendedor: String,
    pub lineas: Vec<LineaRecepcion>,
}

impl RecepcionInventario {
    /// Lines that carry a product code.
    pub fn lineas_validas(&self) -> impl Iterator<Item = &LineaRecepcion> {
        self.lineas.iter().filter(|l| !l.codigo.trim().is_empty())
    }
}

// =============================================================================
// Client Summary
// =============================================================================

/// A client with its sales and the debt computed from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumenCliente {
    pub cliente: Cliente,
    pub ventas: Vec<Venta>,
    /// Credit sales minus payments.
    pub deuda_calculada: Money,
}

impl ResumenCliente {
    /// True when the stored balance disagrees with the computed one.
    pub fn descuadrado(&self) -> bool {
        self.cliente.deuda != self.deuda_calculada
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fecha(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_cliente_tiene_deuda() {
        let mut c = Cliente {
            rut: "1-9".into(),
            nombre: "Juan".into(),
            direccion: String::new(),
            giro: String::new(),
            deuda: Money::zero(),
        };
        assert!(!c.tiene_deuda());
        c.deuda = Money::from_pesos(1);
        assert!(c.tiene_deuda());
    }

    #[test]
    fn test_producto_stock_checks() {
        let p = Producto {
            codigo: "P-1".into(),
            nombre: "Trutro".into(),
            unidades: 5,
            kilos: 12.0,
            fecha_mas_antigua: None,
            fecha_mas_nueva: None,
        };
        assert!(p.tiene_stock(5, 12.0));
        assert!(!p.tiene_stock(5, 12.5));
        assert!(p.bajo_stock(6));
        assert!(!p.bajo_stock(5));
    }

    #[test]
    fn test_keys_display() {
        let key = VentaKey {
            numero_guia: 1001,
            codigo_producto: "P-1".into(),
        };
        assert_eq!(key.to_string(), "1001/P-1");

        let key = InventarioKey {
            codigo: "P-1".into(),
            fecha: fecha(5),
        };
        assert_eq!(key.to_string(), "P-1@2024-03-05");
    }

    #[test]
    fn test_lineas_validas_skips_blank_codes() {
        let linea = |codigo: &str| LineaRecepcion {
            codigo: codigo.into(),
            unidades: 1,
            kilos: 1.0,
            fecha: fecha(1),
            fecha_vencimiento: None,
        };
        let recepcion = RecepcionInventario {
            fecha_compra: fecha(1),
            proveedor: "Ariztía".into(),
            vendedor: "Pedro".into(),
            lineas: vec![linea("P-1"), linea("  "), linea("P-2")],
        };
        let codigos: Vec<_> = recepcion.lineas_validas().map(|l| l.codigo.as_str()).collect();
        assert_eq!(codigos, ["P-1", "P-2"]);
    }
}
