//! # Validation Module
//!
//! Required-field checks run before a statement reaches the database.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Services (apps/admin)                                        │
//! │  └── THIS MODULE: required fields, non-negative quantities             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── PRIMARY KEY / UNIQUE constraints                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is deliberately shallow: no RUT check-digit arithmetic, no
//! cross-entity rules.
//!
//! ## Usage
//! ```rust
//! use sermac_core::validation::{validate_rut, validate_codigo};
//!
//! assert!(validate_rut("76.123.456-7").is_ok());
//! assert!(validate_codigo("").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{Abono, Cliente, Inventario, Producto, RecepcionInventario, Venta};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest RUT accepted, formatted (`"12.345.678-K"`).
pub const MAX_RUT_LEN: usize = 12;

/// Longest product code accepted.
pub const MAX_CODIGO_LEN: usize = 50;

/// Longest free-text field accepted.
pub const MAX_TEXTO_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a RUT.
///
/// ## Rules
/// - Must not be blank
/// - At most 12 characters
/// - Only digits, dots, one hyphen, and `K`/`k` as check digit
pub fn validate_rut(rut: &str) -> ValidationResult<()> {
    let rut = rut.trim();

    if rut.is_empty() {
        return Err(ValidationError::required("rut"));
    }

    if rut.len() > MAX_RUT_LEN {
        return Err(ValidationError::TooLong {
            field: "rut".to_string(),
            max: MAX_RUT_LEN,
        });
    }

    if !rut
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == 'K' || c == 'k')
        || rut.matches('-').count() > 1
    {
        return Err(ValidationError::InvalidFormat {
            field: "rut".to_string(),
            reason: "must contain only digits, dots, one hyphen and K".to_string(),
        });
    }

    Ok(())
}

/// Validates a product code.
///
/// ## Example
/// ```rust
/// use sermac_core::validation::validate_codigo;
///
/// assert!(validate_codigo("P-001").is_ok());
/// assert!(validate_codigo("   ").is_err());
/// ```
pub fn validate_codigo(codigo: &str) -> ValidationResult<()> {
    let codigo = codigo.trim();

    if codigo.is_empty() {
        return Err(ValidationError::required("codigo"));
    }

    if codigo.len() > MAX_CODIGO_LEN {
        return Err(ValidationError::TooLong {
            field: "codigo".to_string(),
            max: MAX_CODIGO_LEN,
        });
    }

    Ok(())
}

/// Validates a required free-text field (names, suppliers, sellers).
pub fn validate_texto(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_TEXTO_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXTO_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantities (units, trays) cannot go below zero.
pub fn validate_unidades(field: &str, unidades: i64) -> ValidationResult<()> {
    if unidades < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Weights must be finite and non-negative.
pub fn validate_kilos(field: &str, kilos: f64) -> ValidationResult<()> {
    if !kilos.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if kilos < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an inclusive date range.
pub fn validate_rango(inicio: NaiveDate, fin: NaiveDate) -> ValidationResult<()> {
    if inicio > fin {
        return Err(ValidationError::InvertedRange {
            field: "rango".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Required fields of a client. Name is required, address and giro may be
/// blank.
pub fn validate_cliente(cliente: &Cliente) -> ValidationResult<()> {
    validate_rut(&cliente.rut)?;
    validate_texto("nombre", &cliente.nombre)?;
    Ok(())
}

pub fn validate_producto(producto: &Producto) -> ValidationResult<()> {
    validate_codigo(&producto.codigo)?;
    validate_texto("nombre", &producto.nombre)?;
    validate_unidades("unidades", producto.unidades)?;
    validate_kilos("kilos", producto.kilos)?;
    Ok(())
}

pub fn validate_venta(venta: &Venta) -> ValidationResult<()> {
    if venta.numero_guia <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "numero_guia".to_string(),
        });
    }
    validate_codigo(&venta.codigo_producto)?;
    validate_rut(&venta.rut)?;
    validate_unidades("bandejas", venta.bandejas)?;
    validate_kilos("kilos_neto", venta.kilos_neto)?;
    if venta.total.is_negative() {
        return Err(ValidationError::Negative {
            field: "total".to_string(),
        });
    }
    Ok(())
}

pub fn validate_inventario(inventario: &Inventario) -> ValidationResult<()> {
    validate_codigo(&inventario.codigo)?;
    validate_unidades("unidades", inventario.unidades)?;
    validate_kilos("kilos", inventario.kilos)?;
    Ok(())
}

/// A payment must name a client and carry a positive amount.
pub fn validate_abono(abono: &Abono) -> ValidationResult<()> {
    validate_rut(&abono.rut)?;
    if !abono.monto.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "monto".to_string(),
        });
    }
    Ok(())
}

/// Supplier and seller are required; every coded line must carry
/// non-negative amounts.
pub fn validate_recepcion(recepcion: &RecepcionInventario) -> ValidationResult<()> {
    validate_texto("proveedor", &recepcion.proveedor)?;
    validate_texto("vendedor", &recepcion.vendedor)?;
    for linea in recepcion.lineas_validas() {
        validate_codigo(&linea.codigo)?;
        validate_unidades("unidades", linea.unidades)?;
        validate_kilos("kilos", linea.kilos)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_validate_rut() {
        assert!(validate_rut("76.123.456-7").is_ok());
        assert!(validate_rut("12345678-K").is_ok());
        assert!(validate_rut("1-9").is_ok());

        assert!(validate_rut("").is_err());
        assert!(validate_rut("   ").is_err());
        assert!(validate_rut("12-34-5").is_err());
        assert!(validate_rut("76.123.456-X").is_err());
        assert!(validate_rut("1234567890123").is_err());
    }

    #[test]
    fn test_validate_codigo() {
        assert!(validate_codigo("P-001").is_ok());
        assert_eq!(validate_codigo(""), Err(ValidationError::required("codigo")));
        assert!(validate_codigo(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantities() {
        assert!(validate_unidades("unidades", 0).is_ok());
        assert!(validate_unidades("unidades", -1).is_err());
        assert!(validate_kilos("kilos", 0.0).is_ok());
        assert!(validate_kilos("kilos", -0.5).is_err());
        assert!(validate_kilos("kilos", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_rango() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(validate_rango(a, b).is_ok());
        assert!(validate_rango(a, a).is_ok());
        assert!(validate_rango(b, a).is_err());
    }

    #[test]
    fn test_validate_cliente_requires_nombre() {
        let cliente = Cliente {
            rut: "1-9".into(),
            nombre: " ".into(),
            direccion: String::new(),
            giro: String::new(),
            deuda: Money::zero(),
        };
        assert_eq!(
            validate_cliente(&cliente),
            Err(ValidationError::required("nombre"))
        );
    }

    #[test]
    fn test_validate_abono_requires_positive_monto() {
        let abono = Abono {
            id: None,
            rut: "1-9".into(),
            monto: Money::zero(),
            fecha: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert!(validate_abono(&abono).is_err());
    }
}
