//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Whole Pesos?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CHILEAN PESOS HAVE NO MINOR UNIT                                       │
//! │                                                                         │
//! │  Every price, sale total and debt is a whole number of pesos.          │
//! │  Storing them as f64 invites drift:                                     │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  OUR SOLUTION: i64 pesos end to end                                     │
//! │    Clientes.Deuda, Ventas.Total, Abonos.Monto are INTEGER columns      │
//! │    SUM() over them stays exact                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sermac_core::money::Money;
//!
//! let venta = Money::from_pesos(12_500);
//! let abono = Money::from_pesos(2_500);
//!
//! assert_eq!((venta - abono).pesos(), 10_000);
//! assert_eq!(venta.to_string(), "$12.500");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in whole Chilean pesos.
///
/// ## Design Decisions
/// - **i64 (signed)**: debt adjustments and payments are negative deltas
/// - **Transparent on the wire**: serializes as a bare number and maps to
///   an INTEGER column with the `sqlx` feature
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Venta.total ──┬──► SUM over credit sales ──► deuda total del cliente  │
/// │                │                                                        │
/// │                └──► SUM over a date range ──► total de ventas          │
/// │                                                                         │
/// │  Abono.monto ──► subtracted from the client's debt                     │
/// │                                                                         │
/// │  Cliente.deuda ──► stored balance, > 0 means "cliente con deuda"       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole pesos.
    ///
    /// ## Example
    /// ```rust
    /// use sermac_core::money::Money;
    ///
    /// let total = Money::from_pesos(3_500);
    /// assert_eq!(total.pesos(), 3_500);
    /// ```
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos)
    }

    /// Returns the amount in pesos.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use sermac_core::money::Money;
    ///
    /// let precio_bandeja = Money::from_pesos(4_990);
    /// assert_eq!(precio_bandeja.multiply_quantity(3).pesos(), 14_970);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Chilean display format: `$` prefix and `.` as thousands separator.
///
/// ```text
///   1234567  →  $1.234.567
///   -2500    →  -$2.500
/// ```
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    fn from(pesos: i64) -> Self {
        Money(pesos)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_pesos(0).to_string(), "$0");
        assert_eq!(Money::from_pesos(999).to_string(), "$999");
        assert_eq!(Money::from_pesos(1_000).to_string(), "$1.000");
        assert_eq!(Money::from_pesos(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Money::from_pesos(-2_500).to_string(), "-$2.500");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_pesos(2_500);
        let b = Money::from_pesos(1_000);

        assert_eq!((a + b).pesos(), 3_500);
        assert_eq!((a - b).pesos(), 1_500);
        assert_eq!((-a).pesos(), -2_500);

        let mut c = a;
        c -= b;
        c += Money::from_pesos(10);
        assert_eq!(c.pesos(), 1_510);
    }

    #[test]
    fn test_sum() {
        let total: Money = [1_000, 2_500]
            .into_iter()
            .map(Money::from_pesos)
            .sum();
        assert_eq!(total, Money::from_pesos(3_500));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_pesos(1).is_positive());
        assert!(Money::from_pesos(-1).is_negative());
        assert_eq!(Money::from_pesos(-40).abs().pesos(), 40);
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&Money::from_pesos(3_500)).unwrap();
        assert_eq!(json, "3500");
    }
}
