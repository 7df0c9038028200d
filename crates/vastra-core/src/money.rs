//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹1999.50 is stored as 199950 paise, sums are exact                  │
//! │                                                                         │
//! │  Storage:   INTEGER paise in SQLite                                     │
//! │  JSON:      decimal rupees (2000, 1999.5), what the counter UI sends    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vastra_core::money::Money;
//!
//! let price = Money::from_paise(199_950); // ₹1999.50
//! let line = price * 3;
//! assert_eq!(line.paise(), 599_850);
//! assert_eq!(line.to_string(), "₹5998.50");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Paise per rupee.
const PAISE_PER_RUPEE: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 rupee).
///
/// ## Where Money is Used
/// ```text
/// Product.sale_price ──► SaleLine.sale_price ──► SaleItem.item_final_price
///                                                        │
///                       Sale.total_amount ◄──────────────┘
///                       Sale.total_discount
///                       Sale.final_amount
/// ```
///
/// Signed so that discounts and corrections can be represented, but product
/// prices are validated to be non-negative at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ```rust
    /// use vastra_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(2000).paise(), 200_000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * PAISE_PER_RUPEE)
    }

    /// Converts a decimal rupee amount, rounding to the nearest paisa.
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 paise range.
    ///
    /// ```rust
    /// use vastra_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal_rupees(1999.5).unwrap().paise(), 199_950);
    /// assert_eq!(Money::from_decimal_rupees(0.005).unwrap().paise(), 1);
    /// assert!(Money::from_decimal_rupees(f64::NAN).is_none());
    /// ```
    pub fn from_decimal_rupees(rupees: f64) -> Option<Self> {
        if !rupees.is_finite() {
            return None;
        }
        let paise = (rupees * PAISE_PER_RUPEE as f64).round();
        if paise < i64::MIN as f64 || paise > i64::MAX as f64 {
            return None;
        }
        Some(Money(paise as i64))
    }

    /// Parses a rupee amount from text, as found in spreadsheet cells.
    ///
    /// ```rust
    /// use vastra_core::money::Money;
    ///
    /// assert_eq!(Money::parse_rupees(" 450.25 ").unwrap().paise(), 45_025);
    /// assert!(Money::parse_rupees("abc").is_none());
    /// ```
    pub fn parse_rupees(text: &str) -> Option<Self> {
        text.trim()
            .parse::<f64>()
            .ok()
            .and_then(Self::from_decimal_rupees)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / PAISE_PER_RUPEE
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % PAISE_PER_RUPEE).abs()
    }

    /// Returns the amount as decimal rupees, for JSON and spreadsheets.
    pub fn as_decimal_rupees(&self) -> f64 {
        self.0 as f64 / PAISE_PER_RUPEE as f64
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Saree ₹2000 × 2
    ///      │
    ///      ▼
    /// multiply_quantity(2) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// item_final_price ₹4000
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows rupees with two decimals. Debug/log use only.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Serde: decimal rupees on the wire
// =============================================================================

/// Whole amounts serialize as integers (`2000`), fractional ones as
/// decimals (`1999.5`).
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % PAISE_PER_RUPEE == 0 {
            serializer.serialize_i64(self.rupees())
        } else {
            serializer.serialize_f64(self.as_decimal_rupees())
        }
    }
}

struct RupeeVisitor;

impl<'de> Visitor<'de> for RupeeVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a rupee amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(PAISE_PER_RUPEE)
            .map(Money)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let v = i64::try_from(v).map_err(|_| E::custom("amount out of range"))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_decimal_rupees(v).ok_or_else(|| E::custom("amount must be a finite number"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse_rupees(v).ok_or_else(|| E::custom(format!("invalid amount: {v:?}")))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RupeeVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
