//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! In floating point, `0.1 + 0.2 != 0.3`, and a canteen that sells three
//! S/ 3.33 menus a few hundred times a day will drift by whole céntimos.
//! Every monetary value in the system is therefore an integer count of
//! céntimos (`i64`). Only the UI converts to soles for display.
//!
//! ## Usage
//! ```rust
//! use maracuya_core::money::Money;
//!
//! // Create from céntimos (the only way in)
//! let price = Money::from_centimos(350); // S/ 3.50
//!
//! let line = price * 2i64;               // S/ 7.00
//! assert_eq!(line.centimos(), 700);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in céntimos of a Peruvian sol.
///
/// - **i64 (signed)**: allows negative values for corrections and refunds
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **Full serde support**: serializes as a plain integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from céntimos (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use maracuya_core::money::Money;
    ///
    /// let price = Money::from_centimos(1099); // S/ 10.99
    /// assert_eq!(price.centimos(), 1099);
    /// ```
    #[inline]
    pub const fn from_centimos(centimos: i64) -> Self {
        Money(centimos)
    }

    /// Creates a Money value from soles and céntimos.
    ///
    /// For negative amounts only the soles part should be negative:
    /// `from_soles_centimos(-5, 50)` is -S/ 5.50, not -S/ 4.50.
    #[inline]
    pub const fn from_soles_centimos(soles: i64, centimos: i64) -> Self {
        if soles < 0 {
            Money(soles * 100 - centimos)
        } else {
            Money(soles * 100 + centimos)
        }
    }

    /// Returns the value in céntimos.
    #[inline]
    pub const fn centimos(&self) -> i64 {
        self.0
    }

    /// Returns the whole-soles portion.
    #[inline]
    pub const fn soles(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the céntimos portion (always 0-99, absolute).
    #[inline]
    pub const fn centimos_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Extracts the tax portion of an IGV-inclusive amount.
    ///
    /// Peruvian retail prices include IGV, so the sale's `tax` field is the
    /// portion of the total that is tax, not an amount added on top:
    ///
    /// ```text
    /// tax = total × bps / (10000 + bps)      (rounded half up)
    /// subtotal = total - tax
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use maracuya_core::money::Money;
    ///
    /// let total = Money::from_centimos(1180); // S/ 11.80 incl. 18% IGV
    /// let tax = total.included_tax(1800);
    /// assert_eq!(tax.centimos(), 180);        // S/ 1.80
    /// ```
    pub fn included_tax(&self, rate_bps: u32) -> Money {
        if rate_bps == 0 {
            return Money::zero();
        }
        // i128 to prevent overflow on large amounts
        let divisor = 10_000i128 + rate_bps as i128;
        let tax = (self.0 as i128 * rate_bps as i128 + divisor / 2) / divisor;
        Money::from_centimos(tax as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use maracuya_core::money::Money;
    ///
    /// let unit_price = Money::from_centimos(300); // S/ 3.00
    /// assert_eq!(unit_price.multiply_quantity(2).centimos(), 600);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for logs and receipts; localized UI formatting is the frontend's
/// concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}S/ {}.{:02}", sign, self.soles().abs(), self.centimos_part())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
