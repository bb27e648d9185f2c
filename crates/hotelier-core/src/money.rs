//! # Money Module
//!
//! Provides the `Money` and `FeeRate` types used by every folio calculation.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a group folio in floating point:                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ balance drifts by fractions     │
//! │                                                                         │
//! │  Recomputing the same folio on every snapshot update must give the     │
//! │  SAME answer every time, regardless of summation order.                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Basis-Point Rates                       │
//! │    room 10000¢ × 2 nights + service 2000¢ = 22000¢                     │
//! │    GST 1000 bps → 22000 × 1000 / 10000 = 2200¢                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hotelier_core::money::{FeeRate, Money};
//!
//! let nightly = Money::from_major_minor(100, 0); // $100.00
//! let room_total = nightly * 2;                   // $200.00
//! let fee = room_total.percentage_of(FeeRate::from_percentage(5.0));
//! assert_eq!(fee.cents(), 1_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: balances go negative when a guest has overpaid
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Saturating arithmetic**: sums clamp at the i64 bounds instead of wrapping
///
/// ## Where Money is Used
/// ```text
/// Stay.room_charge ──► × nights ──┐
///                                 ├──► subtotal ──► + fees ──► − paid ──► balance
/// ServiceRequest.price ───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::Money;
    ///
    /// let charge = Money::from_cents(12_550); // $125.50
    /// assert_eq!(charge.cents(), 12_550);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Calculates a percentage of this amount, rounding half up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so a
    /// long group folio cannot overflow the intermediate product.
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::{FeeRate, Money};
    ///
    /// let subtotal = Money::from_cents(1000); // $10.00
    /// let fee = subtotal.percentage_of(FeeRate::from_bps(825)); // 8.25%
    /// // $0.825 → $0.83
    /// assert_eq!(fee.cents(), 83);
    /// ```
    ///
    /// ## Independence
    /// Service charge and GST are both taken off the same subtotal; neither
    /// is ever applied to the other's result.
    pub fn percentage_of(&self, rate: FeeRate) -> Money {
        let numerator = self.0 as i128 * rate.bps() as i128;
        let rounded = if numerator >= 0 {
            (numerator + 5000) / 10000
        } else {
            (numerator - 5000) / 10000
        };
        Money::from_cents(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies money by a count (nights, quantity).
    #[inline]
    pub const fn multiply(&self, count: i64) -> Self {
        Money(self.0.saturating_mul(count))
    }
}

// =============================================================================
// Fee Rate
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. GST at 18% is `1800`, a 12.5% service charge is
/// `1250`. Storing integers keeps rate × amount exact up to the final cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeRate(u32);

impl FeeRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        FeeRate(bps)
    }

    /// Creates a rate from a percentage, rounding to the nearest basis point.
    ///
    /// Negative or non-finite input collapses to zero; range checks against
    /// the 0-100% contract live in `validation::validate_rate_percent`.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return FeeRate(0);
        }
        FeeRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        FeeRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        FeeRate::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$12.34` (debugging and CLI output only).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, count: i64) -> Self {
        Money(self.0.saturating_mul(count))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(20300)), "$203.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
        assert_eq!(FeeRate::from_bps(1250).to_string(), "12.50%");
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_cents(i64::MAX);
        let min = Money::from_cents(i64::MIN);
        assert_eq!(max + Money::from_cents(1), max);
        assert_eq!(min - Money::from_cents(1), min);
        assert_eq!(max * 2, max);
        assert_eq!(max.multiply(-2), min);

        let mut total = max;
        total += Money::from_cents(500);
        assert_eq!(total, max);
        assert_eq!([max, max].into_iter().sum::<Money>(), max);
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_exact() {
        let subtotal = Money::from_cents(22000);
        assert_eq!(subtotal.percentage_of(FeeRate::from_bps(500)).cents(), 1100);
        assert_eq!(subtotal.percentage_of(FeeRate::from_bps(1000)).cents(), 2200);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // $10.00 at 8.25% = $0.825 → $0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage_of(FeeRate::from_bps(825)).cents(), 83);

        // negative balances round symmetrically
        let credit = Money::from_cents(-1000);
        assert_eq!(credit.percentage_of(FeeRate::from_bps(825)).cents(), -83);
    }

    #[test]
    fn test_fee_rate_from_percentage() {
        assert_eq!(FeeRate::from_percentage(12.5).bps(), 1250);
        assert_eq!(FeeRate::from_percentage(18.0).bps(), 1800);
        assert_eq!(FeeRate::from_percentage(-3.0).bps(), 0);
        assert_eq!(FeeRate::from_percentage(f64::NAN).bps(), 0);
        assert!((FeeRate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert!(FeeRate::default().is_zero());
    }
}
