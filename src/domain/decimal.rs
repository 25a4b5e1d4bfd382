//! Lossless decimal numeric type backed by rust_decimal.
//!
//! All financial arithmetic in the crate goes through this wrapper so that
//! snapshot diffs and PnL sums never accumulate floating-point drift.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for financial calculations.
///
/// Serializes to a JSON number (not a string) by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format as a canonical string without exponent notation or trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    pub fn from_i64(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for s in ["123.456", "0.0001", "-43", "0", "999999999.999999999"] {
            let d = Decimal::from_str_canonical(s).expect("parse failed");
            let reparsed = Decimal::from_str_canonical(&d.to_canonical_string()).unwrap();
            assert_eq!(d, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Decimal::from_str_canonical("10.5").unwrap();
        let b = Decimal::from_str_canonical("2.5").unwrap();
        assert_eq!((a + b).to_canonical_string(), "13");
        assert_eq!((a - b).to_canonical_string(), "8");
        assert_eq!((a * b).to_canonical_string(), "26.25");
        assert_eq!((a / b).to_canonical_string(), "4.2");
    }

    #[test]
    fn test_sum() {
        let total: Decimal = ["1.5", "2.5", "-1"]
            .iter()
            .map(|s| Decimal::from_str_canonical(s).unwrap())
            .sum();
        assert_eq!(total.to_canonical_string(), "3");
    }

    #[test]
    fn test_json_number_serialization() {
        let d = Decimal::from_str_canonical("123.456").unwrap();
        let json = serde_json::to_value(d).unwrap();
        assert!(json.is_number());
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Decimal::from_i64(5).is_positive());
        assert!(Decimal::from_i64(-5).is_negative());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
    }
}
