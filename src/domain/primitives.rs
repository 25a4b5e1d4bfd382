//! Domain primitives: TimeMs, Address, TokenSymbol, and the semantic
//! numeric wrappers (TokenAmount, UsdPrice, UsdValue, BasisPoints).
//!
//! Amounts, prices, and USD values are distinct types on purpose: the only
//! way to turn a token amount into dollars is to multiply it by a price,
//! which keeps unit-confusion bugs out of the accounting code.

use super::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Absolute distance to another timestamp, in milliseconds.
    pub fn abs_diff(&self, other: TimeMs) -> i64 {
        (self.0 - other.0).abs()
    }

    pub fn plus_secs(&self, secs: i64) -> TimeMs {
        TimeMs(self.0 + secs * 1000)
    }

    pub fn minus_secs(&self, secs: i64) -> TimeMs {
        TimeMs(self.0 - secs * 1000)
    }
}

/// On-chain address (base58-encoded public key), used for wallets,
/// positions, and pools.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a Solana public key.
    ///
    /// # Errors
    /// Returns an error if the string is not a well-formed base58 pubkey.
    pub fn to_pubkey(&self) -> Result<Pubkey, solana_sdk::pubkey::ParsePubkeyError> {
        Pubkey::from_str(&self.0)
    }

    /// Whether the string is a well-formed base58 public key.
    pub fn is_well_formed(&self) -> bool {
        self.to_pubkey().is_ok()
    }
}

impl From<Pubkey> for Address {
    fn from(key: Pubkey) -> Self {
        Address(key.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token symbol (e.g. "SOL", "USDC"), used as the price-oracle lookup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenSymbol(pub String);

impl TokenSymbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        TokenSymbol(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quantity of one token, in UI units (not raw lamport-scale integers).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAmount(pub Decimal);

impl TokenAmount {
    pub fn new(value: Decimal) -> Self {
        TokenAmount(value)
    }

    pub fn zero() -> Self {
        TokenAmount(Decimal::zero())
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Scale by a dimensionless factor (e.g. a slippage multiplier).
    pub fn scale(&self, factor: Decimal) -> TokenAmount {
        TokenAmount(self.0 * factor)
    }
}

impl std::ops::Add for TokenAmount {
    type Output = TokenAmount;

    fn add(self, rhs: TokenAmount) -> TokenAmount {
        TokenAmount(self.0 + rhs.0)
    }
}

impl std::ops::Mul<UsdPrice> for TokenAmount {
    type Output = UsdValue;

    fn mul(self, price: UsdPrice) -> UsdValue {
        UsdValue(self.0 * price.0)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A USD price for one unit of a token.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UsdPrice(pub Decimal);

impl UsdPrice {
    pub fn new(value: Decimal) -> Self {
        UsdPrice(value)
    }

    pub fn zero() -> Self {
        UsdPrice(Decimal::zero())
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Scale by a dimensionless factor (e.g. a slippage band edge).
    pub fn scale(&self, factor: Decimal) -> UsdPrice {
        UsdPrice(self.0 * factor)
    }
}

impl fmt::Display for UsdPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A USD-denominated value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UsdValue(pub Decimal);

impl UsdValue {
    pub fn new(value: Decimal) -> Self {
        UsdValue(value)
    }

    pub fn zero() -> Self {
        UsdValue(Decimal::zero())
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// This value as a percentage of `base`, or zero if `base` is zero.
    pub fn percent_of(&self, base: UsdValue) -> Decimal {
        if base.0.is_zero() {
            Decimal::zero()
        } else {
            self.0 / base.0 * Decimal::hundred()
        }
    }
}

impl std::ops::Add for UsdValue {
    type Output = UsdValue;

    fn add(self, rhs: UsdValue) -> UsdValue {
        UsdValue(self.0 + rhs.0)
    }
}

impl std::ops::Sub for UsdValue {
    type Output = UsdValue;

    fn sub(self, rhs: UsdValue) -> UsdValue {
        UsdValue(self.0 - rhs.0)
    }
}

impl std::iter::Sum for UsdValue {
    fn sum<I: Iterator<Item = UsdValue>>(iter: I) -> UsdValue {
        iter.fold(UsdValue::zero(), |acc, v| acc + v)
    }
}

impl fmt::Display for UsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slippage tolerance in basis points (1 bps = 0.01%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisPoints(pub u16);

impl BasisPoints {
    pub const MAX: u16 = 10_000;

    pub fn new(bps: u16) -> Self {
        BasisPoints(bps)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// The tolerance as a fraction of one (50 bps -> 0.005).
    pub fn fraction(&self) -> Decimal {
        Decimal::from_i64(self.0 as i64) / Decimal::from_i64(10_000)
    }

    /// `1 - fraction`, the multiplier applied to current amounts to get
    /// minimum acceptable outputs.
    pub fn min_output_factor(&self) -> Decimal {
        Decimal::from_i64(1) - self.fraction()
    }

    /// `1 + fraction`, the upper edge of the acceptable price band.
    pub fn max_price_factor(&self) -> Decimal {
        Decimal::from_i64(1) + self.fraction()
    }
}
