//! Fee earnings breakdown.

use super::{TokenAmount, UsdValue};
use serde::{Deserialize, Serialize};

/// Fee totals for one token side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenFees {
    /// Unclaimed fee amount at the valuation point, in token units.
    pub amount: TokenAmount,
    /// USD value of historical claims, at claim-time prices.
    pub claimed_usd: UsdValue,
    /// USD value of the unclaimed amount, at the valuation-point price.
    pub unclaimed_usd: UsdValue,
}

/// Per-token claimed and unclaimed fee value for one position.
///
/// Claimed totals are a fold over the fee-claim transaction log; amounts read
/// from the chain and the store are non-negative, so the totals never go
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeesBreakdown {
    pub token_x: TokenFees,
    pub token_y: TokenFees,
}

impl FeesBreakdown {
    pub fn zero() -> Self {
        let empty = TokenFees {
            amount: TokenAmount::zero(),
            claimed_usd: UsdValue::zero(),
            unclaimed_usd: UsdValue::zero(),
        };
        FeesBreakdown {
            token_x: empty,
            token_y: empty,
        }
    }

    /// Total fee earnings in USD: claimed plus unclaimed, both sides.
    pub fn total_usd(&self) -> UsdValue {
        self.token_x.claimed_usd
            + self.token_x.unclaimed_usd
            + self.token_y.claimed_usd
            + self.token_y.unclaimed_usd
    }
}
