//! Position record and value snapshots.

use super::{Address, Decimal, TimeMs, TokenAmount, TokenSymbol, UsdPrice, UsdValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One open-or-closed liquidity position.
///
/// Entry fields are write-once at creation; withdrawal fields are write-once
/// at close. A closed position (`is_active == false`) is terminal: no field
/// changes afterward except through a reposition chain link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Stable identifier, assigned at creation.
    pub id: Uuid,
    /// On-chain position account address.
    pub address: Address,
    /// Pool (LbPair) address the position provides liquidity to.
    pub pool_address: Address,
    /// Owning wallet.
    pub wallet_address: Address,
    pub token_x_symbol: TokenSymbol,
    pub token_y_symbol: TokenSymbol,
    /// Token amounts at deposit time. Never mutated.
    pub deposit_amount_x: TokenAmount,
    pub deposit_amount_y: TokenAmount,
    /// Prices recorded at deposit time. Legacy records may lack the tokenY
    /// price; the snapshot provider falls back to the current oracle price
    /// and flags the snapshot approximate.
    pub deposit_price_x: UsdPrice,
    pub deposit_price_y: Option<UsdPrice>,
    pub created_at: TimeMs,
    pub is_active: bool,
    pub closed_at: Option<TimeMs>,
    /// Withdrawal amounts/prices, set once at close.
    pub withdraw_amount_x: Option<TokenAmount>,
    pub withdraw_amount_y: Option<TokenAmount>,
    pub withdraw_price_x: Option<UsdPrice>,
    pub withdraw_price_y: Option<UsdPrice>,
    /// Unclaimed fee amounts captured in the withdrawal snapshot at close.
    pub withdraw_fee_x: Option<TokenAmount>,
    pub withdraw_fee_y: Option<TokenAmount>,
    /// Cumulative USD value of fees claimed while the position was open.
    /// Maintained by the fee-claim recording flow; used as the last-known
    /// aggregate when a live read fails.
    pub claimed_fee_usd: UsdValue,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.is_active
    }
}

/// One side (token X or token Y) of a value snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenSideSnapshot {
    pub amount: TokenAmount,
    pub price: UsdPrice,
    pub usd_value: UsdValue,
}

impl TokenSideSnapshot {
    pub fn new(amount: TokenAmount, price: UsdPrice) -> Self {
        TokenSideSnapshot {
            amount,
            price,
            usd_value: amount * price,
        }
    }
}

/// Point-in-time valuation of a position: amounts, prices, and USD values
/// for both tokens. Always derived, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub token_x: TokenSideSnapshot,
    pub token_y: TokenSideSnapshot,
    pub timestamp: TimeMs,
    /// True when a legacy record forced a price fallback, so the snapshot's
    /// valuation is approximate rather than reconstructed from stored prices.
    pub approximate: bool,
}

impl PositionSnapshot {
    pub fn new(token_x: TokenSideSnapshot, token_y: TokenSideSnapshot, timestamp: TimeMs) -> Self {
        PositionSnapshot {
            token_x,
            token_y,
            timestamp,
            approximate: false,
        }
    }

    pub fn approximate(mut self) -> Self {
        self.approximate = true;
        self
    }

    /// Combined USD value of both sides.
    pub fn total_usd(&self) -> UsdValue {
        self.token_x.usd_value + self.token_y.usd_value
    }

    /// What the snapshotted token quantities would be worth at the prices of
    /// another snapshot. This is the hold-value leg of the impermanent-loss
    /// comparison.
    pub fn value_at_prices_of(&self, other: &PositionSnapshot) -> UsdValue {
        self.token_x.amount * other.token_x.price + self.token_y.amount * other.token_y.price
    }
}

/// Whether a position is open or closed, as reported in PnL results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn of(position: &Position) -> Self {
        if position.is_open() {
            PositionStatus::Open
        } else {
            PositionStatus::Closed
        }
    }
}

/// Builder-style constructor for new positions, used by the deposit flow and
/// tests. Withdrawal fields start unset.
impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        address: Address,
        pool_address: Address,
        wallet_address: Address,
        token_x_symbol: TokenSymbol,
        token_y_symbol: TokenSymbol,
        deposit_amount_x: TokenAmount,
        deposit_amount_y: TokenAmount,
        deposit_price_x: UsdPrice,
        deposit_price_y: Option<UsdPrice>,
        created_at: TimeMs,
    ) -> Self {
        Position {
            id: Uuid::new_v4(),
            address,
            pool_address,
            wallet_address,
            token_x_symbol,
            token_y_symbol,
            deposit_amount_x,
            deposit_amount_y,
            deposit_price_x,
            deposit_price_y,
            created_at,
            is_active: true,
            closed_at: None,
            withdraw_amount_x: None,
            withdraw_amount_y: None,
            withdraw_price_x: None,
            withdraw_price_y: None,
            withdraw_fee_x: None,
            withdraw_fee_y: None,
            claimed_fee_usd: UsdValue::zero(),
        }
    }
}
