//! PnL result records produced by the aggregator.

use super::{Decimal, FeesBreakdown, PositionSnapshot, PositionStatus, TokenAmount, TokenSymbol, UsdValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Impermanent loss measured empirically from snapshots.
///
/// Positive means the position underperformed simply holding the deposited
/// quantities. Never persisted as ground truth; always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpermanentLoss {
    pub usd: UsdValue,
    pub percent: Decimal,
}

impl ImpermanentLoss {
    pub fn zero() -> Self {
        ImpermanentLoss {
            usd: UsdValue::zero(),
            percent: Decimal::zero(),
        }
    }
}

/// One reward stream earning attributed to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEarning {
    pub token_symbol: TokenSymbol,
    pub amount: TokenAmount,
    pub usd_value: UsdValue,
}

/// Complete PnL accounting for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlResult {
    pub position_id: Uuid,
    pub status: PositionStatus,
    pub deposit_value_usd: UsdValue,
    pub current_value_usd: UsdValue,
    pub realized_pnl_usd: UsdValue,
    pub realized_pnl_percent: Decimal,
    pub impermanent_loss: ImpermanentLoss,
    pub fees_earned_usd: UsdValue,
    pub rewards_earned_usd: UsdValue,
    pub deposit_snapshot: PositionSnapshot,
    pub current_snapshot: PositionSnapshot,
    pub fees: FeesBreakdown,
    pub rewards: Vec<RewardEarning>,
    /// True when a live chain read failed and the result was rebuilt from
    /// the position's last-known stored aggregates.
    #[serde(default)]
    pub fallback: bool,
}

/// Wallet-level rollup: one entry per position, open positions first, then
/// by PnL descending. Aggregates are plain sums over the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletPnlResult {
    pub wallet_address: super::Address,
    pub positions: Vec<PnlResult>,
    pub total_deposit_value_usd: UsdValue,
    pub total_current_value_usd: UsdValue,
    pub total_pnl_usd: UsdValue,
    pub total_fees_earned_usd: UsdValue,
    pub total_rewards_earned_usd: UsdValue,
    pub open_positions: usize,
    pub closed_positions: usize,
}
