//! Append-only transaction log records.

use super::{TimeMs, TokenAmount, UsdPrice, UsdValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a logged position transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    FeeClaim,
    RewardClaim,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::FeeClaim => "fee_claim",
            TransactionType::RewardClaim => "reward_claim",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(TransactionType::Deposit),
            "withdraw" => Some(TransactionType::Withdraw),
            "fee_claim" => Some(TransactionType::FeeClaim),
            "reward_claim" => Some(TransactionType::RewardClaim),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable log entry for a position. PnL folds over these for claimed-fee
/// totals; the prices recorded here are authoritative and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub position_id: Uuid,
    pub tx_type: TransactionType,
    pub timestamp: TimeMs,
    /// On-chain signature, when known.
    pub signature: Option<String>,
    pub token_x_amount: TokenAmount,
    pub token_y_amount: TokenAmount,
    /// Prices at the time the transaction happened.
    pub token_x_price: UsdPrice,
    pub token_y_price: UsdPrice,
    pub usd_value: UsdValue,
    pub notes: Option<String>,
}

impl TransactionRecord {
    /// Build a record, deriving the USD value from amounts and prices.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position_id: Uuid,
        tx_type: TransactionType,
        timestamp: TimeMs,
        signature: Option<String>,
        token_x_amount: TokenAmount,
        token_y_amount: TokenAmount,
        token_x_price: UsdPrice,
        token_y_price: UsdPrice,
        notes: Option<String>,
    ) -> Self {
        let usd_value = token_x_amount * token_x_price + token_y_amount * token_y_price;
        TransactionRecord {
            position_id,
            tx_type,
            timestamp,
            signature,
            token_x_amount,
            token_y_amount,
            token_x_price,
            token_y_price,
            usd_value,
            notes,
        }
    }
}
