//! Typed data model for positions, snapshots, fees, and reposition records.

pub mod decimal;
pub mod fees;
pub mod pnl;
pub mod position;
pub mod primitives;
pub mod reposition;
pub mod transaction;

pub use decimal::Decimal;
pub use fees::{FeesBreakdown, TokenFees};
pub use pnl::{ImpermanentLoss, PnlResult, RewardEarning, WalletPnlResult};
pub use position::{Position, PositionSnapshot, PositionStatus, TokenSideSnapshot};
pub use primitives::{Address, BasisPoints, TimeMs, TokenAmount, TokenSymbol, UsdPrice, UsdValue};
pub use reposition::{
    BinRange, PendingTransaction, PositionChain, RepositionHistoryEntry, RepositionReason,
    RepositionStats,
};
pub use transaction::{TransactionRecord, TransactionType};
