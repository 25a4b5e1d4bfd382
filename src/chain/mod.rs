//! External chain capabilities: position reads, price oracle, simulation.
//!
//! Everything the core consumes from the outside world enters through these
//! traits so that components can be constructed with deterministic fakes in
//! tests and with RPC/HTTP-backed implementations in production.

use crate::domain::{Address, Position, RewardEarning, TokenAmount, TokenSymbol, UsdPrice};
use crate::error::CoreError;
use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use std::fmt;

pub mod http_oracle;
pub mod mock;
pub mod rpc;

pub use http_oracle::HttpPriceOracle;
pub use mock::{MockChainReader, MockPriceOracle};
pub use rpc::RpcChainReader;

/// Aggregate on-chain totals for one position, already summed across bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTotals {
    pub token_x_amount: TokenAmount,
    pub token_y_amount: TokenAmount,
    pub unclaimed_fee_x: TokenAmount,
    pub unclaimed_fee_y: TokenAmount,
}

/// The bin currently containing the pool's trading price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveBin {
    pub bin_id: i32,
    pub price: UsdPrice,
    pub bin_step: u16,
}

/// Error type for chain and oracle capabilities.
#[derive(Debug, Clone)]
pub enum ChainError {
    /// The position account no longer exists. Expected for positions in the
    /// closing transition; callers must not substitute stale data.
    PositionNotOnChain(String),
    /// RPC-level failure (connection, timeout, node error).
    Rpc(String),
    /// Transaction simulation returned an error.
    SimulationFailed(String),
    /// Price oracle failure or unknown symbol.
    Oracle(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::PositionNotOnChain(addr) => {
                write!(f, "Position not on chain: {}", addr)
            }
            ChainError::Rpc(msg) => write!(f, "RPC error: {}", msg),
            ChainError::SimulationFailed(msg) => write!(f, "Simulation failed: {}", msg),
            ChainError::Oracle(msg) => write!(f, "Oracle error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<ChainError> for CoreError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::PositionNotOnChain(addr) => CoreError::PositionNotOnChain(addr),
            ChainError::Rpc(msg) => CoreError::ChainUnavailable(msg),
            ChainError::SimulationFailed(msg) => CoreError::SimulationFailed(msg),
            ChainError::Oracle(msg) => CoreError::ChainUnavailable(msg),
        }
    }
}

/// Read capabilities over the on-chain liquidity program.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Aggregate token and unclaimed-fee totals for a position.
    ///
    /// # Errors
    /// `PositionNotOnChain` when the account has been closed.
    async fn position_totals(&self, position: &Address) -> Result<PositionTotals, ChainError>;

    /// The wallet that owns a position account.
    async fn position_owner(&self, position: &Address) -> Result<Address, ChainError>;

    /// The pool's active bin, its price, and the bin step.
    async fn active_bin(&self, pool: &Address) -> Result<ActiveBin, ChainError>;

    /// Simulate an unsigned transaction message; returns consumed compute
    /// units. Advisory: callers degrade on failure rather than abort.
    async fn simulate(&self, message: &Message) -> Result<u64, ChainError>;

    /// Median prioritization fee over recent blocks, micro-lamports per
    /// compute unit.
    async fn recent_prioritization_fee(&self) -> Result<u64, ChainError>;

    /// A fresh blockhash bounding the transaction's on-chain validity.
    async fn latest_blockhash(&self) -> Result<Hash, ChainError>;
}

/// USD price lookup by token symbol.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn usd_price(&self, symbol: &TokenSymbol) -> Result<UsdPrice, ChainError>;
}

/// Pluggable reward-stream earnings for a position.
#[async_trait]
pub trait RewardsSource: Send + Sync {
    async fn rewards(&self, position: &Position) -> Result<Vec<RewardEarning>, ChainError>;
}

/// Default rewards source for pools with no active reward stream: an
/// explicit no-op, not an error.
#[derive(Debug, Clone, Default)]
pub struct NoRewards;

#[async_trait]
impl RewardsSource for NoRewards {
    async fn rewards(&self, _position: &Position) -> Result<Vec<RewardEarning>, ChainError> {
        Ok(Vec::new())
    }
}
