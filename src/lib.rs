pub mod chain;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod prepare;

pub use chain::{
    ChainError, ChainReader, HttpPriceOracle, MockChainReader, MockPriceOracle, NoRewards,
    PriceOracle, RewardsSource, RpcChainReader,
};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Address, BasisPoints, BinRange, Decimal, PendingTransaction, PnlResult, Position,
    PositionChain, PositionSnapshot, PositionStatus, RepositionStats, TimeMs, TokenAmount,
    TokenSymbol, UsdPrice, UsdValue, WalletPnlResult,
};
pub use engine::{FeesCalculator, PnlAggregator, PositionChainTracker, SnapshotProvider};
pub use error::CoreError;
pub use prepare::{PrepareRequest, PreparedTransaction, RepositionPreparer};
