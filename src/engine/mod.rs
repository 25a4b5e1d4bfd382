//! Financial accounting engine: snapshots, fees, impermanent loss, PnL
//! rollups, and reposition chain tracking.

pub mod chain_tracker;
pub mod fees;
pub mod impermanent_loss;
pub mod pnl;
pub mod snapshot;

pub use chain_tracker::PositionChainTracker;
pub use fees::FeesCalculator;
pub use pnl::PnlAggregator;
pub use snapshot::SnapshotProvider;
