//! Reposition transaction preparation.
//!
//! A sequence of hard gates guards construction of the unsigned
//! remove-and-close transaction: ownership proof, address validation,
//! store-backed rate limiting, live ownership check, cost estimation,
//! strategy and range selection, slippage bounds, transaction
//! construction, and finally intent registration. Failure at any gate is
//! terminal for the call; the PendingTransaction row is written only
//! after every prior gate has passed.

use crate::chain::{ChainReader, PriceOracle};
use crate::config::Config;
use crate::db::Repository;
use crate::domain::{
    Address, BasisPoints, BinRange, PendingTransaction, TimeMs, UsdValue,
};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub mod auth;
pub mod builder;
pub mod cost;
pub mod slippage;
pub mod strategy;

pub use cost::CostEstimate;
pub use slippage::SlippageBounds;
pub use strategy::Strategy;

/// A caller's request to prepare a reposition of one position.
#[derive(Debug, Clone, Deserialize)]
pub struct PrepareRequest {
    pub wallet_address: Address,
    pub position_address: Address,
    /// Timestamp the ownership proof was signed over.
    pub timestamp: TimeMs,
    /// Base58 signature over the canonical ownership message.
    pub signature: String,
    pub strategy: Option<Strategy>,
    pub slippage_bps: Option<u16>,
    pub max_cost_lamports: Option<u64>,
}

/// Everything the caller needs to review and sign.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedTransaction {
    /// Base64 serialized unsigned transaction message.
    pub serialized_transaction: String,
    /// sha256 hex of the message bytes. The caller must re-derive this
    /// from the bytes before signing; a mismatch means the bytes were
    /// altered in transit.
    pub tx_hash: String,
    pub metadata: RepositionMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositionMetadata {
    pub position_address: Address,
    pub pool_address: Address,
    pub wallet_address: Address,
    pub estimated_liquidity_usd: UsdValue,
    pub new_bin_range: BinRange,
    pub strategy: Strategy,
    pub estimated_cost_lamports: u64,
    pub slippage: SlippageBounds,
    pub expires_at: TimeMs,
}

/// Prepares unsigned reposition transactions behind the gate sequence.
pub struct RepositionPreparer {
    repo: Arc<Repository>,
    chain: Arc<dyn ChainReader>,
    oracle: Arc<dyn PriceOracle>,
    estimator: cost::CostEstimator,
    config: Config,
}

impl RepositionPreparer {
    pub fn new(
        repo: Arc<Repository>,
        chain: Arc<dyn ChainReader>,
        oracle: Arc<dyn PriceOracle>,
        config: Config,
    ) -> Self {
        let estimator = cost::CostEstimator::new(chain.clone(), config.fallback_compute_units);
        Self {
            repo,
            chain,
            oracle,
            estimator,
            config,
        }
    }

    /// Run the full gate sequence and return an unsigned transaction plus
    /// its registered intent.
    pub async fn prepare(&self, request: PrepareRequest) -> Result<PreparedTransaction, CoreError> {
        let now = TimeMs::now();

        // Ownership proof, freshness first.
        auth::verify_ownership_proof(
            &request.wallet_address,
            &request.position_address,
            request.timestamp,
            &request.signature,
            now,
            self.config.signature_max_age_secs,
        )?;

        // Address validation. The wallet already parsed during proof
        // verification; the position address has not.
        if !request.position_address.is_well_formed() {
            return Err(CoreError::Validation(format!(
                "malformed position address: {}",
                request.position_address
            )));
        }

        // Store-backed fixed-window rate limit, consistent across replicas.
        let window_start = now.minus_secs(self.config.rate_limit_window_secs);
        let recent = self
            .repo
            .count_pending_transactions(&request.wallet_address, window_start)
            .await?;
        if recent >= self.config.rate_limit_max {
            return Err(CoreError::RateLimitExceeded {
                retry_after_secs: self.config.rate_limit_window_secs,
            });
        }

        // Stored record plus live ownership check.
        let position = self
            .repo
            .find_position(&request.position_address)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "position {} is not tracked",
                    request.position_address
                ))
            })?;
        let owner = self.chain.position_owner(&request.position_address).await?;
        if owner != request.wallet_address {
            return Err(CoreError::OwnershipMismatch);
        }

        // Current holdings and pool state, needed from here on.
        let totals = self.chain.position_totals(&request.position_address).await?;
        let active = self.chain.active_bin(&position.pool_address).await?;
        let price_x = self.oracle.usd_price(&position.token_x_symbol).await?;
        let price_y = self.oracle.usd_price(&position.token_y_symbol).await?;
        let value_x = totals.token_x_amount * price_x;
        let value_y = totals.token_y_amount * price_y;

        // Construct the transaction early so cost estimation simulates the
        // exact message the caller will sign.
        let blockhash = self.chain.latest_blockhash().await?;
        let unsigned = builder::build_unsigned(
            &request.wallet_address,
            &request.position_address,
            &position.pool_address,
            blockhash,
        )?;

        // Advisory cost estimate, hard only against a caller ceiling.
        let estimate = self.estimator.estimate(&unsigned.message).await?;
        cost::check_max_cost(&estimate, request.max_cost_lamports)?;

        // Strategy and replacement range.
        let chosen_strategy = request
            .strategy
            .unwrap_or_else(|| strategy::select_strategy(value_x, value_y));
        let new_bin_range = strategy::select_bin_range(active.bin_id, chosen_strategy);

        // Slippage bounds for the caller to enforce at submission.
        let tolerance = match request.slippage_bps {
            Some(bps) => slippage::validate_bps(bps)?,
            None => BasisPoints::new(self.config.default_slippage_bps),
        };
        let bounds = slippage::compute(
            totals.token_x_amount,
            totals.token_y_amount,
            active.price,
            tolerance,
        );

        // Intent registration: the only persisted effect of this call.
        let expires_at = now.plus_secs(self.config.intent_ttl_secs);
        let pending = PendingTransaction {
            tx_hash: unsigned.tx_hash.clone(),
            wallet_address: request.wallet_address.clone(),
            position_address: request.position_address.clone(),
            created_at: now,
            expires_at,
            executed: false,
        };
        self.repo.insert_pending_transaction(&pending).await?;

        info!(
            position = %request.position_address,
            wallet = %request.wallet_address,
            tx_hash = %unsigned.tx_hash,
            strategy = chosen_strategy.as_str(),
            "prepared reposition transaction"
        );

        Ok(PreparedTransaction {
            serialized_transaction: unsigned.serialized,
            tx_hash: unsigned.tx_hash,
            metadata: RepositionMetadata {
                position_address: request.position_address,
                pool_address: position.pool_address,
                wallet_address: request.wallet_address,
                estimated_liquidity_usd: value_x + value_y,
                new_bin_range,
                strategy: chosen_strategy,
                estimated_cost_lamports: estimate.total_lamports,
                slippage: bounds,
                expires_at,
            },
        })
    }
}
