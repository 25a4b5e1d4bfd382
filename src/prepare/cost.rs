//! Advisory transaction cost estimation.
//!
//! Simulation gives real compute-unit consumption when it works; when it
//! does not, a conservative fixed estimate keeps the preparation flow
//! alive. The only hard failure here is a caller-supplied cost ceiling.

use crate::chain::ChainReader;
use crate::error::CoreError;
use solana_sdk::message::Message;
use std::sync::Arc;
use tracing::warn;

/// Flat per-signature base fee, in lamports.
const BASE_FEE_LAMPORTS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostEstimate {
    pub compute_units: u64,
    /// Micro-lamports per compute unit.
    pub priority_fee: u64,
    pub total_lamports: u64,
    /// False when either simulation or the fee lookup fell back to a
    /// default; the estimate is then conservative rather than measured.
    pub simulated: bool,
}

pub struct CostEstimator {
    chain: Arc<dyn ChainReader>,
    fallback_compute_units: u64,
}

impl CostEstimator {
    pub fn new(chain: Arc<dyn ChainReader>, fallback_compute_units: u64) -> Self {
        Self {
            chain,
            fallback_compute_units,
        }
    }

    /// Estimate the cost of executing `message`.
    pub async fn estimate(&self, message: &Message) -> Result<CostEstimate, CoreError> {
        let (compute_units, simulated) = match self.chain.simulate(message).await {
            Ok(units) => (units, true),
            Err(err) => {
                warn!(error = %err, "simulation failed, using fallback compute units");
                (self.fallback_compute_units, false)
            }
        };

        let (priority_fee, fee_measured) = match self.chain.recent_prioritization_fee().await {
            Ok(fee) => (fee, true),
            Err(err) => {
                warn!(error = %err, "prioritization fee lookup failed, assuming zero");
                (0, false)
            }
        };

        let priority_lamports = compute_units.saturating_mul(priority_fee) / 1_000_000;
        Ok(CostEstimate {
            compute_units,
            priority_fee,
            total_lamports: BASE_FEE_LAMPORTS + priority_lamports,
            simulated: simulated && fee_measured,
        })
    }
}

/// Reject an estimate exceeding a caller-supplied ceiling.
pub fn check_max_cost(estimate: &CostEstimate, max_lamports: Option<u64>) -> Result<(), CoreError> {
    if let Some(max) = max_lamports {
        if estimate.total_lamports > max {
            return Err(CoreError::Validation(format!(
                "estimated cost {} lamports exceeds maximum {}",
                estimate.total_lamports, max
            )));
        }
    }
    Ok(())
}
