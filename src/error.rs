//! Error taxonomy shared across the PnL engine and the transaction preparer.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the core. Each carries a machine-readable kind plus a
/// human-readable message; internal store errors are wrapped so no
/// store-level identifiers leak into the public payload.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed address, bad signature format, invalid slippage or
    /// strategy value. Terminal.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Position or user absent. Terminal.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller does not own the position. Terminal; the message never
    /// names the true owner.
    #[error("Caller does not own this position")]
    OwnershipMismatch,

    /// Ownership-proof timestamp outside the freshness window. Terminal.
    #[error("Signature expired: timestamp is {age_secs}s old (max {max_secs}s)")]
    SignatureExpired { age_secs: i64, max_secs: i64 },

    /// Ownership-proof signature did not verify. Terminal.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Too many prepared transactions in the window. Terminal but the
    /// caller may retry after the window passes.
    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: i64 },

    /// Transaction simulation failed. Non-terminal: the preparer degrades
    /// to a conservative fixed estimate.
    #[error("Simulation failed: {0}")]
    SimulationFailed(String),

    /// The position account no longer exists on chain. Expected once a
    /// position enters the closing transition.
    #[error("Position not on chain: {0}")]
    PositionNotOnChain(String),

    /// Chain or oracle read failed. Non-terminal per item during batch PnL.
    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),

    #[error("Store error")]
    Store(#[from] sqlx::Error),
}

impl CoreError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_error",
            CoreError::NotFound(_) => "not_found",
            CoreError::OwnershipMismatch => "ownership_mismatch",
            CoreError::SignatureExpired { .. } => "signature_expired",
            CoreError::InvalidSignature => "invalid_signature",
            CoreError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            CoreError::SimulationFailed(_) => "simulation_failed",
            CoreError::PositionNotOnChain(_) => "position_not_on_chain",
            CoreError::ChainUnavailable(_) => "chain_unavailable",
            CoreError::Store(_) => "store_error",
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::RateLimitExceeded { .. } | CoreError::ChainUnavailable(_)
        )
    }

    /// Serializable payload for callers. Store errors are reported without
    /// their underlying detail.
    pub fn to_payload(&self) -> ErrorPayload {
        let message = match self {
            CoreError::Store(_) => "Internal storage error".to_string(),
            other => other.to_string(),
        };
        ErrorPayload {
            kind: self.kind(),
            message,
            details: None,
        }
    }
}

/// Public error shape handed to the web/bot layers.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
