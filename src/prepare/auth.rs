//! Ownership proof verification for reposition preparation.
//!
//! The caller proves control of a wallet by signing a canonical message
//! binding the position address and a timestamp. Freshness is checked
//! before the signature so an expired proof is reported as expired even
//! when the signature itself is garbage.

use crate::domain::{Address, TimeMs};
use crate::error::CoreError;
use solana_sdk::signature::Signature;
use std::str::FromStr;

/// The canonical message a wallet signs to authorize preparing a
/// reposition of one specific position.
pub fn ownership_message(position: &Address, timestamp: TimeMs) -> String {
    format!("reposition:{}:{}", position, timestamp.as_i64())
}

/// Verify a caller's ownership proof.
///
/// # Errors
/// - `SignatureExpired` when the timestamp is outside the freshness window
///   (in either direction, so clock-skewed future timestamps also fail).
/// - `Validation` when the wallet address or signature is malformed.
/// - `InvalidSignature` when the signature does not verify against the
///   wallet's public key.
pub fn verify_ownership_proof(
    wallet: &Address,
    position: &Address,
    timestamp: TimeMs,
    signature: &str,
    now: TimeMs,
    max_age_secs: i64,
) -> Result<(), CoreError> {
    let age_ms = now.abs_diff(timestamp);
    if age_ms > max_age_secs * 1000 {
        return Err(CoreError::SignatureExpired {
            age_secs: age_ms / 1000,
            max_secs: max_age_secs,
        });
    }

    let pubkey = wallet
        .to_pubkey()
        .map_err(|_| CoreError::Validation(format!("malformed wallet address: {}", wallet)))?;
    let signature = Signature::from_str(signature)
        .map_err(|_| CoreError::Validation("malformed signature".to_string()))?;

    let message = ownership_message(position, timestamp);
    if !signature.verify(pubkey.as_ref(), message.as_bytes()) {
        return Err(CoreError::InvalidSignature);
    }
    Ok(())
}
