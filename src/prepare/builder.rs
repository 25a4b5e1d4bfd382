//! Unsigned reposition transaction construction.
//!
//! Builds the instructions that remove all liquidity from a position and
//! close its account, bound to a fresh blockhash, and serializes the
//! message without requiring any signature. The sha256 of the serialized
//! message doubles as the intent key: the signer re-hashes the bytes it
//! received and refuses to sign on mismatch.

use crate::domain::Address;
use crate::error::CoreError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;

/// The DLMM program the position accounts belong to.
pub const DLMM_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo");

/// An unsigned transaction ready to hand to the caller for signing.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub message: Message,
    /// Base64 of the serialized message bytes.
    pub serialized: String,
    /// sha256 hex of the same bytes; the integrity contract with the signer.
    pub tx_hash: String,
}

/// Anchor instruction discriminator: first 8 bytes of
/// sha256("global:<instruction_name>").
fn anchor_discriminator(name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("global:{name}").as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

fn close_out_instructions(wallet: Pubkey, position: Pubkey, pool: Pubkey) -> Vec<Instruction> {
    let accounts = vec![
        AccountMeta::new(position, false),
        AccountMeta::new(pool, false),
        AccountMeta::new(wallet, true),
    ];
    vec![
        Instruction {
            program_id: DLMM_PROGRAM_ID,
            accounts: accounts.clone(),
            data: anchor_discriminator("remove_all_liquidity").to_vec(),
        },
        Instruction {
            program_id: DLMM_PROGRAM_ID,
            accounts,
            data: anchor_discriminator("close_position").to_vec(),
        },
    ]
}

/// Build the unsigned remove-and-close transaction for one position.
///
/// # Errors
/// `Validation` when any address fails to parse as a public key. Callers
/// validate addresses earlier, so this is a second line, not the primary
/// gate.
pub fn build_unsigned(
    wallet: &Address,
    position: &Address,
    pool: &Address,
    blockhash: Hash,
) -> Result<UnsignedTransaction, CoreError> {
    let wallet_pk = wallet
        .to_pubkey()
        .map_err(|_| CoreError::Validation(format!("malformed wallet address: {}", wallet)))?;
    let position_pk = position
        .to_pubkey()
        .map_err(|_| CoreError::Validation(format!("malformed position address: {}", position)))?;
    let pool_pk = pool
        .to_pubkey()
        .map_err(|_| CoreError::Validation(format!("malformed pool address: {}", pool)))?;

    let instructions = close_out_instructions(wallet_pk, position_pk, pool_pk);
    let message = Message::new_with_blockhash(&instructions, Some(&wallet_pk), &blockhash);

    let bytes = message.serialize();
    let tx_hash = hex::encode(Sha256::digest(&bytes));
    let serialized = STANDARD.encode(&bytes);

    Ok(UnsignedTransaction {
        message,
        serialized,
        tx_hash,
    })
}
