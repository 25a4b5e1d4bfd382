//! Reposition history entries, chains, and pending-transaction intents.

use super::{Address, TimeMs, UsdValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a reposition was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositionReason {
    OutOfRange,
    Manual,
    Scheduled,
}

impl RepositionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositionReason::OutOfRange => "out_of_range",
            RepositionReason::Manual => "manual",
            RepositionReason::Scheduled => "scheduled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "out_of_range" => Some(RepositionReason::OutOfRange),
            "manual" => Some(RepositionReason::Manual),
            "scheduled" => Some(RepositionReason::Scheduled),
            _ => None,
        }
    }
}

/// Inclusive bin id range of a DLMM position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinRange {
    pub min_bin_id: i32,
    pub max_bin_id: i32,
}

impl BinRange {
    pub fn new(min_bin_id: i32, max_bin_id: i32) -> Self {
        BinRange {
            min_bin_id,
            max_bin_id,
        }
    }

    pub fn contains(&self, bin_id: i32) -> bool {
        bin_id >= self.min_bin_id && bin_id <= self.max_bin_id
    }

    /// How many bins outside the range a bin id sits (0 when inside).
    pub fn distance_from(&self, bin_id: i32) -> i32 {
        if bin_id < self.min_bin_id {
            self.min_bin_id - bin_id
        } else if bin_id > self.max_bin_id {
            bin_id - self.max_bin_id
        } else {
            0
        }
    }
}

/// Edge in a reposition chain: one old position superseded by a new one.
/// Created exactly once per reposition and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositionHistoryEntry {
    pub id: Uuid,
    pub wallet_address: Address,
    pub old_position_address: Address,
    pub new_position_address: Address,
    pub reason: RepositionReason,
    pub range_before: BinRange,
    pub range_after: BinRange,
    /// Bins between the active bin and the old range at trigger time.
    pub distance_from_range: i32,
    pub liquidity_recovered_usd: UsdValue,
    pub fees_recovered_usd: UsdValue,
    /// Gas spent on the reposition, in lamports.
    pub gas_cost_lamports: u64,
    pub transaction_signature: Option<String>,
    pub timestamp: TimeMs,
}

/// Full reposition history of one economic position: every entry reachable
/// from a starting address, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionChain {
    pub entries: Vec<RepositionHistoryEntry>,
    /// Number of positions in the chain (entries + 1 for the original).
    pub chain_length: usize,
    pub total_fees_recovered_usd: UsdValue,
    pub total_gas_lamports: u64,
    /// The live end of the chain: the new address of the latest entry.
    pub terminal_position: Address,
}

/// Wallet-level reposition statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositionStats {
    pub wallet_address: Address,
    pub total_repositions: usize,
    pub out_of_range_count: usize,
    pub manual_count: usize,
    pub scheduled_count: usize,
    pub total_fees_recovered_usd: UsdValue,
    pub total_gas_lamports: u64,
    /// The 10 most recent entries, newest first.
    pub recent: Vec<RepositionHistoryEntry>,
}

/// Single-use, time-boxed intent to execute a specific unsigned transaction.
///
/// A row exists purely so a client can prove which exact bytes it is about
/// to sign, and so preparations per wallet can be rate limited. It never
/// observes whether the transaction was broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// sha256 hex of the serialized transaction message. Unique.
    pub tx_hash: String,
    pub wallet_address: Address,
    pub position_address: Address,
    pub created_at: TimeMs,
    pub expires_at: TimeMs,
    pub executed: bool,
}

impl PendingTransaction {
    pub fn is_expired(&self, now: TimeMs) -> bool {
        now > self.expires_at
    }
}
