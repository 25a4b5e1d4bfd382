//! Reposition chain traversal and wallet-level reposition statistics.

use crate::db::Repository;
use crate::domain::{Address, PositionChain, RepositionReason, RepositionStats, UsdValue};
use crate::error::CoreError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const RECENT_ENTRIES: usize = 10;

/// Walks reposition edges to reconstruct the full history of an economic
/// position across every address it has occupied.
#[derive(Clone)]
pub struct PositionChainTracker {
    repo: Arc<Repository>,
}

impl PositionChainTracker {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Full reposition chain containing the given address, or `None` when
    /// the address was never part of a reposition.
    ///
    /// Traversal is an iterative breadth-first walk: each round bulk-loads
    /// every entry touching the current frontier of unvisited addresses,
    /// then expands the frontier with addresses those entries introduce.
    /// A visited set makes cyclic data terminate instead of looping.
    pub async fn chain(&self, address: &Address) -> Result<Option<PositionChain>, CoreError> {
        let mut visited: HashSet<Address> = HashSet::new();
        let mut seen_entries: HashSet<uuid::Uuid> = HashSet::new();
        let mut entries = Vec::new();
        let mut frontier = vec![address.clone()];

        while !frontier.is_empty() {
            frontier.retain(|a| visited.insert(a.clone()));
            if frontier.is_empty() {
                break;
            }

            let batch = self.repo.reposition_entries_touching(&frontier).await?;
            let mut next = Vec::new();
            for entry in batch {
                if !seen_entries.insert(entry.id) {
                    continue;
                }
                for a in [&entry.old_position_address, &entry.new_position_address] {
                    if !visited.contains(a) {
                        next.push(a.clone());
                    }
                }
                entries.push(entry);
            }
            frontier = next;
        }

        if entries.is_empty() {
            return Ok(None);
        }

        // Chronological, with the id as a deterministic tiebreak for entries
        // sharing a timestamp.
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        debug!(
            start = %address,
            entries = entries.len(),
            "resolved reposition chain"
        );

        let total_fees_recovered_usd: UsdValue =
            entries.iter().map(|e| e.fees_recovered_usd).sum();
        let total_gas_lamports = entries.iter().map(|e| e.gas_cost_lamports).sum();
        let terminal_position = entries
            .last()
            .map(|e| e.new_position_address.clone())
            .unwrap_or_else(|| address.clone());

        Ok(Some(PositionChain {
            chain_length: entries.len() + 1,
            total_fees_recovered_usd,
            total_gas_lamports,
            terminal_position,
            entries,
        }))
    }

    /// Aggregate reposition statistics for one wallet.
    pub async fn wallet_stats(&self, wallet: &Address) -> Result<RepositionStats, CoreError> {
        let entries = self.repo.reposition_entries_for_wallet(wallet).await?;

        let mut out_of_range_count = 0;
        let mut manual_count = 0;
        let mut scheduled_count = 0;
        for entry in &entries {
            match entry.reason {
                RepositionReason::OutOfRange => out_of_range_count += 1,
                RepositionReason::Manual => manual_count += 1,
                RepositionReason::Scheduled => scheduled_count += 1,
            }
        }

        Ok(RepositionStats {
            wallet_address: wallet.clone(),
            total_repositions: entries.len(),
            out_of_range_count,
            manual_count,
            scheduled_count,
            total_fees_recovered_usd: entries.iter().map(|e| e.fees_recovered_usd).sum(),
            total_gas_lamports: entries.iter().map(|e| e.gas_cost_lamports).sum(),
            recent: entries.into_iter().take(RECENT_ENTRIES).collect(),
        })
    }
}
