use dlmm_ledger::db::init_db;
use dlmm_ledger::domain::{
    Address, BinRange, Decimal, RepositionHistoryEntry, RepositionReason, TimeMs, UsdValue,
};
use dlmm_ledger::engine::PositionChainTracker;
use dlmm_ledger::Repository;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

async fn setup() -> (PositionChainTracker, Arc<Repository>, TempDir) {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("test.db").to_string_lossy().to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    (PositionChainTracker::new(repo.clone()), repo, temp)
}

fn entry(wallet: &str, old: &str, new: &str, ts: i64) -> RepositionHistoryEntry {
    RepositionHistoryEntry {
        id: Uuid::new_v4(),
        wallet_address: Address::new(wallet),
        old_position_address: Address::new(old),
        new_position_address: Address::new(new),
        reason: RepositionReason::OutOfRange,
        range_before: BinRange::new(0, 68),
        range_after: BinRange::new(40, 108),
        distance_from_range: 6,
        liquidity_recovered_usd: UsdValue::new(Decimal::from_i64(1_000)),
        fees_recovered_usd: UsdValue::new(Decimal::from_i64(5)),
        gas_cost_lamports: 10_000,
        transaction_signature: Some(format!("sig-{}-{}", old, new)),
        timestamp: TimeMs::new(ts),
    }
}

#[tokio::test]
async fn test_chain_is_idempotent() {
    let (tracker, repo, _temp) = setup().await;
    repo.insert_reposition_entry(&entry("w", "a", "b", 1_000))
        .await
        .unwrap();
    repo.insert_reposition_entry(&entry("w", "b", "c", 2_000))
        .await
        .unwrap();

    let first = tracker.chain(&Address::new("a")).await.unwrap().unwrap();
    let second = tracker.chain(&Address::new("a")).await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_no_history_returns_none() {
    let (tracker, _repo, _temp) = setup().await;
    assert!(tracker
        .chain(&Address::new("untouched"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_full_chain_from_middle_member() {
    let (tracker, repo, _temp) = setup().await;
    for (old, new, ts) in [("a", "b", 1_000), ("b", "c", 2_000), ("c", "d", 3_000)] {
        repo.insert_reposition_entry(&entry("w", old, new, ts))
            .await
            .unwrap();
    }

    let chain = tracker.chain(&Address::new("b")).await.unwrap().unwrap();
    assert_eq!(chain.chain_length, 4);
    assert_eq!(chain.terminal_position, Address::new("d"));
    assert_eq!(
        chain.total_fees_recovered_usd.inner().to_canonical_string(),
        "15"
    );
    assert_eq!(chain.total_gas_lamports, 30_000);

    let order: Vec<_> = chain
        .entries
        .iter()
        .map(|e| e.old_position_address.as_str())
        .collect();
    assert_eq!(order, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_unrelated_chains_stay_separate() {
    let (tracker, repo, _temp) = setup().await;
    repo.insert_reposition_entry(&entry("w", "a", "b", 1_000))
        .await
        .unwrap();
    repo.insert_reposition_entry(&entry("w", "x", "y", 1_500))
        .await
        .unwrap();

    let chain = tracker.chain(&Address::new("a")).await.unwrap().unwrap();
    assert_eq!(chain.entries.len(), 1);
    assert_eq!(chain.terminal_position, Address::new("b"));
}

#[tokio::test]
async fn test_wallet_stats_fold() {
    let (tracker, repo, _temp) = setup().await;
    let mut scheduled = entry("w", "a", "b", 1_000);
    scheduled.reason = RepositionReason::Scheduled;
    repo.insert_reposition_entry(&scheduled).await.unwrap();
    for i in 0..12 {
        repo.insert_reposition_entry(&entry(
            "w",
            &format!("p{}", i),
            &format!("p{}", i + 100),
            2_000 + i,
        ))
        .await
        .unwrap();
    }
    // Another wallet's entries must not leak in.
    repo.insert_reposition_entry(&entry("other", "m", "n", 5_000))
        .await
        .unwrap();

    let stats = tracker.wallet_stats(&Address::new("w")).await.unwrap();
    assert_eq!(stats.total_repositions, 13);
    assert_eq!(stats.scheduled_count, 1);
    assert_eq!(stats.out_of_range_count, 12);
    assert_eq!(stats.total_gas_lamports, 130_000);
    assert_eq!(stats.recent.len(), 10);
    // Newest first.
    assert_eq!(stats.recent[0].timestamp, TimeMs::new(2_011));
}
