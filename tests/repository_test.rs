use dlmm_ledger::db::init_db;
use dlmm_ledger::domain::{
    Address, Decimal, PendingTransaction, Position, TimeMs, TokenAmount, TokenSymbol,
    TransactionRecord, TransactionType, UsdPrice,
};
use dlmm_ledger::Repository;
use std::sync::Arc;
use tempfile::TempDir;

async fn setup() -> (Arc<Repository>, TempDir) {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("test.db").to_string_lossy().to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp)
}

fn position(address: &str) -> Position {
    Position::open(
        Address::new(address),
        Address::new("pool1"),
        Address::new("wallet1"),
        TokenSymbol::new("SOL"),
        TokenSymbol::new("USDC"),
        TokenAmount::new(Decimal::from_i64(10)),
        TokenAmount::new(Decimal::from_i64(1_500)),
        UsdPrice::new(Decimal::from_i64(150)),
        Some(UsdPrice::new(Decimal::from_i64(1))),
        TimeMs::new(1_000),
    )
}

#[tokio::test]
async fn test_position_roundtrip() {
    let (repo, _temp) = setup().await;
    let original = position("pos1");
    repo.insert_position(&original).await.unwrap();

    let loaded = repo
        .find_position(&Address::new("pos1"))
        .await
        .unwrap()
        .expect("position should exist");
    assert_eq!(loaded, original);
}

#[tokio::test]
async fn test_legacy_position_without_deposit_price_y() {
    let (repo, _temp) = setup().await;
    let mut legacy = position("legacy");
    legacy.deposit_price_y = None;
    repo.insert_position(&legacy).await.unwrap();

    let loaded = repo
        .find_position(&Address::new("legacy"))
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.deposit_price_y.is_none());
}

#[tokio::test]
async fn test_close_position_is_write_once() {
    let (repo, _temp) = setup().await;
    repo.insert_position(&position("pos1")).await.unwrap();

    let closed = repo
        .close_position(
            &Address::new("pos1"),
            TimeMs::new(5_000),
            TokenAmount::new(Decimal::from_i64(9)),
            TokenAmount::new(Decimal::from_i64(1_400)),
            UsdPrice::new(Decimal::from_i64(140)),
            UsdPrice::new(Decimal::from_i64(1)),
            TokenAmount::zero(),
            TokenAmount::zero(),
        )
        .await
        .unwrap();
    assert!(closed);

    // A second close must not touch the stored withdrawal snapshot.
    let again = repo
        .close_position(
            &Address::new("pos1"),
            TimeMs::new(9_000),
            TokenAmount::zero(),
            TokenAmount::zero(),
            UsdPrice::zero(),
            UsdPrice::zero(),
            TokenAmount::zero(),
            TokenAmount::zero(),
        )
        .await
        .unwrap();
    assert!(!again);

    let loaded = repo
        .find_position(&Address::new("pos1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!loaded.is_open());
    assert_eq!(loaded.closed_at, Some(TimeMs::new(5_000)));
    assert_eq!(
        loaded.withdraw_amount_x,
        Some(TokenAmount::new(Decimal::from_i64(9)))
    );
}

#[tokio::test]
async fn test_fee_claim_bumps_claimed_aggregate() {
    let (repo, _temp) = setup().await;
    let p = position("pos1");
    repo.insert_position(&p).await.unwrap();

    for ts in [2_000, 3_000] {
        repo.append_transaction_record(&TransactionRecord::new(
            p.id,
            TransactionType::FeeClaim,
            TimeMs::new(ts),
            None,
            TokenAmount::new(Decimal::from_str_canonical("0.1").unwrap()),
            TokenAmount::zero(),
            UsdPrice::new(Decimal::from_i64(150)),
            UsdPrice::new(Decimal::from_i64(1)),
            None,
        ))
        .await
        .unwrap();
    }
    // A withdraw record must not touch the fee aggregate.
    repo.append_transaction_record(&TransactionRecord::new(
        p.id,
        TransactionType::Withdraw,
        TimeMs::new(4_000),
        None,
        TokenAmount::new(Decimal::from_i64(1)),
        TokenAmount::zero(),
        UsdPrice::new(Decimal::from_i64(150)),
        UsdPrice::new(Decimal::from_i64(1)),
        None,
    ))
    .await
    .unwrap();

    let loaded = repo
        .find_position(&Address::new("pos1"))
        .await
        .unwrap()
        .unwrap();
    // Two claims of 0.1 * 150 = 15 each.
    assert_eq!(loaded.claimed_fee_usd.inner().to_canonical_string(), "30");

    let claims = repo.fee_claim_records(p.id).await.unwrap();
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[0].timestamp, TimeMs::new(2_000));
}

#[tokio::test]
async fn test_deposit_and_withdrawal_flows_log_records() {
    let (repo, _temp) = setup().await;
    let p = position("pos1");
    repo.record_deposit(&p, Some("deposit-sig".to_string()))
        .await
        .unwrap();

    repo.record_fee_claim(
        p.id,
        TimeMs::new(2_000),
        None,
        TokenAmount::new(Decimal::from_str_canonical("0.1").unwrap()),
        TokenAmount::zero(),
        UsdPrice::new(Decimal::from_i64(150)),
        UsdPrice::new(Decimal::from_i64(1)),
    )
    .await
    .unwrap();

    let closed = repo
        .record_withdrawal(
            &p,
            TimeMs::new(5_000),
            TokenAmount::new(Decimal::from_i64(9)),
            TokenAmount::new(Decimal::from_i64(1_400)),
            UsdPrice::new(Decimal::from_i64(140)),
            UsdPrice::new(Decimal::from_i64(1)),
            TokenAmount::zero(),
            TokenAmount::zero(),
            Some("withdraw-sig".to_string()),
        )
        .await
        .unwrap();
    assert!(closed);

    let loaded = repo
        .find_position(&Address::new("pos1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!loaded.is_open());
    assert_eq!(loaded.claimed_fee_usd.inner().to_canonical_string(), "15");

    // A second withdrawal is a no-op that logs nothing.
    let again = repo
        .record_withdrawal(
            &p,
            TimeMs::new(9_000),
            TokenAmount::zero(),
            TokenAmount::zero(),
            UsdPrice::zero(),
            UsdPrice::zero(),
            TokenAmount::zero(),
            TokenAmount::zero(),
            None,
        )
        .await
        .unwrap();
    assert!(!again);
}

fn pending(hash: &str, created_at: TimeMs, ttl_secs: i64) -> PendingTransaction {
    PendingTransaction {
        tx_hash: hash.to_string(),
        wallet_address: Address::new("wallet1"),
        position_address: Address::new("pos1"),
        created_at,
        expires_at: created_at.plus_secs(ttl_secs),
        executed: false,
    }
}

#[tokio::test]
async fn test_expire_stale_pending_never_loosens_the_limiter() {
    let (repo, _temp) = setup().await;
    let now = TimeMs::new(1_000_000);

    // Expired and outside the rate window: deletable.
    repo.insert_pending_transaction(&pending("old", now.minus_secs(120), 30))
        .await
        .unwrap();
    // Expired but still inside the window: must survive so it keeps
    // counting against the limit.
    repo.insert_pending_transaction(&pending("recent", now.minus_secs(40), 30))
        .await
        .unwrap();
    // Live intent.
    repo.insert_pending_transaction(&pending("live", now, 60))
        .await
        .unwrap();

    let deleted = repo.expire_stale_pending(now, 60).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(repo.find_pending_transaction("old").await.unwrap().is_none());
    assert!(repo.find_pending_transaction("recent").await.unwrap().is_some());
    assert!(repo.find_pending_transaction("live").await.unwrap().is_some());

    // The window count still sees both surviving intents.
    let count = repo
        .count_pending_transactions(&Address::new("wallet1"), now.minus_secs(60))
        .await
        .unwrap();
    assert_eq!(count, 2);
}
