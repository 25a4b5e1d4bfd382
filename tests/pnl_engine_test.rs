use dlmm_ledger::chain::{MockChainReader, MockPriceOracle, NoRewards, PositionTotals};
use dlmm_ledger::db::init_db;
use dlmm_ledger::domain::{
    Address, Decimal, Position, PositionStatus, TimeMs, TokenAmount, TokenSymbol,
    TransactionRecord, TransactionType, UsdPrice,
};
use dlmm_ledger::engine::{FeesCalculator, PnlAggregator, SnapshotProvider};
use dlmm_ledger::Repository;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}

fn aggregator(
    repo: Arc<Repository>,
    chain: MockChainReader,
    oracle: MockPriceOracle,
) -> PnlAggregator {
    let chain = Arc::new(chain);
    let oracle = Arc::new(oracle);
    let snapshots = SnapshotProvider::new(chain.clone(), oracle.clone());
    let fees = FeesCalculator::new(repo.clone(), chain, oracle);
    PnlAggregator::new(
        repo,
        snapshots,
        fees,
        Arc::new(NoRewards),
        3,
        Duration::from_millis(0),
    )
}

fn btc_sol_position(address: &str, wallet: &str) -> Position {
    Position::open(
        Address::new(address),
        Address::new("pool1"),
        Address::new(wallet),
        TokenSymbol::new("BTC"),
        TokenSymbol::new("SOL"),
        TokenAmount::new(Decimal::from_str_canonical("0.01").unwrap()),
        TokenAmount::new(Decimal::from_i64(5)),
        UsdPrice::new(Decimal::from_i64(60_000)),
        Some(UsdPrice::new(Decimal::from_i64(150))),
        TimeMs::new(1_000),
    )
}

fn totals(x: &str, y: &str) -> PositionTotals {
    PositionTotals {
        token_x_amount: TokenAmount::new(Decimal::from_str_canonical(x).unwrap()),
        token_y_amount: TokenAmount::new(Decimal::from_str_canonical(y).unwrap()),
        unclaimed_fee_x: TokenAmount::zero(),
        unclaimed_fee_y: TokenAmount::zero(),
    }
}

fn prices() -> MockPriceOracle {
    MockPriceOracle::new()
        .with_price(
            TokenSymbol::new("BTC"),
            UsdPrice::new(Decimal::from_i64(60_000)),
        )
        .with_price(
            TokenSymbol::new("SOL"),
            UsdPrice::new(Decimal::from_i64(150)),
        )
}

/// Deposit 0.01 BTC @ 60000 + 5 SOL @ 150 = 1350. Current holdings
/// 0.008 / 5.5 at the same prices = 1305, fees worth $2, no rewards:
/// realized PnL is -43 (about -3.19%) and IL is 45 (about 3.33%).
#[tokio::test]
async fn test_worked_example_and_accounting_identity() {
    let (repo, _temp) = setup_repo().await;
    let position = btc_sol_position("pos1", "wallet1");
    repo.insert_position(&position).await.unwrap();

    // One historical claim worth exactly $2 at claim-time prices.
    repo.append_transaction_record(&TransactionRecord::new(
        position.id,
        TransactionType::FeeClaim,
        TimeMs::new(2_000),
        None,
        TokenAmount::new(Decimal::from_str_canonical("0.0001").unwrap()),
        TokenAmount::zero(),
        UsdPrice::new(Decimal::from_i64(20_000)),
        UsdPrice::new(Decimal::from_i64(150)),
        None,
    ))
    .await
    .unwrap();

    let chain =
        MockChainReader::new().with_totals(position.address.clone(), totals("0.008", "5.5"));
    let agg = aggregator(repo, chain, prices());

    let result = agg.position_pnl(&position).await.unwrap();
    assert_eq!(result.deposit_value_usd.inner().to_canonical_string(), "1350");
    assert_eq!(result.current_value_usd.inner().to_canonical_string(), "1305");
    assert_eq!(result.fees_earned_usd.inner().to_canonical_string(), "2");
    assert_eq!(result.realized_pnl_usd.inner().to_canonical_string(), "-43");

    let expected_percent = Decimal::from_str_canonical("-3.185185").unwrap();
    let tolerance = Decimal::from_str_canonical("0.001").unwrap();
    assert!((result.realized_pnl_percent - expected_percent).abs() < tolerance);

    assert_eq!(result.impermanent_loss.usd.inner().to_canonical_string(), "45");
    let expected_il = Decimal::from_str_canonical("3.333333").unwrap();
    assert!((result.impermanent_loss.percent - expected_il).abs() < tolerance);

    // realized == current + fees + rewards - deposit, exactly.
    let identity = result.current_value_usd + result.fees_earned_usd
        + result.rewards_earned_usd
        - result.deposit_value_usd;
    assert_eq!(result.realized_pnl_usd, identity);
    assert!(!result.fallback);
}

#[tokio::test]
async fn test_closed_position_freezes_to_withdrawal_snapshot() {
    let (repo, _temp) = setup_repo().await;
    let mut position = btc_sol_position("pos1", "wallet1");
    position.is_active = false;
    position.closed_at = Some(TimeMs::new(9_000));
    position.withdraw_amount_x = Some(TokenAmount::new(
        Decimal::from_str_canonical("0.008").unwrap(),
    ));
    position.withdraw_amount_y = Some(TokenAmount::new(Decimal::from_str_canonical("5.5").unwrap()));
    position.withdraw_price_x = Some(UsdPrice::new(Decimal::from_i64(60_000)));
    position.withdraw_price_y = Some(UsdPrice::new(Decimal::from_i64(150)));
    repo.insert_position(&position).await.unwrap();

    // No chain data at all: closed positions must never read the chain.
    let agg = aggregator(repo, MockChainReader::new(), MockPriceOracle::new());
    let result = agg.position_pnl(&position).await.unwrap();
    assert_eq!(result.status, PositionStatus::Closed);
    assert_eq!(result.current_value_usd.inner().to_canonical_string(), "1305");
    assert_eq!(result.realized_pnl_usd.inner().to_canonical_string(), "-45");
}

/// One bad chain read out of five must not fail the wallet report.
#[tokio::test]
async fn test_batch_isolation_substitutes_fallback() {
    let (repo, _temp) = setup_repo().await;

    let mut chain = MockChainReader::new();
    for i in 0..5 {
        let position = btc_sol_position(&format!("pos{}", i), "wallet1");
        repo.insert_position(&position).await.unwrap();
        if i == 2 {
            chain = chain.with_unavailable(position.address.clone());
        } else {
            chain = chain.with_totals(position.address.clone(), totals("0.01", "5"));
        }
    }

    let agg = aggregator(repo, chain, prices());
    let report = agg.wallet_pnl(&Address::new("wallet1")).await.unwrap();

    assert_eq!(report.positions.len(), 5);
    assert_eq!(report.open_positions, 5);
    let fallbacks: Vec<_> = report.positions.iter().filter(|p| p.fallback).collect();
    assert_eq!(fallbacks.len(), 1);

    // Every position deposited 1350; the four live reads hold exactly the
    // deposit and the fallback is valued at its stored deposit, so the
    // totals include all five.
    assert_eq!(
        report.total_deposit_value_usd.inner().to_canonical_string(),
        "6750"
    );
    assert_eq!(
        report.total_pnl_usd,
        report.positions.iter().map(|p| p.realized_pnl_usd).sum()
    );
}

#[tokio::test]
async fn test_wallet_report_sorts_open_first_then_pnl_descending() {
    let (repo, _temp) = setup_repo().await;

    let winner = btc_sol_position("winner", "wallet1");
    let loser = btc_sol_position("loser", "wallet1");
    let mut closed = btc_sol_position("closed", "wallet1");
    closed.is_active = false;
    closed.closed_at = Some(TimeMs::new(9_000));
    closed.withdraw_amount_x = Some(TokenAmount::new(Decimal::from_str_canonical("0.01").unwrap()));
    closed.withdraw_amount_y = Some(TokenAmount::new(Decimal::from_i64(5)));
    closed.withdraw_price_x = Some(UsdPrice::new(Decimal::from_i64(60_000)));
    closed.withdraw_price_y = Some(UsdPrice::new(Decimal::from_i64(150)));
    for p in [&winner, &loser, &closed] {
        repo.insert_position(p).await.unwrap();
    }

    let chain = MockChainReader::new()
        .with_totals(winner.address.clone(), totals("0.02", "5"))
        .with_totals(loser.address.clone(), totals("0.005", "5"));
    let agg = aggregator(repo, chain, prices());

    let report = agg.wallet_pnl(&Address::new("wallet1")).await.unwrap();
    assert_eq!(report.positions[0].position_id, winner.id);
    assert_eq!(report.positions[1].position_id, loser.id);
    assert_eq!(report.positions[2].position_id, closed.id);
    assert_eq!(report.open_positions, 2);
    assert_eq!(report.closed_positions, 1);
}
