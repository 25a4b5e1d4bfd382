use dlmm_ledger::chain::{HttpPriceOracle, RpcChainReader};
use dlmm_ledger::engine::{FeesCalculator, PnlAggregator, PositionChainTracker, SnapshotProvider};
use dlmm_ledger::{init_db, Address, Config, NoRewards, Repository};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let wallet = match std::env::args().nth(1) {
        Some(w) => Address::new(w),
        None => {
            eprintln!("Usage: dlmm-ledger <wallet-address>");
            std::process::exit(2);
        }
    };

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    let repo = Arc::new(Repository::new(pool));
    // SOL/USDC decimals; pools with other token pairs need their own reader.
    let chain = Arc::new(RpcChainReader::new(config.rpc_url.clone(), 9, 6));
    let oracle = Arc::new(HttpPriceOracle::new(config.price_api_url.clone()));

    let snapshots = SnapshotProvider::new(chain.clone(), oracle.clone());
    let fees = FeesCalculator::new(repo.clone(), chain.clone(), oracle.clone());
    let aggregator = PnlAggregator::new(
        repo.clone(),
        snapshots,
        fees,
        Arc::new(NoRewards),
        config.pnl_batch_size,
        Duration::from_millis(config.pnl_batch_delay_ms),
    );
    let tracker = PositionChainTracker::new(repo);

    let pnl = match aggregator.wallet_pnl(&wallet).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to compute wallet PnL: {}", e);
            std::process::exit(1);
        }
    };
    let stats = match tracker.wallet_stats(&wallet).await {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Failed to compute reposition stats: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&serde_json::json!({
        "pnl": pnl,
        "repositions": stats,
    })) {
        Ok(report) => println!("{}", report),
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
