use std::collections::HashMap;
use thiserror::Error;

/// Runtime configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub rpc_url: String,
    pub price_api_url: String,
    /// Max prepared transactions per wallet inside the rate-limit window.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: i64,
    /// Lifetime of a prepared-transaction intent.
    pub intent_ttl_secs: i64,
    /// Freshness window for ownership-proof timestamps.
    pub signature_max_age_secs: i64,
    pub default_slippage_bps: u16,
    /// Bounded concurrency for wallet PnL batches.
    pub pnl_batch_size: usize,
    pub pnl_batch_delay_ms: u64,
    /// Compute-unit estimate used when simulation fails.
    pub fallback_compute_units: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parsed<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
    expectation: &str,
) -> Result<T, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), expectation.to_string()))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = required(&env_map, "DATABASE_PATH")?;
        let rpc_url = required(&env_map, "RPC_URL")?;
        let price_api_url = required(&env_map, "PRICE_API_URL")?;

        let rate_limit_max = parsed(&env_map, "RATE_LIMIT_MAX", "10", "must be a valid u32")?;
        let rate_limit_window_secs = parsed(
            &env_map,
            "RATE_LIMIT_WINDOW_SECS",
            "60",
            "must be a valid i64",
        )?;
        let intent_ttl_secs = parsed(&env_map, "INTENT_TTL_SECS", "60", "must be a valid i64")?;
        let signature_max_age_secs = parsed(
            &env_map,
            "SIGNATURE_MAX_AGE_SECS",
            "300",
            "must be a valid i64",
        )?;
        let default_slippage_bps: u16 = parsed(
            &env_map,
            "DEFAULT_SLIPPAGE_BPS",
            "50",
            "must be a valid u16",
        )?;
        if default_slippage_bps >= 10_000 {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_SLIPPAGE_BPS".to_string(),
                "must be below 10000".to_string(),
            ));
        }
        let pnl_batch_size = parsed(&env_map, "PNL_BATCH_SIZE", "3", "must be a valid usize")?;
        let pnl_batch_delay_ms = parsed(
            &env_map,
            "PNL_BATCH_DELAY_MS",
            "250",
            "must be a valid u64",
        )?;
        let fallback_compute_units = parsed(
            &env_map,
            "FALLBACK_COMPUTE_UNITS",
            "200000",
            "must be a valid u64",
        )?;

        Ok(Config {
            database_path,
            rpc_url,
            price_api_url,
            rate_limit_max,
            rate_limit_window_secs,
            intent_ttl_secs,
            signature_max_age_secs,
            default_slippage_bps,
            pnl_batch_size,
            pnl_batch_delay_ms,
            fallback_compute_units,
        })
    }
}

impl Default for Config {
    /// Defaults used by tests and the demo binary; storage paths point at
    /// in-memory/placeholder targets.
    fn default() -> Self {
        Config {
            database_path: ":memory:".to_string(),
            rpc_url: "http://localhost:8899".to_string(),
            price_api_url: "http://localhost:9000".to_string(),
            rate_limit_max: 10,
            rate_limit_window_secs: 60,
            intent_ttl_secs: 60,
            signature_max_age_secs: 300,
            default_slippage_bps: 50,
            pnl_batch_size: 3,
            pnl_batch_delay_ms: 250,
            fallback_compute_units: 200_000,
        }
    }
}
