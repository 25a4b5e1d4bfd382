//! RPC-backed ChainReader over the DLMM program.
//!
//! Decodes the minimal subset of the on-chain position and pool layouts the
//! core consumes. Not exercised by tests; integration tests run against the
//! mocks in `mock.rs`.

use super::{ActiveBin, ChainError, ChainReader, PositionTotals};
use crate::domain::{Address, Decimal, TokenAmount, UsdPrice};
use async_trait::async_trait;
use borsh::BorshDeserialize;
use rust_decimal::prelude::FromPrimitive;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSimulateTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimal mirror of the DLMM position account: only the fields this core
/// reads. The on-chain account carries more (bin shares, reward infos);
/// the indexer-aggregated totals here are what the PnL engine needs.
#[derive(Debug, BorshDeserialize)]
struct PositionAccount {
    lb_pair: Pubkey,
    owner: Pubkey,
    total_x_amount: u64,
    total_y_amount: u64,
    fee_x_pending: u64,
    fee_y_pending: u64,
}

/// Minimal mirror of the pool (LbPair) account.
#[derive(Debug, BorshDeserialize)]
struct LbPairAccount {
    active_id: i32,
    bin_step: u16,
}

const ACCOUNT_DISCRIMINATOR_LEN: usize = 8;

/// ChainReader implementation over a Solana JSON-RPC endpoint.
pub struct RpcChainReader {
    client: Arc<RpcClient>,
    token_x_decimals: u8,
    token_y_decimals: u8,
}

impl RpcChainReader {
    pub fn new(rpc_url: String, token_x_decimals: u8, token_y_decimals: u8) -> Self {
        let client = RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed());
        Self {
            client: Arc::new(client),
            token_x_decimals,
            token_y_decimals,
        }
    }

    fn parse_pubkey(address: &Address) -> Result<Pubkey, ChainError> {
        address
            .to_pubkey()
            .map_err(|e| ChainError::Rpc(format!("invalid address {}: {}", address, e)))
    }

    async fn account_data(&self, key: &Pubkey, address: &Address) -> Result<Vec<u8>, ChainError> {
        match self.client.get_account(key).await {
            Ok(account) => Ok(account.data),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("AccountNotFound") || msg.contains("could not find account") {
                    Err(ChainError::PositionNotOnChain(address.to_string()))
                } else {
                    Err(ChainError::Rpc(msg))
                }
            }
        }
    }

    fn decode<T: BorshDeserialize>(data: &[u8], what: &str) -> Result<T, ChainError> {
        if data.len() <= ACCOUNT_DISCRIMINATOR_LEN {
            return Err(ChainError::Rpc(format!("{} account data too short", what)));
        }
        let mut slice = &data[ACCOUNT_DISCRIMINATOR_LEN..];
        T::deserialize(&mut slice)
            .map_err(|e| ChainError::Rpc(format!("failed to decode {} account: {}", what, e)))
    }

    fn ui_amount(raw: u64, decimals: u8) -> TokenAmount {
        let scale = Decimal::from_i64(10i64.pow(decimals as u32));
        TokenAmount::new(Decimal::from_i64(raw as i64) / scale)
    }

    /// DLMM bin price: (1 + bin_step/10000)^active_id, in tokenY per tokenX.
    fn bin_price(active_id: i32, bin_step: u16) -> UsdPrice {
        let base = 1.0 + (bin_step as f64) / 10_000.0;
        let price = base.powi(active_id);
        let decimal = rust_decimal::Decimal::from_f64(price).unwrap_or_default();
        UsdPrice::new(Decimal::new(decimal))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn position_totals(&self, position: &Address) -> Result<PositionTotals, ChainError> {
        let key = Self::parse_pubkey(position)?;
        let data = self.account_data(&key, position).await?;
        let account: PositionAccount = Self::decode(&data, "position")?;
        debug!(
            position = %position,
            x = account.total_x_amount,
            y = account.total_y_amount,
            "read position totals"
        );
        Ok(PositionTotals {
            token_x_amount: Self::ui_amount(account.total_x_amount, self.token_x_decimals),
            token_y_amount: Self::ui_amount(account.total_y_amount, self.token_y_decimals),
            unclaimed_fee_x: Self::ui_amount(account.fee_x_pending, self.token_x_decimals),
            unclaimed_fee_y: Self::ui_amount(account.fee_y_pending, self.token_y_decimals),
        })
    }

    async fn position_owner(&self, position: &Address) -> Result<Address, ChainError> {
        let key = Self::parse_pubkey(position)?;
        let data = self.account_data(&key, position).await?;
        let account: PositionAccount = Self::decode(&data, "position")?;
        Ok(Address::from(account.owner))
    }

    async fn active_bin(&self, pool: &Address) -> Result<ActiveBin, ChainError> {
        let key = Self::parse_pubkey(pool)?;
        let data = self.account_data(&key, pool).await?;
        let account: LbPairAccount = Self::decode(&data, "pool")?;
        Ok(ActiveBin {
            bin_id: account.active_id,
            price: Self::bin_price(account.active_id, account.bin_step),
            bin_step: account.bin_step,
        })
    }

    async fn simulate(&self, message: &Message) -> Result<u64, ChainError> {
        let tx = Transaction::new_unsigned(message.clone());
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            ..Default::default()
        };
        let response = self
            .client
            .simulate_transaction_with_config(&tx, config)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        if let Some(err) = response.value.err {
            return Err(ChainError::SimulationFailed(err.to_string()));
        }
        response
            .value
            .units_consumed
            .ok_or_else(|| ChainError::SimulationFailed("no compute units reported".to_string()))
    }

    async fn recent_prioritization_fee(&self) -> Result<u64, ChainError> {
        let fees = self
            .client
            .get_recent_prioritization_fees(&[])
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        if fees.is_empty() {
            warn!("no recent prioritization fees reported, using zero");
            return Ok(0);
        }
        let mut values: Vec<u64> = fees.iter().map(|f| f.prioritization_fee).collect();
        values.sort_unstable();
        Ok(values[values.len() / 2])
    }

    async fn latest_blockhash(&self) -> Result<Hash, ChainError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_amount_scaling() {
        let amount = RpcChainReader::ui_amount(1_500_000, 6);
        assert_eq!(amount.inner().to_canonical_string(), "1.5");
    }

    #[test]
    fn test_bin_price_at_zero_is_one() {
        let price = RpcChainReader::bin_price(0, 20);
        assert_eq!(price.inner().to_canonical_string(), "1");
    }

    #[test]
    fn test_bin_price_monotonic_in_bin_id() {
        let low = RpcChainReader::bin_price(-100, 20);
        let mid = RpcChainReader::bin_price(0, 20);
        let high = RpcChainReader::bin_price(100, 20);
        assert!(low < mid);
        assert!(mid < high);
    }
}
