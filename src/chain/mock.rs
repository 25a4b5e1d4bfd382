//! Mock chain and oracle capabilities for testing without RPC calls.

use super::{ActiveBin, ChainError, ChainReader, PositionTotals, PriceOracle};
use crate::domain::{Address, TokenSymbol, UsdPrice};
use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use std::collections::{HashMap, HashSet};

/// Mock chain reader that serves predefined per-address data.
#[derive(Debug, Clone, Default)]
pub struct MockChainReader {
    totals: HashMap<Address, PositionTotals>,
    owners: HashMap<Address, Address>,
    active_bins: HashMap<Address, ActiveBin>,
    /// Addresses whose reads fail as if the RPC were down.
    unavailable: HashSet<Address>,
    compute_units: u64,
    simulation_fails: bool,
    prioritization_fee: u64,
    blockhash: Hash,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self {
            compute_units: 120_000,
            prioritization_fee: 1_000,
            ..Default::default()
        }
    }

    /// Serve these totals for a position address.
    pub fn with_totals(mut self, position: Address, totals: PositionTotals) -> Self {
        self.totals.insert(position, totals);
        self
    }

    /// Report this wallet as the owner of a position.
    pub fn with_owner(mut self, position: Address, owner: Address) -> Self {
        self.owners.insert(position, owner);
        self
    }

    pub fn with_active_bin(mut self, pool: Address, bin: ActiveBin) -> Self {
        self.active_bins.insert(pool, bin);
        self
    }

    /// Make every read for this address fail with an RPC error.
    pub fn with_unavailable(mut self, position: Address) -> Self {
        self.unavailable.insert(position);
        self
    }

    pub fn with_compute_units(mut self, units: u64) -> Self {
        self.compute_units = units;
        self
    }

    /// Make `simulate` return a simulation error.
    pub fn with_failing_simulation(mut self) -> Self {
        self.simulation_fails = true;
        self
    }

    pub fn with_prioritization_fee(mut self, micro_lamports: u64) -> Self {
        self.prioritization_fee = micro_lamports;
        self
    }

    fn check_available(&self, address: &Address) -> Result<(), ChainError> {
        if self.unavailable.contains(address) {
            return Err(ChainError::Rpc(format!("connection refused: {}", address)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn position_totals(&self, position: &Address) -> Result<PositionTotals, ChainError> {
        self.check_available(position)?;
        self.totals
            .get(position)
            .copied()
            .ok_or_else(|| ChainError::PositionNotOnChain(position.to_string()))
    }

    async fn position_owner(&self, position: &Address) -> Result<Address, ChainError> {
        self.check_available(position)?;
        self.owners
            .get(position)
            .cloned()
            .ok_or_else(|| ChainError::PositionNotOnChain(position.to_string()))
    }

    async fn active_bin(&self, pool: &Address) -> Result<ActiveBin, ChainError> {
        self.check_available(pool)?;
        self.active_bins
            .get(pool)
            .copied()
            .ok_or_else(|| ChainError::Rpc(format!("unknown pool: {}", pool)))
    }

    async fn simulate(&self, _message: &Message) -> Result<u64, ChainError> {
        if self.simulation_fails {
            return Err(ChainError::SimulationFailed(
                "program error: custom(6001)".to_string(),
            ));
        }
        Ok(self.compute_units)
    }

    async fn recent_prioritization_fee(&self) -> Result<u64, ChainError> {
        Ok(self.prioritization_fee)
    }

    async fn latest_blockhash(&self) -> Result<Hash, ChainError> {
        Ok(self.blockhash)
    }
}

/// Mock price oracle serving a fixed symbol -> price table.
#[derive(Debug, Clone, Default)]
pub struct MockPriceOracle {
    prices: HashMap<TokenSymbol, UsdPrice>,
}

impl MockPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: TokenSymbol, price: UsdPrice) -> Self {
        self.prices.insert(symbol, price);
        self
    }
}

#[async_trait]
impl PriceOracle for MockPriceOracle {
    async fn usd_price(&self, symbol: &TokenSymbol) -> Result<UsdPrice, ChainError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ChainError::Oracle(format!("no price for {}", symbol)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, TokenAmount};

    fn addr(seed: &str) -> Address {
        Address::new(seed)
    }

    #[test]
    fn test_builder_accumulates() {
        let reader = MockChainReader::new()
            .with_owner(addr("pos"), addr("wallet"))
            .with_compute_units(50_000);
        assert_eq!(reader.compute_units, 50_000);
        assert_eq!(reader.owners.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_position_is_not_on_chain() {
        let reader = MockChainReader::new();
        match reader.position_totals(&addr("gone")).await {
            Err(ChainError::PositionNotOnChain(a)) => assert_eq!(a, "gone"),
            other => panic!("expected PositionNotOnChain, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unavailable_address_fails_rpc() {
        let totals = PositionTotals {
            token_x_amount: TokenAmount::new(Decimal::from_i64(1)),
            token_y_amount: TokenAmount::new(Decimal::from_i64(1)),
            unclaimed_fee_x: TokenAmount::zero(),
            unclaimed_fee_y: TokenAmount::zero(),
        };
        let reader = MockChainReader::new()
            .with_totals(addr("pos"), totals)
            .with_unavailable(addr("pos"));
        match reader.position_totals(&addr("pos")).await {
            Err(ChainError::Rpc(_)) => {}
            other => panic!("expected Rpc error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oracle_lookup() {
        let oracle = MockPriceOracle::new().with_price(
            TokenSymbol::new("SOL"),
            UsdPrice::new(Decimal::from_i64(150)),
        );
        let price = oracle.usd_price(&TokenSymbol::new("SOL")).await.unwrap();
        assert_eq!(price.inner().to_canonical_string(), "150");
        assert!(oracle.usd_price(&TokenSymbol::new("???")).await.is_err());
    }
}
