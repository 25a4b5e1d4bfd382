//! Claimed and unclaimed fee aggregation.

use crate::chain::{ChainReader, PriceOracle};
use crate::db::Repository;
use crate::domain::{FeesBreakdown, Position, TokenAmount, TokenFees, UsdPrice, UsdValue};
use crate::error::CoreError;
use std::sync::Arc;

/// Aggregates historical (claimed) and point-in-time (unclaimed) fee value
/// for one position.
#[derive(Clone)]
pub struct FeesCalculator {
    repo: Arc<Repository>,
    chain: Arc<dyn ChainReader>,
    oracle: Arc<dyn PriceOracle>,
}

impl FeesCalculator {
    pub fn new(
        repo: Arc<Repository>,
        chain: Arc<dyn ChainReader>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Self {
        Self {
            repo,
            chain,
            oracle,
        }
    }

    /// Per-token fee breakdown.
    ///
    /// Claimed value is a fold over the position's fee-claim log at the
    /// prices recorded when each claim happened; those prices are
    /// authoritative and never revalued. Unclaimed value is a live chain
    /// read for open positions, or the fee snapshot stored at close for
    /// closed ones.
    pub async fn breakdown(&self, position: &Position) -> Result<FeesBreakdown, CoreError> {
        let mut claimed_x = UsdValue::zero();
        let mut claimed_y = UsdValue::zero();
        for record in self.repo.fee_claim_records(position.id).await? {
            claimed_x = claimed_x + record.token_x_amount * record.token_x_price;
            claimed_y = claimed_y + record.token_y_amount * record.token_y_price;
        }

        let (amount_x, amount_y, price_x, price_y) = if position.is_open() {
            let totals = self.chain.position_totals(&position.address).await?;
            let price_x = self.oracle.usd_price(&position.token_x_symbol).await?;
            let price_y = self.oracle.usd_price(&position.token_y_symbol).await?;
            (
                totals.unclaimed_fee_x,
                totals.unclaimed_fee_y,
                price_x,
                price_y,
            )
        } else {
            let amount_x = position.withdraw_fee_x.unwrap_or_else(TokenAmount::zero);
            let amount_y = position.withdraw_fee_y.unwrap_or_else(TokenAmount::zero);
            let price_x = position
                .withdraw_price_x
                .unwrap_or(position.deposit_price_x);
            let price_y = match position.withdraw_price_y.or(position.deposit_price_y) {
                Some(price) => price,
                // Legacy closed record with no stored price on either end.
                None => UsdPrice::zero(),
            };
            (amount_x, amount_y, price_x, price_y)
        };

        Ok(FeesBreakdown {
            token_x: TokenFees {
                amount: amount_x,
                claimed_usd: claimed_x,
                unclaimed_usd: amount_x * price_x,
            },
            token_y: TokenFees {
                amount: amount_y,
                claimed_usd: claimed_y,
                unclaimed_usd: amount_y * price_y,
            },
        })
    }
}
