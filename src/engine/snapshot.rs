//! Deposit, current, and withdrawal value snapshots for one position.

use crate::chain::{ChainReader, PriceOracle};
use crate::domain::{Position, PositionSnapshot, TimeMs, TokenSideSnapshot, UsdPrice};
use crate::error::CoreError;
use std::sync::Arc;
use tracing::warn;

/// Builds value snapshots from stored entry/withdrawal data and live chain
/// and oracle reads.
#[derive(Clone)]
pub struct SnapshotProvider {
    chain: Arc<dyn ChainReader>,
    oracle: Arc<dyn PriceOracle>,
}

impl SnapshotProvider {
    pub fn new(chain: Arc<dyn ChainReader>, oracle: Arc<dyn PriceOracle>) -> Self {
        Self { chain, oracle }
    }

    /// Value snapshot at deposit time: stored amounts at stored prices.
    ///
    /// Legacy records may lack a stored tokenY deposit price; those fall
    /// back to the current oracle price and the snapshot is flagged
    /// approximate. The fallback is a documented approximation for old
    /// records, not a reconstruction of the true deposit-time price.
    pub async fn deposit_snapshot(&self, position: &Position) -> Result<PositionSnapshot, CoreError> {
        let token_x = TokenSideSnapshot::new(position.deposit_amount_x, position.deposit_price_x);

        let (price_y, approximate) = match position.deposit_price_y {
            Some(price) => (price, false),
            None => {
                warn!(
                    position = %position.address,
                    "legacy record has no stored tokenY deposit price, using current oracle price"
                );
                let price = self.oracle.usd_price(&position.token_y_symbol).await?;
                (price, true)
            }
        };
        let token_y = TokenSideSnapshot::new(position.deposit_amount_y, price_y);

        let snapshot = PositionSnapshot::new(token_x, token_y, position.created_at);
        Ok(if approximate {
            snapshot.approximate()
        } else {
            snapshot
        })
    }

    /// Live value snapshot for an open position: on-chain totals at current
    /// oracle prices.
    ///
    /// # Errors
    /// `PositionNotOnChain` when the account no longer exists. Callers must
    /// mark a position closed before it enters the closing transition; this
    /// path fails closed rather than substituting stale data.
    pub async fn current_snapshot(&self, position: &Position) -> Result<PositionSnapshot, CoreError> {
        if !position.is_open() {
            return Err(CoreError::Validation(
                "current snapshot requires an open position".to_string(),
            ));
        }

        let totals = self.chain.position_totals(&position.address).await?;
        let price_x = self.oracle.usd_price(&position.token_x_symbol).await?;
        let price_y = self.oracle.usd_price(&position.token_y_symbol).await?;

        Ok(PositionSnapshot::new(
            TokenSideSnapshot::new(totals.token_x_amount, price_x),
            TokenSideSnapshot::new(totals.token_y_amount, price_y),
            TimeMs::now(),
        ))
    }

    /// Value snapshot at close time: stored withdrawal amounts at stored
    /// withdrawal prices, falling back to the entry price where a
    /// withdrawal price was never recorded (flagged approximate).
    pub async fn withdrawal_snapshot(
        &self,
        position: &Position,
    ) -> Result<PositionSnapshot, CoreError> {
        if position.is_open() {
            return Err(CoreError::Validation(
                "withdrawal snapshot requires a closed position".to_string(),
            ));
        }
        let (amount_x, amount_y) = match (position.withdraw_amount_x, position.withdraw_amount_y) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(CoreError::NotFound(format!(
                    "position {} is closed but has no withdrawal snapshot",
                    position.address
                )))
            }
        };

        let mut approximate = false;
        let price_x = match position.withdraw_price_x {
            Some(price) => price,
            None => {
                approximate = true;
                position.deposit_price_x
            }
        };
        let price_y = match position.withdraw_price_y {
            Some(price) => price,
            None => {
                approximate = true;
                match position.deposit_price_y {
                    Some(price) => price,
                    None => self.oracle.usd_price(&position.token_y_symbol).await?,
                }
            }
        };

        let timestamp = position.closed_at.unwrap_or_else(TimeMs::now);
        let snapshot = PositionSnapshot::new(
            TokenSideSnapshot::new(amount_x, price_x),
            TokenSideSnapshot::new(amount_y, price_y),
            timestamp,
        );
        Ok(if approximate {
            snapshot.approximate()
        } else {
            snapshot
        })
    }

}
