//! Slippage bound computation.
//!
//! Bounds are embedded in transaction metadata for the caller to enforce
//! at submission time; nothing here touches on-chain enforcement.

use crate::domain::{BasisPoints, TokenAmount, UsdPrice};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Minimum acceptable outputs and price band for a reposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlippageBounds {
    pub slippage_bps: BasisPoints,
    pub min_output_x: TokenAmount,
    pub min_output_y: TokenAmount,
    pub min_price: UsdPrice,
    pub max_price: UsdPrice,
}

/// Validate a raw basis-point tolerance. 10000 bps would accept losing
/// everything, so the tolerance must be strictly below it.
pub fn validate_bps(bps: u16) -> Result<BasisPoints, CoreError> {
    if bps >= BasisPoints::MAX {
        return Err(CoreError::Validation(format!(
            "slippage must be below {} bps, got {}",
            BasisPoints::MAX,
            bps
        )));
    }
    Ok(BasisPoints::new(bps))
}

/// Compute bounds from current amounts and the current price.
pub fn compute(
    amount_x: TokenAmount,
    amount_y: TokenAmount,
    current_price: UsdPrice,
    tolerance: BasisPoints,
) -> SlippageBounds {
    SlippageBounds {
        slippage_bps: tolerance,
        min_output_x: amount_x.scale(tolerance.min_output_factor()),
        min_output_y: amount_y.scale(tolerance.min_output_factor()),
        min_price: current_price.scale(tolerance.min_output_factor()),
        max_price: current_price.scale(tolerance.max_price_factor()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decimal;

    #[test]
    fn test_bounds_at_fifty_bps() {
        let bounds = compute(
            TokenAmount::new(Decimal::from_i64(1_000)),
            TokenAmount::new(Decimal::from_i64(2_000)),
            UsdPrice::new(Decimal::from_i64(100)),
            BasisPoints::new(50),
        );
        assert_eq!(bounds.min_output_x.inner().to_canonical_string(), "995");
        assert_eq!(bounds.min_output_y.inner().to_canonical_string(), "1990");
        assert_eq!(bounds.min_price.inner().to_canonical_string(), "99.5");
        assert_eq!(bounds.max_price.inner().to_canonical_string(), "100.5");
    }

    #[test]
    fn test_bps_validation() {
        validate_bps(0).unwrap();
        validate_bps(9_999).unwrap();
        assert!(matches!(
            validate_bps(10_000),
            Err(CoreError::Validation(_))
        ));
    }
}
