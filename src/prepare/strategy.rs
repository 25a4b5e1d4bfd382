//! Strategy and bin-range selection for the replacement position.

use crate::domain::{BinRange, Decimal, UsdValue};
use serde::{Deserialize, Serialize};

/// Liquidity shape of the replacement position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Liquidity spread symmetrically around the active bin.
    Balanced,
    /// All liquidity on the tokenX side (above the active bin).
    OneSidedX,
    /// All liquidity on the tokenY side (below the active bin).
    OneSidedY,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Balanced => "balanced",
            Strategy::OneSidedX => "one_sided_x",
            Strategy::OneSidedY => "one_sided_y",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "balanced" => Some(Strategy::Balanced),
            "one_sided_x" => Some(Strategy::OneSidedX),
            "one_sided_y" => Some(Strategy::OneSidedY),
            _ => None,
        }
    }
}

/// Skew above which the position is treated as effectively one-sided.
const ONE_SIDED_THRESHOLD_PERCENT: i64 = 80;

/// Half-width of the default range, in bins on each side of the active bin.
const RANGE_HALF_WIDTH: i32 = 34;

/// Pick a strategy from the USD-value skew of the current holdings: more
/// than 80% of value in one token means one-sided, otherwise balanced.
pub fn select_strategy(value_x: UsdValue, value_y: UsdValue) -> Strategy {
    let total = value_x + value_y;
    if total.is_zero() {
        return Strategy::Balanced;
    }
    let threshold = Decimal::from_i64(ONE_SIDED_THRESHOLD_PERCENT);
    if value_x.percent_of(total) > threshold {
        Strategy::OneSidedX
    } else if value_y.percent_of(total) > threshold {
        Strategy::OneSidedY
    } else {
        Strategy::Balanced
    }
}

/// Bin range for the replacement position, anchored on the active bin.
///
/// Balanced ranges straddle it; one-sided ranges sit entirely on the side
/// where the remaining token earns fees as price moves through the range.
pub fn select_bin_range(active_bin_id: i32, strategy: Strategy) -> BinRange {
    match strategy {
        Strategy::Balanced => BinRange::new(
            active_bin_id - RANGE_HALF_WIDTH,
            active_bin_id + RANGE_HALF_WIDTH,
        ),
        Strategy::OneSidedX => BinRange::new(active_bin_id, active_bin_id + 2 * RANGE_HALF_WIDTH),
        Strategy::OneSidedY => BinRange::new(active_bin_id - 2 * RANGE_HALF_WIDTH, active_bin_id),
    }
}
