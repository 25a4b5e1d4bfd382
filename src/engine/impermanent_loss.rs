//! Empirical impermanent-loss measurement from snapshot diffs.
//!
//! Bin-based liquidity makes position value a non-analytic function of
//! price, so IL is measured by comparing chain-read snapshots rather than
//! derived from a closed-form AMM formula.

use crate::domain::{ImpermanentLoss, PositionSnapshot};

/// Compare the deposited quantities held outright against the position's
/// actual current value, both at current prices.
///
/// Positive IL means the position underperformed simply holding.
pub fn compute(deposit: &PositionSnapshot, current: &PositionSnapshot) -> ImpermanentLoss {
    let hodl_value = deposit.value_at_prices_of(current);
    let current_value = current.total_usd();
    let il_usd = hodl_value - current_value;

    let deposit_value = deposit.total_usd();
    let percent = il_usd.percent_of(deposit_value);

    ImpermanentLoss {
        usd: il_usd,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, TimeMs, TokenAmount, TokenSideSnapshot, UsdPrice};

    fn snapshot(ax: &str, px: i64, ay: &str, py: i64) -> PositionSnapshot {
        PositionSnapshot::new(
            TokenSideSnapshot::new(
                TokenAmount::new(Decimal::from_str_canonical(ax).unwrap()),
                UsdPrice::new(Decimal::from_i64(px)),
            ),
            TokenSideSnapshot::new(
                TokenAmount::new(Decimal::from_str_canonical(ay).unwrap()),
                UsdPrice::new(Decimal::from_i64(py)),
            ),
            TimeMs::new(0),
        )
    }

    #[test]
    fn test_worked_example() {
        // Deposit 0.01 @ 60000 + 5 @ 150 = 1350; current 0.008 / 5.5 at the
        // same prices = 1305. Hodl = 1350, so IL = 45 (~3.33%).
        let deposit = snapshot("0.01", 60_000, "5", 150);
        let current = snapshot("0.008", 60_000, "5.5", 150);
        let il = compute(&deposit, &current);
        assert_eq!(il.usd.inner().to_canonical_string(), "45");
        let expected = Decimal::from_str_canonical("3.333333").unwrap();
        assert!((il.percent - expected).abs() < Decimal::from_str_canonical("0.001").unwrap());
    }

    #[test]
    fn test_sign_convention_negative_when_position_beat_holding() {
        // Position accumulated more of both tokens than deposited.
        let deposit = snapshot("1", 100, "1", 100);
        let current = snapshot("1.1", 100, "1.1", 100);
        let il = compute(&deposit, &current);
        assert!(il.usd.inner().is_negative());
        assert!(il.percent.is_negative());
    }

    #[test]
    fn test_zero_deposit_value_yields_zero_percent() {
        let deposit = snapshot("0", 100, "0", 100);
        let current = snapshot("0", 100, "0", 100);
        let il = compute(&deposit, &current);
        assert!(il.usd.is_zero());
        assert!(il.percent.is_zero());
    }
}
