//! Return calculation.

use rust_decimal::Decimal;
use serde::Serialize;

/// Decimal places kept for the return rate.
pub const RETURN_RATE_SCALE: u32 = 4;

/// Profit of an investment relative to the principal put in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReturnSummary {
    /// `current_balance - total_invested`.
    pub profit: Decimal,
    /// `profit / total_invested * 100`, rounded to [`RETURN_RATE_SCALE`].
    pub return_pct: Decimal,
}

impl ReturnSummary {
    /// No return.
    pub const ZERO: Self = Self {
        profit: Decimal::ZERO,
        return_pct: Decimal::ZERO,
    };
}

/// Computes profit and return percentage.
///
/// Defined as zero when nothing is invested. When withdrawals have taken out
/// more than the principal the percentage has no base and is reported as 0.
#[must_use]
pub fn calculate_return(current_balance: Decimal, total_invested: Decimal) -> ReturnSummary {
    if total_invested.is_zero() {
        return ReturnSummary::ZERO;
    }
    let profit = current_balance - total_invested;
    if total_invested < Decimal::ZERO {
        return ReturnSummary {
            profit,
            return_pct: Decimal::ZERO,
        };
    }
    ReturnSummary {
        profit,
        return_pct: (profit / total_invested * Decimal::ONE_HUNDRED).round_dp(RETURN_RATE_SCALE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1100), dec!(1000), dec!(100), dec!(10))]
    #[case(dec!(900), dec!(1000), dec!(-100), dec!(-10))]
    #[case(dec!(1000), dec!(1000), dec!(0), dec!(0))]
    #[case(dec!(0), dec!(0), dec!(0), dec!(0))]
    #[case(dec!(50), dec!(0), dec!(0), dec!(0))]
    #[case(dec!(1), dec!(3), dec!(-2), dec!(-66.6667))]
    fn test_calculate_return(
        #[case] current: Decimal,
        #[case] invested: Decimal,
        #[case] profit: Decimal,
        #[case] pct: Decimal,
    ) {
        let summary = calculate_return(current, invested);
        assert_eq!(summary.profit, profit);
        assert_eq!(summary.return_pct, pct);
    }

    #[test]
    fn test_over_withdrawn_principal_has_no_rate() {
        let summary = calculate_return(dec!(0), dec!(-100));
        assert_eq!(summary.profit, dec!(100));
        assert_eq!(summary.return_pct, Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn prop_profit_is_balance_minus_principal(
            current in 0i64..10_000_000,
            invested in 1i64..10_000_000,
        ) {
            let current = Decimal::new(current, 2);
            let invested = Decimal::new(invested, 2);
            let summary = calculate_return(current, invested);
            prop_assert_eq!(summary.profit, current - invested);
            prop_assert_eq!(
                summary.return_pct,
                (summary.profit / invested * dec!(100)).round_dp(RETURN_RATE_SCALE)
            );
        }
    }
}
