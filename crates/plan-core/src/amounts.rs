//! Integer currency arithmetic and rate rounding shared by the calculators.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::CoreError;

/// Integer division rounded half away from zero. `denominator` must be positive.
pub fn div_round(numerator: i64, denominator: i64) -> i64 {
    clamp_wide(div_round_wide(numerator as i128, denominator as i128))
}

fn div_round_wide(n: i128, d: i128) -> i128 {
    debug_assert!(d > 0);
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

fn clamp_wide(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Sum that pins at the `i64` bounds instead of overflowing.
pub fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values
        .into_iter()
        .fold(0i64, |sum, value| sum.saturating_add(value))
}

/// `numerator / denominator * 100` to one decimal place, `None` when the denominator is not positive.
pub fn percent(numerator: i64, denominator: i64) -> Option<Decimal> {
    if denominator <= 0 {
        return None;
    }
    (Decimal::from(numerator) * Decimal::ONE_HUNDRED)
        .checked_div(Decimal::from(denominator))
        .map(|rate| rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// Budget amortized evenly over calendar days: `round(target / days * days_passed)`.
pub fn amortized(target: i64, days_passed: u32, days_in_month: u32) -> i64 {
    if days_in_month == 0 {
        return 0;
    }
    clamp_wide(div_round_wide(
        target as i128 * days_passed as i128,
        days_in_month as i128,
    ))
}

/// Uniform share of `target` for the 1-based `day` of the month.
///
/// Shares are differences of consecutive amortized totals, so they always sum to `target`.
pub fn uniform_share(target: i64, day: u32, days_in_month: u32) -> i64 {
    amortized(target, day, days_in_month)
        .saturating_sub(amortized(target, day.saturating_sub(1), days_in_month))
}

/// Parses a non-negative integer amount, allowing `,` or `_` as digit grouping.
pub fn parse_amount(raw: &str) -> Result<i64, CoreError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ',' | '_'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(CoreError::InvalidInput(format!(
            "`{}` is not a non-negative whole amount",
            raw.trim()
        )));
    }
    cleaned
        .parse::<i64>()
        .map_err(|_| CoreError::InvalidInput(format!("amount `{}` is too large", raw.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_round_rounds_half_away_from_zero() {
        assert_eq!(div_round(5, 2), 3);
        assert_eq!(div_round(4, 3), 1);
        assert_eq!(div_round(-5, 2), -3);
        assert_eq!(div_round(0, 7), 0);
    }

    #[test]
    fn amortized_holds_the_largest_target() {
        assert_eq!(amortized(i64::MAX, 31, 31), i64::MAX);
        assert_eq!(amortized(i64::MAX, 0, 31), 0);
        let shares = (1..=31).map(|day| uniform_share(i64::MAX, day, 31));
        assert_eq!(saturating_sum(shares), i64::MAX);
        assert_eq!(saturating_sum([i64::MAX, 1, 5]), i64::MAX);
        assert!(percent(i64::MAX, 1).is_some());
    }

    #[test]
    fn percent_is_one_decimal() {
        assert_eq!(percent(160_000, 300_000), Some(Decimal::new(533, 1)));
        assert_eq!(percent(1, 3), Some(Decimal::new(333, 1)));
        assert_eq!(percent(1, 16), Some(Decimal::new(63, 1)));
        assert_eq!(percent(50, 0), None);
    }

    #[test]
    fn uniform_shares_sum_to_target() {
        let target = 100_000;
        let shares: Vec<i64> = (1..=31).map(|day| uniform_share(target, day, 31)).collect();
        assert_eq!(shares.iter().sum::<i64>(), target);
        assert!(shares.iter().all(|share| (3_225..=3_226).contains(share)));
    }

    #[test]
    fn parse_amount_accepts_grouping_only() {
        assert_eq!(parse_amount("300,000").unwrap(), 300_000);
        assert_eq!(parse_amount(" 1_500 ").unwrap(), 1_500);
        assert!(matches!(parse_amount("-5"), Err(CoreError::InvalidInput(_))));
        assert!(parse_amount("12.5").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
    }
}
