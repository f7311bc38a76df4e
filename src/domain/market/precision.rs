//! Numeric formatting honoring a market's precision.

use super::types::PrecisionMode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Truncate,
    Round,
}

/// Applies `precision` to `value` and renders it without trailing zeros.
/// A missing precision leaves the value untouched. `None` when snapping to
/// the tick grid overflows.
pub fn decimal_to_precision(
    value: Decimal,
    precision: Option<Decimal>,
    mode: PrecisionMode,
    rounding: Rounding,
) -> Option<String> {
    let Some(precision) = precision else {
        return Some(value.normalize().to_string());
    };
    let result = match mode {
        PrecisionMode::TickSize => to_tick(value, precision, rounding)?,
        PrecisionMode::DecimalPlaces => {
            let places = precision.trunc().to_u32().unwrap_or(0);
            let strategy = match rounding {
                Rounding::Truncate => RoundingStrategy::ToZero,
                Rounding::Round => RoundingStrategy::MidpointAwayFromZero,
            };
            value.round_dp_with_strategy(places, strategy)
        }
    };
    Some(result.normalize().to_string())
}

fn to_tick(value: Decimal, tick: Decimal, rounding: Rounding) -> Option<Decimal> {
    if tick <= Decimal::ZERO {
        return Some(value);
    }
    let steps = value.checked_div(tick)?;
    let steps = match rounding {
        Rounding::Truncate => steps.trunc(),
        Rounding::Round => steps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
    };
    steps.checked_mul(tick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick_size_truncates_amounts() {
        assert_eq!(
            decimal_to_precision(dec!(0.123456789), Some(dec!(0.00000001)), PrecisionMode::TickSize, Rounding::Truncate),
            Some("0.12345678".to_string())
        );
        assert_eq!(
            decimal_to_precision(dec!(105.37), Some(dec!(0.5)), PrecisionMode::TickSize, Rounding::Truncate),
            Some("105".to_string())
        );
    }

    #[test]
    fn test_tick_size_rounds_prices() {
        assert_eq!(
            decimal_to_precision(dec!(105.37), Some(dec!(0.05)), PrecisionMode::TickSize, Rounding::Round),
            Some("105.35".to_string())
        );
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(
            decimal_to_precision(dec!(1.23456), Some(dec!(2)), PrecisionMode::DecimalPlaces, Rounding::Round),
            Some("1.23".to_string())
        );
        assert_eq!(
            decimal_to_precision(dec!(1.239), Some(dec!(2)), PrecisionMode::DecimalPlaces, Rounding::Truncate),
            Some("1.23".to_string())
        );
    }

    #[test]
    fn test_missing_precision_passes_through() {
        assert_eq!(
            decimal_to_precision(dec!(1.2500), None, PrecisionMode::TickSize, Rounding::Round),
            Some("1.25".to_string())
        );
    }

    #[test]
    fn test_tick_overflow_is_none() {
        assert_eq!(
            decimal_to_precision(Decimal::MAX, Some(dec!(0.00000001)), PrecisionMode::TickSize, Rounding::Truncate),
            None
        );
    }
}
