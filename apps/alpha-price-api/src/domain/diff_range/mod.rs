//! Diff-Range Calculator
//!
//! Inverts the fee/waste model: given how much a trader is willing to lose
//! per round trip (the waste bounds), find the per-token price difference
//! that produces that loss once the fee is paid.
//!
//! ```text
//! fee_usdt     = fee_amount_token * price_now
//! token_amount = per_volume / price_now
//! diff         = (waste - fee_usdt) / token_amount
//! ```

use rust_decimal::Decimal;

use crate::domain::precision::Precision;
use crate::error::AlphaError;

/// Parameters of the fee/waste model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRangeInput {
    /// Current token price in quote currency. Must be positive.
    pub price_now: Decimal,
    /// Quote volume per trade. Must be positive.
    pub per_volume: Decimal,
    /// Lower bound of acceptable waste, in quote currency.
    pub waste_lower: Decimal,
    /// Upper bound of acceptable waste, in quote currency.
    pub waste_upper: Decimal,
    /// Fee charged per trade, in tokens.
    pub fee_amount_token: Decimal,
}

/// Price-difference range. Always `lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRange {
    /// Lower price difference.
    pub lower: Decimal,
    /// Upper price difference.
    pub upper: Decimal,
    /// Fee in quote currency, quantized.
    pub fee_usdt: Decimal,
}

/// Fee converted to quote currency, quantized.
///
/// # Errors
///
/// Returns [`AlphaError::InvalidInput`] if the product does not fit a
/// `Decimal`.
pub fn compute_fee_usdt(
    fee_amount_token: Decimal,
    price_now: Decimal,
    precision: &Precision,
) -> Result<Decimal, AlphaError> {
    fee_usdt(fee_amount_token, price_now).map(|fee| precision.quantize(fee))
}

fn fee_usdt(fee_amount_token: Decimal, price_now: Decimal) -> Result<Decimal, AlphaError> {
    fee_amount_token
        .checked_mul(price_now)
        .ok_or_else(|| out_of_range("fee_amount_token * price_now"))
}

fn out_of_range(what: &str) -> AlphaError {
    AlphaError::InvalidInput(format!("{what} is out of range"))
}

/// Solve the fee/waste model for the price-difference range.
///
/// Waste bounds below the fee give negative differences; they are not
/// rejected. The bounds are swapped after quantization when needed so the
/// range is always ordered.
///
/// # Errors
///
/// Returns [`AlphaError::InvalidInput`] if `price_now` or `per_volume` is
/// not strictly positive, or if an intermediate value overflows.
pub fn compute_diff_range(
    input: &DiffRangeInput,
    precision: &Precision,
) -> Result<DiffRange, AlphaError> {
    if input.price_now <= Decimal::ZERO || input.per_volume <= Decimal::ZERO {
        return Err(AlphaError::InvalidInput(
            "price_now and per_volume must be > 0".to_string(),
        ));
    }

    let fee_usdt = fee_usdt(input.fee_amount_token, input.price_now)?;
    let token_amount = input
        .per_volume
        .checked_div(input.price_now)
        .filter(|amount| !amount.is_zero())
        .ok_or_else(|| out_of_range("per_volume / price_now"))?;

    let diff = |waste: Decimal| {
        waste
            .checked_sub(fee_usdt)
            .and_then(|net| net.checked_div(token_amount))
            .map(|d| precision.quantize(d))
            .ok_or_else(|| out_of_range("price difference"))
    };
    let lower = diff(input.waste_lower)?;
    let upper = diff(input.waste_upper)?;
    let fee_usdt = precision.quantize(fee_usdt);

    Ok(if upper < lower {
        DiffRange {
            lower: upper,
            upper: lower,
            fee_usdt,
        }
    } else {
        DiffRange {
            lower,
            upper,
            fee_usdt,
        }
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    use super::*;

    fn input(
        price_now: Decimal,
        per_volume: Decimal,
        waste_lower: Decimal,
        waste_upper: Decimal,
        fee_amount_token: Decimal,
    ) -> DiffRangeInput {
        DiffRangeInput {
            price_now,
            per_volume,
            waste_lower,
            waste_upper,
            fee_amount_token,
        }
    }

    #[test]
    fn reference_scenario() {
        // 1 USDT/token, 100 USDT per trade, 2 token fee = 2 USDT.
        let range = compute_diff_range(
            &input(dec!(1), dec!(100), dec!(3), dec!(5), dec!(2)),
            &Precision::default(),
        )
        .unwrap();

        assert_eq!(range.lower.to_string(), "0.01000000");
        assert_eq!(range.upper.to_string(), "0.03000000");
    }

    #[test]
    fn price_scales_the_difference() {
        // token_amount = 100 / 2 = 50; fee = 0.5 * 2 = 1
        let range = compute_diff_range(
            &input(dec!(2), dec!(100), dec!(2), dec!(6), dec!(0.5)),
            &Precision::default(),
        )
        .unwrap();

        assert_eq!(range.lower, dec!(0.02));
        assert_eq!(range.upper, dec!(0.1));
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let range = compute_diff_range(
            &input(dec!(1), dec!(100), dec!(5), dec!(3), dec!(2)),
            &Precision::default(),
        )
        .unwrap();

        assert_eq!(range.lower.to_string(), "0.01000000");
        assert_eq!(range.upper.to_string(), "0.03000000");
    }

    #[test]
    fn waste_below_fee_yields_negative_differences() {
        let range = compute_diff_range(
            &input(dec!(1), dec!(100), dec!(0), dec!(1), dec!(2)),
            &Precision::default(),
        )
        .unwrap();

        assert_eq!(range.lower, dec!(-0.02));
        assert_eq!(range.upper, dec!(-0.01));
    }

    #[test_case(dec!(0), dec!(100) ; "zero price")]
    #[test_case(dec!(1), dec!(0) ; "zero volume")]
    #[test_case(dec!(-1), dec!(100) ; "negative price")]
    #[test_case(dec!(0), dec!(0) ; "both zero")]
    fn non_positive_price_or_volume_is_invalid(price_now: Decimal, per_volume: Decimal) {
        let result = compute_diff_range(
            &input(price_now, per_volume, dec!(0), dec!(0), dec!(0)),
            &Precision::default(),
        );
        assert!(matches!(result, Err(AlphaError::InvalidInput(_))));
    }

    #[test]
    fn fee_usdt_is_quantized() {
        let fee = compute_fee_usdt(dec!(0.333333333), dec!(3), &Precision::default()).unwrap();
        assert_eq!(fee.to_string(), "1.00000000");
    }

    #[test]
    fn range_carries_quantized_fee() {
        let range = compute_diff_range(
            &input(dec!(1), dec!(100), dec!(3), dec!(5), dec!(2)),
            &Precision::default(),
        )
        .unwrap();
        assert_eq!(range.fee_usdt.to_string(), "2.00000000");
    }

    #[test]
    fn fee_overflow_is_invalid_input() {
        assert!(matches!(
            compute_fee_usdt(Decimal::MAX, dec!(2), &Precision::default()),
            Err(AlphaError::InvalidInput(_))
        ));
    }

    #[test]
    fn huge_price_is_invalid_input_not_a_panic() {
        let result = compute_diff_range(
            &input(Decimal::MAX, dec!(100), dec!(3), dec!(5), dec!(2)),
            &Precision::default(),
        );
        assert!(matches!(result, Err(AlphaError::InvalidInput(_))));
    }

    #[test]
    fn tiny_price_with_huge_volume_is_invalid_input() {
        let result = compute_diff_range(
            &input(
                Decimal::new(1, 28),
                Decimal::from_i128_with_scale(10_000_000_000_000_000_000_000_000_000, 0),
                dec!(3),
                dec!(5),
                dec!(2),
            ),
            &Precision::default(),
        );
        assert!(matches!(result, Err(AlphaError::InvalidInput(_))));
    }

    #[test]
    fn huge_waste_over_tiny_token_amount_is_invalid_input() {
        // token_amount = 1e-20; Decimal::MAX / 1e-20 overflows.
        let result = compute_diff_range(
            &input(dec!(1), Decimal::new(1, 20), Decimal::MAX, Decimal::MAX, dec!(0)),
            &Precision::default(),
        );
        assert!(matches!(result, Err(AlphaError::InvalidInput(_))));
    }

    proptest! {
        #[test]
        fn range_is_always_ordered(
            price in 1i64..1_000_000,
            volume in 1i64..1_000_000,
            lower in 0i64..1_000_000,
            upper in 0i64..1_000_000,
            fee in 0i64..1_000_000,
        ) {
            let range = compute_diff_range(
                &input(
                    Decimal::new(price, 4),
                    Decimal::new(volume, 2),
                    Decimal::new(lower, 2),
                    Decimal::new(upper, 2),
                    Decimal::new(fee, 3),
                ),
                &Precision::default(),
            )
            .unwrap();
            prop_assert!(range.lower <= range.upper);
        }
    }
}
