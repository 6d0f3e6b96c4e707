use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LadderError;
use crate::types::{Money, Rate};
use crate::LadderResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const RATE_TOLERANCE: Decimal = dec!(0.000000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MIN_RATE: Decimal = dec!(-0.9);
const MAX_RATE: Decimal = dec!(10);

/// Internal Rate of Return using Newton-Raphson.
///
/// The series needs at least two flows and a sign change; anything else has
/// no meaningful IRR and is reported as `InsufficientData`.
pub fn irr(cash_flows: &[Money], guess: Rate) -> LadderResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(LadderError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !has_outflow || !has_inflow {
        return Err(LadderError::InsufficientData(
            "IRR requires both a negative and a positive cash flow".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_and_derivative(rate, cash_flows);

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(LadderError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        let step = npv_val / dnpv;
        rate = (rate - step).clamp(MIN_RATE, MAX_RATE);

        if step.abs() < RATE_TOLERANCE {
            return Ok(rate);
        }
    }

    Err(LadderError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv_and_derivative(rate, cash_flows).0,
    })
}

/// NPV and its first derivative with respect to the rate. The discount
/// factor is built incrementally; terms whose factor leaves Decimal range are
/// dropped, which only happens at the clamped rate bounds.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> (Decimal, Decimal) {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) => d,
                None => break,
            };
        }
        let Some(pv) = cf.checked_div(discount) else {
            continue;
        };
        npv_val += pv;
        if t > 0 {
            if let Some(d) = (Decimal::from(t as i64) * pv).checked_div(one_plus_r) {
                dnpv -= d;
            }
        }
    }

    (npv_val, dnpv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let (result, _) = npv_and_derivative(dec!(0.10), &cfs);
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let (result, derivative) = npv_and_derivative(dec!(0.0), &cfs);
        assert_eq!(result, dec!(50));
        // -(1*50 + 2*50 + 3*50)
        assert_eq!(derivative, dec!(-300));
    }

    #[test]
    fn test_irr_even_annuity() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.05)).unwrap();
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_long_ladder_series() {
        // 25 years of level payouts on a 5.6M outlay, roughly the size of a
        // retirement ladder
        let mut cfs = vec![dec!(-5605153)];
        cfs.extend(std::iter::repeat(dec!(414000)).take(25));
        let result = irr(&cfs, dec!(0.05)).unwrap();
        assert!(result > dec!(0.04) && result < dec!(0.06), "got {result}");
    }

    #[test]
    fn test_irr_all_zero_is_insufficient() {
        let cfs = vec![Decimal::ZERO; 4];
        assert!(matches!(
            irr(&cfs, dec!(0.05)),
            Err(LadderError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_irr_requires_two_flows() {
        assert!(irr(&[dec!(-100)], dec!(0.05)).is_err());
    }
}
