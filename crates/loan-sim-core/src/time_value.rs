use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LoanSimError;
use crate::types::{Money, Rate};
use crate::LoanSimResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.000000000001);
const MAX_NEWTON_ITERATIONS: u32 = 100;
/// Floor for the Newton iterate; the PRICE coefficient is undefined at exactly zero.
const MIN_ITERATE_RATE: Decimal = dec!(0.000000001);

/// PRICE (fixed-installment) amortization coefficient.
///
/// `rate / (1 - (1 + rate)^-nper)`, or `1 / nper` when the rate is zero.
/// When `(1 + rate)^nper` leaves the 128-bit decimal range the discount term
/// is treated as zero and the coefficient collapses to `rate`.
pub fn price_coefficient(rate: Rate, nper: u32) -> LoanSimResult<Decimal> {
    if nper == 0 {
        return Err(LoanSimError::InvalidInput {
            field: "nper".into(),
            reason: "Number of installments must be > 0".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(LoanSimError::InvalidInput {
            field: "rate".into(),
            reason: "Monthly rate cannot be negative".into(),
        });
    }

    if rate.is_zero() {
        return Ok(Decimal::ONE / Decimal::from(nper));
    }

    let discount = discount_factor(rate, nper);
    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return Err(LoanSimError::DivisionByZero {
            context: "PRICE coefficient denominator".into(),
        });
    }

    Ok(rate / denominator)
}

/// Present value of `nper` level installments at a monthly rate.
pub fn present_value_of_installments(installment: Money, rate: Rate, nper: u32) -> LoanSimResult<Money> {
    let coefficient = price_coefficient(rate, nper)?;
    if coefficient.is_zero() {
        return Err(LoanSimError::DivisionByZero {
            context: "present value coefficient".into(),
        });
    }
    installment
        .checked_div(coefficient)
        .ok_or_else(|| LoanSimError::InvalidInput {
            field: "installment".into(),
            reason: "Present value exceeds the representable decimal range".into(),
        })
}

/// Convert an effective annual rate into the equivalent monthly rate.
pub fn annual_to_monthly_rate(annual: Rate) -> LoanSimResult<Rate> {
    if annual <= dec!(-1) {
        return Err(LoanSimError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate must be greater than -100%".into(),
        });
    }
    let exponent = Decimal::ONE / dec!(12);
    let monthly_factor = (Decimal::ONE + annual)
        .checked_powd(exponent)
        .ok_or_else(|| LoanSimError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate is outside the representable range".into(),
        })?;
    Ok(monthly_factor - Decimal::ONE)
}

/// Monthly rate whose PRICE coefficient over `nper` installments equals
/// `coefficient`, found with Newton-Raphson.
///
/// The coefficient is increasing and convex in the rate and always exceeds
/// the rate itself, so iteration starts at `coefficient` and approaches the
/// root from above.
pub fn implied_monthly_rate(coefficient: Decimal, nper: u32) -> LoanSimResult<Rate> {
    if nper == 0 {
        return Err(LoanSimError::InvalidInput {
            field: "nper".into(),
            reason: "Number of installments must be > 0".into(),
        });
    }
    if coefficient <= Decimal::ZERO {
        return Err(LoanSimError::InvalidInput {
            field: "coefficient".into(),
            reason: "Coefficient must be positive".into(),
        });
    }

    let straight_line = Decimal::ONE / Decimal::from(nper);
    if (coefficient - straight_line).abs() < CONVERGENCE_THRESHOLD {
        return Ok(Decimal::ZERO);
    }
    if coefficient < straight_line {
        return Err(LoanSimError::InvalidInput {
            field: "coefficient".into(),
            reason: format!("Coefficient below 1/{nper} implies a negative rate"),
        });
    }

    let mut rate = coefficient;
    let mut delta = Decimal::ZERO;

    for iteration in 0..MAX_NEWTON_ITERATIONS {
        let (value, slope) = coefficient_and_slope(rate, nper);
        delta = value - coefficient;

        if delta.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if slope.is_zero() {
            return Err(LoanSimError::ConvergenceFailure {
                function: "implied monthly rate".into(),
                iterations: iteration,
                last_delta: delta,
            });
        }

        let step = delta.checked_div(slope).ok_or_else(|| LoanSimError::ConvergenceFailure {
            function: "implied monthly rate".into(),
            iterations: iteration,
            last_delta: delta,
        })?;
        rate -= step;

        if rate < MIN_ITERATE_RATE {
            rate = MIN_ITERATE_RATE;
        }
    }

    Err(LoanSimError::ConvergenceFailure {
        function: "implied monthly rate".into(),
        iterations: MAX_NEWTON_ITERATIONS,
        last_delta: delta,
    })
}

/// `(1 + rate)^-nper`, zero once the compounding factor overflows.
fn discount_factor(rate: Rate, nper: u32) -> Decimal {
    match (Decimal::ONE + rate).checked_powu(u64::from(nper)) {
        Some(factor) if !factor.is_zero() => Decimal::ONE / factor,
        _ => Decimal::ZERO,
    }
}

/// PRICE coefficient and its derivative with respect to the rate.
fn coefficient_and_slope(rate: Rate, nper: u32) -> (Decimal, Decimal) {
    let discount = discount_factor(rate, nper);
    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let value = rate / denominator;
    // d/di (1 - v^n) = n * v^(n+1)
    let discount_next = discount / (Decimal::ONE + rate);
    let slope = (denominator - rate * Decimal::from(nper) * discount_next)
        / (denominator * denominator);
    (value, slope)
}
