use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanSimError;
use crate::LoanSimResult;

/// All monetary values (BRL). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.018 = 1.8% a month).
pub type Rate = Decimal;

/// Rates and fees as the back office enters them (1.8 = 1.8%).
pub type Percent = Decimal;

/// Decimal places kept on every monetary output.
pub const MONEY_DP: u32 = 2;

/// Decimal places kept on amortization coefficients.
pub const COEFFICIENT_DP: u32 = 7;

/// Shortest and longest payroll-loan terms the back office accepts.
pub const MIN_INSTALLMENTS: i64 = 1;
pub const MAX_INSTALLMENTS: i64 = 240;

pub(crate) const ONE_HUNDRED: Decimal = dec!(100);

/// Round a monetary value to cents, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round an amortization coefficient to 7 places, half away from zero.
pub fn round_coefficient(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COEFFICIENT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a percentage (1.8) into a decimal rate (0.018).
pub fn percent_to_rate(percent: Percent) -> Rate {
    percent / ONE_HUNDRED
}

/// `left * right`, or `InvalidInput` on `field` when the product leaves the
/// 128-bit decimal range.
pub(crate) fn checked_product(left: Decimal, right: Decimal, field: &str) -> LoanSimResult<Decimal> {
    left.checked_mul(right).ok_or_else(|| out_of_range(field))
}

/// Overflow-checked sum of `values`.
pub(crate) fn checked_total(
    values: impl IntoIterator<Item = Decimal>,
    field: &str,
) -> LoanSimResult<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).ok_or_else(|| out_of_range(field))
    })
}

pub(crate) fn out_of_range(field: &str) -> LoanSimError {
    LoanSimError::InvalidInput {
        field: field.into(),
        reason: "Result exceeds the representable decimal range".into(),
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
    pub rounding: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
            rounding: "half_away_from_zero".to_string(),
        },
    }
}
