use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::simulation::input::{SimulationDraft, SimulationInput};
use crate::simulation::validation::{percent_in_range, violations};
use crate::time_value::price_coefficient;
use crate::types::*;
use crate::LoanSimResult;

/// Supplied and derived coefficients further apart than this raise a warning.
const COEFFICIENT_DRIFT_TOLERANCE: Decimal = dec!(0.0001);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub bank: String,
    pub outstanding_balance: Money,
    pub monthly_interest_rate: Percent,
    pub installment_count: u32,
    pub mandatory_insurance: Money,
    pub consultancy_percentage: Percent,
    /// Coefficient used, 7 decimal places.
    pub coefficient: Decimal,
    pub installment_amount: Money,
    /// Installment times installment count.
    pub total_financed: Money,
    /// Outstanding balance plus mandatory insurance.
    pub disbursed_amount: Money,
    pub consultancy_cost: Money,
    pub net_amount: Money,
    /// What the client is paid; always equal to `net_amount`.
    pub client_disbursement: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// PRICE amortization coefficient from a monthly rate given in percent.
///
/// A zero rate degenerates to straight-line division, `1 / installment_count`.
pub fn compute_amortization_coefficient(
    monthly_rate_percent: Percent,
    installment_count: u32,
) -> LoanSimResult<Decimal> {
    if installment_count == 0 {
        return Err(LoanSimError::InvalidInput {
            field: "installment_count".into(),
            reason: "Installment count must be at least 1".into(),
        });
    }
    if !percent_in_range(Some(monthly_rate_percent)) {
        return Err(LoanSimError::InvalidInput {
            field: "monthly_interest_rate".into(),
            reason: "Monthly rate must be between 0% and 100%".into(),
        });
    }
    price_coefficient(percent_to_rate(monthly_rate_percent), installment_count)
}

/// Run a single-contract loan simulation.
///
/// Inputs are re-checked against the validation rules; the first broken rule
/// fails the call with [`LoanSimError::InvalidInput`]. Monetary outputs are
/// rounded to cents and the coefficient to 7 places. The installment is
/// priced with the unrounded coefficient unless the caller supplied one.
pub fn calculate_simulation(
    input: &SimulationInput,
) -> LoanSimResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    assert_preconditions(input)?;

    let derived = compute_amortization_coefficient(
        input.monthly_interest_rate,
        input.installment_count,
    )?;
    let coefficient = match input.coefficient {
        Some(supplied) => {
            if (supplied - derived).abs() > COEFFICIENT_DRIFT_TOLERANCE {
                warnings.push(format!(
                    "Supplied coefficient {supplied} differs from the rate-derived {}",
                    round_coefficient(derived)
                ));
            }
            supplied
        }
        None => derived,
    };

    let installments = Decimal::from(input.installment_count);
    let installment_amount = round_money(checked_product(
        input.outstanding_balance,
        coefficient,
        "outstanding_balance",
    )?);
    let total_financed = round_money(checked_product(
        installment_amount,
        installments,
        "outstanding_balance",
    )?);

    let disbursed_amount = round_money(checked_total(
        [input.outstanding_balance, input.mandatory_insurance],
        "mandatory_insurance",
    )?);
    let consultancy_cost = round_money(checked_product(
        disbursed_amount,
        percent_to_rate(input.consultancy_percentage),
        "consultancy_percentage",
    )?);
    let net_amount = disbursed_amount - consultancy_cost;

    if input.consultancy_percentage == ONE_HUNDRED {
        warnings.push("Consultancy fee consumes the entire disbursed amount".into());
    }

    let output = SimulationResult {
        bank: input.bank.clone(),
        outstanding_balance: input.outstanding_balance,
        monthly_interest_rate: input.monthly_interest_rate,
        installment_count: input.installment_count,
        mandatory_insurance: input.mandatory_insurance,
        consultancy_percentage: input.consultancy_percentage,
        coefficient: round_coefficient(coefficient),
        installment_amount,
        total_financed,
        disbursed_amount,
        consultancy_cost,
        net_amount,
        client_disbursement: net_amount,
    };

    log::debug!(
        "simulation bank={} balance={} n={} coefficient={} client_disbursement={}",
        output.bank,
        output.outstanding_balance,
        output.installment_count,
        output.coefficient,
        output.client_disbursement
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "coefficient_source": if input.coefficient.is_some() { "supplied" } else { "derived" },
        "money_decimal_places": MONEY_DP,
        "coefficient_decimal_places": COEFFICIENT_DP,
    });

    Ok(with_metadata(
        "PRICE fixed-installment amortization",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

pub(crate) fn assert_preconditions(input: &SimulationInput) -> LoanSimResult<()> {
    let draft = SimulationDraft::from(input);
    match violations(&draft).first() {
        Some(violation) => Err(LoanSimError::InvalidInput {
            field: violation.field.into(),
            reason: violation.message.into(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> SimulationInput {
        SimulationInput {
            bank: "Bradesco".into(),
            outstanding_balance: dec!(30000),
            installment_count: 96,
            monthly_interest_rate: dec!(1.8),
            mandatory_insurance: dec!(1000),
            consultancy_percentage: dec!(12),
            coefficient: None,
        }
    }

    #[test]
    fn test_coefficient_known_answer() {
        // 0.018 / (1 - 1.018^-96) = 0.0219616742
        let c = compute_amortization_coefficient(dec!(1.8), 96).unwrap();
        assert_eq!(round_coefficient(c), dec!(0.0219617));
    }

    #[test]
    fn test_coefficient_zero_rate_is_straight_line() {
        let c = compute_amortization_coefficient(Decimal::ZERO, 7).unwrap();
        assert_eq!(c, Decimal::ONE / dec!(7));
    }

    #[test]
    fn test_coefficient_zero_installments_rejected() {
        let err = compute_amortization_coefficient(dec!(1.8), 0).unwrap_err();
        match err {
            LoanSimError::InvalidInput { field, .. } => assert_eq!(field, "installment_count"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_coefficient_rate_above_hundred_rejected() {
        assert!(compute_amortization_coefficient(dec!(100.5), 12).is_err());
    }

    #[test]
    fn test_simulation_known_answer() {
        let out = calculate_simulation(&base_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.coefficient, dec!(0.0219617));
        assert_eq!(r.installment_amount, dec!(658.85));
        assert_eq!(r.total_financed, dec!(63249.60));
        assert_eq!(r.disbursed_amount, dec!(31000));
        assert_eq!(r.consultancy_cost, dec!(3720));
        assert_eq!(r.net_amount, dec!(27280));
        assert_eq!(r.client_disbursement, r.net_amount);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_supplied_coefficient_is_used() {
        let input = SimulationInput {
            coefficient: Some(dec!(0.025)),
            ..base_input()
        };
        let out = calculate_simulation(&input).unwrap();
        assert_eq!(out.result.coefficient, dec!(0.025));
        assert_eq!(out.result.installment_amount, dec!(750));
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.assumptions["coefficient_source"], "supplied");
    }

    #[test]
    fn test_matching_supplied_coefficient_no_warning() {
        let input = SimulationInput {
            coefficient: Some(dec!(0.0219617)),
            ..base_input()
        };
        let out = calculate_simulation(&input).unwrap();
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_full_consultancy_warns() {
        let input = SimulationInput {
            consultancy_percentage: dec!(100),
            ..base_input()
        };
        let out = calculate_simulation(&input).unwrap();
        assert_eq!(out.result.client_disbursement, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_zero_installments_fail_fast() {
        let input = SimulationInput {
            installment_count: 0,
            ..base_input()
        };
        let err = calculate_simulation(&input).unwrap_err();
        match err {
            LoanSimError::InvalidInput { field, reason } => {
                assert_eq!(field, "installment_count");
                assert_eq!(reason, "installment count must be between 1 and 240");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_bank_fails_fast() {
        let input = SimulationInput {
            bank: " ".into(),
            ..base_input()
        };
        assert!(calculate_simulation(&input).is_err());
    }

    #[test]
    fn test_disbursement_overflow_is_an_error() {
        let input = SimulationInput {
            outstanding_balance: Decimal::MAX,
            installment_count: 1,
            monthly_interest_rate: Decimal::ZERO,
            mandatory_insurance: dec!(1000),
            consultancy_percentage: dec!(10),
            ..base_input()
        };
        let draft = SimulationDraft::from(&input);
        assert!(crate::simulation::validation::validate_simulation_input(&draft).is_empty());
        match calculate_simulation(&input).unwrap_err() {
            LoanSimError::InvalidInput { field, reason } => {
                assert_eq!(field, "mandatory_insurance");
                assert!(reason.contains("range"));
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_installment_overflow_names_the_balance() {
        // 100% a month over one installment doubles the balance
        let input = SimulationInput {
            outstanding_balance: Decimal::MAX,
            installment_count: 1,
            monthly_interest_rate: dec!(100),
            mandatory_insurance: Decimal::ZERO,
            ..base_input()
        };
        match calculate_simulation(&input).unwrap_err() {
            LoanSimError::InvalidInput { field, .. } => assert_eq!(field, "outstanding_balance"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_metadata_populated() {
        let out = calculate_simulation(&base_input()).unwrap();
        assert!(!out.methodology.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert_eq!(out.metadata.rounding, "half_away_from_zero");
    }
}
