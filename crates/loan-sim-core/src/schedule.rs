//! Month-by-month PRICE amortization table ("Tabela PRICE").

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::simulation::calculator::assert_preconditions;
use crate::simulation::{compute_amortization_coefficient, SimulationInput};
use crate::types::*;
use crate::LoanSimResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    pub opening_balance: Money,
    pub installment: Money,
    pub interest: Money,
    pub amortization: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub bank: String,
    pub principal: Money,
    pub monthly_interest_rate: Percent,
    pub installment_count: u32,
    pub coefficient: Decimal,
    /// Level installment; the last row may differ by the accumulated cent rounding.
    pub installment_amount: Money,
    pub rows: Vec<ScheduleRow>,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Build the amortization table for a validated simulation.
///
/// Interest accrues on the opening balance each month and is rounded to
/// cents. The final row settles whatever balance is left, so the table always
/// closes at exactly zero. The schedule is always priced from the rate; a
/// caller-supplied coefficient is ignored with a warning.
pub fn build_amortization_schedule(
    input: &SimulationInput,
) -> LoanSimResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    assert_preconditions(input)?;

    if input.coefficient.is_some() {
        warnings.push("Supplied coefficient ignored; schedule uses the rate-derived coefficient".into());
    }

    let coefficient =
        compute_amortization_coefficient(input.monthly_interest_rate, input.installment_count)?;
    let rate = percent_to_rate(input.monthly_interest_rate);
    let principal = round_money(input.outstanding_balance);
    let installment_amount =
        round_money(checked_product(principal, coefficient, "outstanding_balance")?);

    let mut rows: Vec<ScheduleRow> = Vec::with_capacity(input.installment_count as usize);
    let mut balance = principal;

    for month in 1..=input.installment_count {
        let opening_balance = balance;
        let interest = round_money(opening_balance * rate);

        let amortization = if month == input.installment_count {
            opening_balance
        } else {
            (installment_amount - interest).min(opening_balance)
        };

        balance = opening_balance - amortization;
        rows.push(ScheduleRow {
            month,
            opening_balance,
            installment: checked_total([amortization, interest], "outstanding_balance")?,
            interest,
            amortization,
            closing_balance: balance,
        });
    }

    let total_paid = checked_total(rows.iter().map(|r| r.installment), "outstanding_balance")?;
    let total_interest = checked_total(rows.iter().map(|r| r.interest), "outstanding_balance")?;

    if let Some(last) = rows.last() {
        if last.installment != installment_amount {
            log::debug!(
                "schedule final installment {} absorbs rounding against level {}",
                last.installment,
                installment_amount
            );
        }
    }

    let output = AmortizationSchedule {
        bank: input.bank.clone(),
        principal,
        monthly_interest_rate: input.monthly_interest_rate,
        installment_count: input.installment_count,
        coefficient: round_coefficient(coefficient),
        installment_amount,
        rows,
        total_paid,
        total_interest,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "interest_basis": "opening_balance",
        "final_row": "settles_remaining_balance",
    });

    Ok(with_metadata(
        "PRICE amortization table",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn twelve_month_loan() -> SimulationInput {
        SimulationInput {
            bank: "Santander".into(),
            outstanding_balance: dec!(12000),
            installment_count: 12,
            monthly_interest_rate: dec!(1),
            mandatory_insurance: Decimal::ZERO,
            consultancy_percentage: Decimal::ZERO,
            coefficient: None,
        }
    }

    #[test]
    fn test_level_installment() {
        let out = build_amortization_schedule(&twelve_month_loan()).unwrap();
        assert_eq!(out.result.installment_amount, dec!(1066.19));
        assert_eq!(out.result.coefficient, dec!(0.0888488));
        assert_eq!(out.result.rows.len(), 12);
    }

    #[test]
    fn test_first_and_last_rows() {
        let out = build_amortization_schedule(&twelve_month_loan()).unwrap();
        let rows = &out.result.rows;

        let first = &rows[0];
        assert_eq!(first.interest, dec!(120));
        assert_eq!(first.amortization, dec!(946.19));
        assert_eq!(first.closing_balance, dec!(11053.81));

        let last = &rows[11];
        assert_eq!(last.interest, dec!(10.56));
        assert_eq!(last.installment, dec!(1066.14));
        assert_eq!(last.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_totals() {
        let out = build_amortization_schedule(&twelve_month_loan()).unwrap();
        let s = &out.result;
        assert_eq!(s.total_paid, dec!(12794.23));
        assert_eq!(s.total_interest, dec!(794.23));
        assert_eq!(s.total_paid - s.total_interest, s.principal);
    }

    #[test]
    fn test_zero_rate_schedule() {
        let input = SimulationInput {
            outstanding_balance: dec!(30000),
            installment_count: 7,
            monthly_interest_rate: Decimal::ZERO,
            ..twelve_month_loan()
        };
        let out = build_amortization_schedule(&input).unwrap();
        let s = &out.result;
        assert_eq!(s.installment_amount, dec!(4285.71));
        assert_eq!(s.total_interest, Decimal::ZERO);
        assert_eq!(s.total_paid, dec!(30000));
        assert_eq!(s.rows[6].installment, dec!(4285.74));
    }

    #[test]
    fn test_total_paid_overflow_is_an_error() {
        // every row fits, 240 installments of 1e27 do not
        let input = SimulationInput {
            outstanding_balance: dec!(1000000000000000000000000000),
            installment_count: 240,
            monthly_interest_rate: dec!(100),
            ..twelve_month_loan()
        };
        match build_amortization_schedule(&input).unwrap_err() {
            crate::LoanSimError::InvalidInput { field, .. } => assert_eq!(field, "outstanding_balance"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_balances_chain() {
        let out = build_amortization_schedule(&twelve_month_loan()).unwrap();
        for pair in out.result.rows.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
    }

    #[test]
    fn test_supplied_coefficient_warns() {
        let input = SimulationInput {
            coefficient: Some(dec!(0.09)),
            ..twelve_month_loan()
        };
        let out = build_amortization_schedule(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.result.installment_amount, dec!(1066.19));
    }
}
