//! Multi-bank portability (refinance) simulation.
//!
//! A client's payroll loans at several banks are ported into one operation.
//! Each contract keeps its installment; the new contract value is the ported
//! balance plus the fresh money released on top of it. The consultancy fee
//! is charged over the combined contract value, and mandatory insurance is
//! deducted once from the client payout.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::simulation::validation::{
    installment_count_in_range, percent_in_range, CONSULTANCY_OUT_OF_RANGE,
    INSTALLMENTS_OUT_OF_RANGE, INSURANCE_NEGATIVE,
};
use crate::time_value::implied_monthly_rate;
use crate::types::*;
use crate::LoanSimResult;

/// Implied rates are reported in percent with this many places.
const IMPLIED_RATE_DP: u32 = 4;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankContract {
    pub bank: String,
    #[serde(alias = "installmentAmount")]
    pub installment_amount: Money,
    /// Balance ported from the original lender.
    #[serde(alias = "outstandingBalance")]
    pub outstanding_balance: Money,
    /// New money released on top of the ported balance.
    #[serde(alias = "disbursedAmount")]
    pub disbursed_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortabilityInput {
    pub contracts: Vec<BankContract>,
    #[serde(alias = "installmentCount")]
    pub installment_count: u32,
    #[serde(alias = "consultancyPercentage")]
    pub consultancy_percentage: Percent,
    #[serde(alias = "mandatoryInsurance", default)]
    pub mandatory_insurance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractBreakdown {
    pub bank: String,
    pub installment_amount: Money,
    pub outstanding_balance: Money,
    pub disbursed_amount: Money,
    /// Ported balance plus released money.
    pub contract_value: Money,
    /// Installment over contract value, 7 decimal places.
    pub coefficient: Decimal,
    /// Monthly rate in percent implied by the coefficient, when it could be solved.
    pub implied_monthly_rate: Option<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortabilityResult {
    pub contracts: Vec<ContractBreakdown>,
    pub installment_count: u32,
    pub total_installment: Money,
    pub total_outstanding_balance: Money,
    pub total_disbursed: Money,
    pub total_contract_value: Money,
    /// Total installment times installment count.
    pub total_financed: Money,
    pub consultancy_cost: Money,
    pub mandatory_insurance: Money,
    /// Released money minus consultancy and insurance.
    pub client_disbursement: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check every portability rule and return one message per broken rule.
pub fn validate_portability_input(input: &PortabilityInput) -> Vec<String> {
    let mut messages = Vec::new();

    if input.contracts.is_empty() {
        messages.push("at least one bank contract is required".to_string());
    }
    if !installment_count_in_range(Some(i64::from(input.installment_count))) {
        messages.push(INSTALLMENTS_OUT_OF_RANGE.to_string());
    }
    if !percent_in_range(Some(input.consultancy_percentage)) {
        messages.push(CONSULTANCY_OUT_OF_RANGE.to_string());
    }
    if input.mandatory_insurance < Decimal::ZERO {
        messages.push(INSURANCE_NEGATIVE.to_string());
    }

    for (idx, contract) in input.contracts.iter().enumerate() {
        let n = idx + 1;
        if contract.bank.trim().is_empty() {
            messages.push(format!("contract {n}: bank is required"));
        }
        if contract.installment_amount <= Decimal::ZERO {
            messages.push(format!(
                "contract {n}: installment amount must be greater than zero"
            ));
        }
        if contract.outstanding_balance < Decimal::ZERO {
            messages.push(format!("contract {n}: balance must be non-negative"));
        }
        if contract.disbursed_amount < Decimal::ZERO {
            messages.push(format!("contract {n}: disbursed amount must be non-negative"));
        }
        match contract
            .outstanding_balance
            .checked_add(contract.disbursed_amount)
        {
            Some(value) if value <= Decimal::ZERO => messages.push(format!(
                "contract {n}: balance plus disbursed amount must be greater than zero"
            )),
            None => messages.push(format!(
                "contract {n}: balance plus disbursed amount is too large"
            )),
            Some(_) => {}
        }
    }

    messages
}

/// Aggregate several bank contracts into a single client payout.
pub fn calculate_portability(
    input: &PortabilityInput,
) -> LoanSimResult<ComputationOutput<PortabilityResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let messages = validate_portability_input(input);
    if !messages.is_empty() {
        return Err(LoanSimError::ValidationFailed(messages));
    }

    let mut contracts = Vec::with_capacity(input.contracts.len());
    for contract in &input.contracts {
        let outstanding_balance = round_money(contract.outstanding_balance);
        let disbursed_amount = round_money(contract.disbursed_amount);
        let installment_amount = round_money(contract.installment_amount);
        let contract_value =
            checked_total([outstanding_balance, disbursed_amount], "disbursed_amount")?;
        if contract_value.is_zero() {
            return Err(LoanSimError::DivisionByZero {
                context: format!("contract value for {}", contract.bank),
            });
        }
        let coefficient = installment_amount / contract_value;

        let implied = match implied_monthly_rate(coefficient, input.installment_count) {
            Ok(rate) => Some((rate * dec!(100)).round_dp_with_strategy(
                IMPLIED_RATE_DP,
                RoundingStrategy::MidpointAwayFromZero,
            )),
            Err(e) => {
                warnings.push(format!("{}: implied rate unavailable: {e}", contract.bank));
                None
            }
        };

        contracts.push(ContractBreakdown {
            bank: contract.bank.trim().to_string(),
            installment_amount,
            outstanding_balance,
            disbursed_amount,
            contract_value,
            coefficient: round_coefficient(coefficient),
            implied_monthly_rate: implied,
        });
    }

    let total_installment =
        checked_total(contracts.iter().map(|c| c.installment_amount), "installment_amount")?;
    let total_outstanding_balance =
        checked_total(contracts.iter().map(|c| c.outstanding_balance), "outstanding_balance")?;
    let total_disbursed =
        checked_total(contracts.iter().map(|c| c.disbursed_amount), "disbursed_amount")?;
    let total_contract_value =
        checked_total(contracts.iter().map(|c| c.contract_value), "outstanding_balance")?;
    let total_financed = checked_product(
        total_installment,
        Decimal::from(input.installment_count),
        "installment_amount",
    )?;

    let mandatory_insurance = round_money(input.mandatory_insurance);
    let consultancy_cost = round_money(checked_product(
        total_contract_value,
        percent_to_rate(input.consultancy_percentage),
        "consultancy_percentage",
    )?);
    let client_disbursement = total_disbursed
        .checked_sub(consultancy_cost)
        .and_then(|v| v.checked_sub(mandatory_insurance))
        .ok_or_else(|| out_of_range("mandatory_insurance"))?;

    if client_disbursement < Decimal::ZERO {
        warnings.push(format!(
            "Consultancy and insurance exceed the released money by {}",
            -client_disbursement
        ));
    }

    log::debug!(
        "portability contracts={} total_contract_value={} client_disbursement={}",
        contracts.len(),
        total_contract_value,
        client_disbursement
    );

    let output = PortabilityResult {
        contracts,
        installment_count: input.installment_count,
        total_installment,
        total_outstanding_balance,
        total_disbursed,
        total_contract_value,
        total_financed,
        consultancy_cost,
        mandatory_insurance,
        client_disbursement,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "consultancy_base": "total_contract_value",
        "insurance_deducted_from": "client_disbursement",
        "implied_rate_method": "newton_raphson",
    });

    Ok(with_metadata(
        "Multi-bank portability with consultancy over contract value",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
