use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Serialize;

use loan_sim_core::portability::{self, PortabilityInput};
use loan_sim_core::schedule;
use loan_sim_core::simulation::{self, SimulationDraft, SimulationInput};
use loan_sim_core::time_value;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Serialize)]
struct ValidationReport {
    valid: bool,
    errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_simulation(input_json: String) -> NapiResult<String> {
    let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulation::calculate_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn validate_simulation_input(input_json: String) -> NapiResult<String> {
    let draft: SimulationDraft = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let errors = simulation::validate_simulation_input(&draft);
    let report = ValidationReport {
        valid: errors.is_empty(),
        errors,
    };
    serde_json::to_string(&report).map_err(to_napi_error)
}

#[napi]
pub fn amortization_coefficient(monthly_rate: String, installment_count: u32) -> NapiResult<String> {
    let rate: Decimal = monthly_rate.trim().parse().map_err(to_napi_error)?;
    let coefficient = simulation::compute_amortization_coefficient(rate, installment_count)
        .map_err(to_napi_error)?;
    Ok(loan_sim_core::round_coefficient(coefficient).to_string())
}

/// Effective annual rate in percent to the equivalent monthly rate in percent.
#[napi]
pub fn monthly_rate_from_annual(annual_rate: String) -> NapiResult<String> {
    let annual: Decimal = annual_rate.trim().parse().map_err(to_napi_error)?;
    let monthly = time_value::annual_to_monthly_rate(loan_sim_core::percent_to_rate(annual))
        .map_err(to_napi_error)?;
    Ok((monthly * Decimal::ONE_HUNDRED).round_dp(6).to_string())
}

/// Balance amortized by `installment_count` installments at a monthly rate in percent.
#[napi]
pub fn present_value_of_installments(
    installment: String,
    monthly_rate: String,
    installment_count: u32,
) -> NapiResult<String> {
    let installment: Decimal = installment.trim().parse().map_err(to_napi_error)?;
    let rate: Decimal = monthly_rate.trim().parse().map_err(to_napi_error)?;
    let present_value = time_value::present_value_of_installments(
        installment,
        loan_sim_core::percent_to_rate(rate),
        installment_count,
    )
    .map_err(to_napi_error)?;
    Ok(loan_sim_core::round_money(present_value).to_string())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = schedule::build_amortization_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portability
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_portability(input_json: String) -> NapiResult<String> {
    let input: PortabilityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = portability::calculate_portability(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
