use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use loan_sim_core::simulation::{self, SimulationDraft, SimulationInput};
use loan_sim_core::{percent_to_rate, round_coefficient, round_money, schedule, time_value};

use crate::input;

/// Loan parameters shared by simulate, validate and schedule
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Bank the simulation is priced for
    #[arg(long)]
    pub bank: Option<String>,

    /// Outstanding balance
    #[arg(long, alias = "outstanding-balance", allow_hyphen_values = true)]
    pub balance: Option<Decimal>,

    /// Number of monthly installments (1 to 240)
    #[arg(long, alias = "installment-count", allow_hyphen_values = true)]
    pub installments: Option<i64>,

    /// Monthly interest rate in percent (e.g. 1.8)
    #[arg(long, alias = "monthly-interest-rate", allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Mandatory insurance
    #[arg(long, alias = "mandatory-insurance", allow_hyphen_values = true)]
    pub insurance: Option<Decimal>,

    /// Consultancy fee, percent of the disbursed amount
    #[arg(long, alias = "consultancy-percentage", allow_hyphen_values = true)]
    pub consultancy: Option<Decimal>,

    /// Pre-negotiated amortization coefficient
    #[arg(long, allow_hyphen_values = true)]
    pub coefficient: Option<Decimal>,
}

/// Arguments for a bare coefficient lookup
#[derive(Args)]
pub struct CoefficientArgs {
    /// Monthly interest rate in percent
    #[arg(long, conflicts_with = "annual_rate", required_unless_present = "annual_rate")]
    pub rate: Option<Decimal>,

    /// Effective annual rate in percent, converted to the equivalent monthly rate
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long)]
    pub installments: u32,

    /// Installment amount; also reports the balance it amortizes
    #[arg(long)]
    pub installment: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    errors: Vec<String>,
}

pub fn run_simulate(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = SimulationInput::try_from(resolve_draft(args)?)?;
    let result = simulation::calculate_simulation(&loan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_validate(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let errors = simulation::validate_simulation_input(&resolve_draft(args)?);
    let report = ValidationReport {
        valid: errors.is_empty(),
        errors,
    };
    Ok(serde_json::to_value(report)?)
}

pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = SimulationInput::try_from(resolve_draft(args)?)?;
    let result = schedule::build_amortization_schedule(&loan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_coefficient(args: CoefficientArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let monthly_percent = match (args.rate, args.annual_rate) {
        (Some(rate), _) => rate,
        (None, Some(annual)) => {
            time_value::annual_to_monthly_rate(percent_to_rate(annual))? * Decimal::ONE_HUNDRED
        }
        (None, None) => return Err("--rate or --annual-rate is required".into()),
    };
    let coefficient =
        simulation::compute_amortization_coefficient(monthly_percent, args.installments)?;

    let mut result = serde_json::json!({
        "monthly_interest_rate": monthly_percent.round_dp(6),
        "installment_count": args.installments,
        "coefficient": round_coefficient(coefficient),
    });
    if let Some(installment) = args.installment {
        let present_value = time_value::present_value_of_installments(
            installment,
            percent_to_rate(monthly_percent),
            args.installments,
        )?;
        result["present_value"] = serde_json::to_value(round_money(present_value))?;
    }
    Ok(serde_json::json!({ "result": result }))
}

/// Input precedence: `--input` file, then piped stdin, then individual flags.
fn resolve_draft(args: LoanArgs) -> Result<SimulationDraft, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Ok(draft_from_flags(args))
}

fn draft_from_flags(args: LoanArgs) -> SimulationDraft {
    SimulationDraft {
        bank: args.bank,
        outstanding_balance: args.balance,
        installment_count: args.installments,
        monthly_interest_rate: args.rate,
        mandatory_insurance: args.insurance,
        consultancy_percentage: args.consultancy,
        coefficient: args.coefficient,
    }
}
