mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::portability::PortabilityArgs;
use commands::simulation::{CoefficientArgs, LoanArgs};

/// Payroll-deductible loan simulations with decimal precision
#[derive(Parser)]
#[command(
    name = "loansim",
    version,
    about = "Payroll-deductible loan simulations with decimal precision",
    long_about = "A CLI for pricing fixed-installment loans with decimal precision. \
                  Supports loan simulation, input validation, amortization schedules, \
                  coefficient lookup, and multi-bank portability quotes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a loan: coefficient, installment, fees and client payout
    Simulate(LoanArgs),
    /// Check loan parameters and list every failing rule
    Validate(LoanArgs),
    /// Month-by-month amortization table
    Schedule(LoanArgs),
    /// Amortization coefficient for a rate and term
    Coefficient(CoefficientArgs),
    /// Quote a refinance consolidating contracts from other banks
    Portability(PortabilityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulation::run_simulate(args),
        Commands::Validate(args) => commands::simulation::run_validate(args),
        Commands::Schedule(args) => commands::simulation::run_schedule(args),
        Commands::Coefficient(args) => commands::simulation::run_coefficient(args),
        Commands::Portability(args) => commands::portability::run_portability(args),
        Commands::Version => {
            println!("loansim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            // A failed validation report is still a failure for scripts
            let code = if value.get("valid") == Some(&serde_json::Value::Bool(false)) {
                1
            } else {
                0
            };
            process::exit(code);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
