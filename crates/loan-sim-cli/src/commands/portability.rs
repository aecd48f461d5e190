use clap::Args;
use serde_json::Value;

use loan_sim_core::portability::{self, PortabilityInput};

use crate::input;

/// Arguments for a multi-bank portability quote
#[derive(Args)]
pub struct PortabilityArgs {
    /// Path to JSON or YAML input file with the contracts to port
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_portability(args: PortabilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quote: PortabilityInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for portability (contracts list)".into());
    };
    let result = portability::calculate_portability(&quote)?;
    Ok(serde_json::to_value(result)?)
}
