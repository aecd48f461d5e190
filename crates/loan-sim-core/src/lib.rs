pub mod error;
pub mod simulation;
pub mod time_value;
pub mod types;

#[cfg(feature = "portability")]
pub mod portability;

#[cfg(feature = "schedule")]
pub mod schedule;

pub use error::LoanSimError;
pub use simulation::{
    calculate_simulation, compute_amortization_coefficient, validate_simulation_input,
    SimulationDraft, SimulationInput, SimulationResult,
};
pub use types::*;

/// Standard result type for all loan-sim operations
pub type LoanSimResult<T> = Result<T, LoanSimError>;
