//! Single-contract PRICE loan simulation.
//!
//! A [`SimulationDraft`] is whatever a form or a JSON body handed us; it only
//! becomes a [`SimulationInput`] once every rule in [`validation`] passes.
//! [`calculator::calculate_simulation`] turns a validated input into a
//! [`SimulationResult`] and re-checks the same rules on the way in.

pub mod calculator;
pub mod input;
pub mod validation;

pub use calculator::{calculate_simulation, compute_amortization_coefficient, SimulationResult};
pub use input::{SimulationDraft, SimulationInput};
pub use validation::validate_simulation_input;
