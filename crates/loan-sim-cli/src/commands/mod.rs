pub mod portability;
pub mod simulation;
