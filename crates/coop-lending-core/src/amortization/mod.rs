pub mod affordability;
pub mod schedule;
pub mod simulation;
