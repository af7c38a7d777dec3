//! Hybrid data-center power dispatch simulator.
//!
//! A computing facility draws power from the grid, a remote wind farm, local
//! solar and a battery. Every step the dispatcher solves a small linear
//! program that meets the facility load at least cost, and the run is
//! summarized into energy, emissions and cost totals.

pub mod analysis;
pub mod config;
pub mod devices;
pub mod error;
pub mod io;
/// Simulation engine, dispatch, metrics and clock.
pub mod sim;

pub use config::SimulationConfig;
pub use error::SimError;
