/// Simulation clock for timestep management.
pub mod clock;
/// Per-step LP dispatch of grid, renewables and battery.
pub mod dispatch;
pub mod engine;
pub mod metrics;
pub mod power_balance;
pub mod types;
