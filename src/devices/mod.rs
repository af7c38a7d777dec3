//! Generation, storage and load models of the hybrid power system.

/// Stationary battery storage model.
pub mod battery;
/// Data-center load model.
pub mod facility;
/// Solar generation model.
pub mod solar;
pub mod spline;
/// Transmission line loss model.
pub mod transmission;
pub mod types;
/// Wind farm generation model.
pub mod wind;

// Re-export the main types for convenience
pub use battery::{BatteryParams, BatteryState};
pub use facility::{FacilityLoad, LoadBreakdown};
pub use solar::SolarFarm;
pub use transmission::TransmissionLine;
pub use types::DeviceContext;
pub use wind::{WindFarm, WindOutput};
