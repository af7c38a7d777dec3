//! Core simulation types: dispatch inputs, decisions and per-step records.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::devices::facility::LoadBreakdown;
use crate::devices::wind::WindOutput;

/// Demand and renewable availability for one timestep, fed to the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    /// Current simulation timestep index.
    pub timestep: usize,
    /// Facility demand (MW, >= 0).
    pub load_mw: f64,
    /// Wind power delivered at the facility (MW, >= 0).
    pub wind_available_mw: f64,
    /// Solar power available at the facility (MW, >= 0).
    pub solar_available_mw: f64,
}

/// Dispatcher decision for one timestep.
///
/// All flows are non-negative MW; `soc_mwh` is the battery state after the step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DispatchDecision {
    /// Power imported from the grid.
    pub grid_import_mw: f64,
    /// Wind power serving load or charging the battery.
    pub wind_used_mw: f64,
    /// Solar power serving load or charging the battery.
    pub solar_used_mw: f64,
    /// Power into the battery.
    pub battery_charge_mw: f64,
    /// Power out of the battery.
    pub battery_discharge_mw: f64,
    /// Available wind left unused.
    pub wind_curtailed_mw: f64,
    /// Available solar left unused.
    pub solar_curtailed_mw: f64,
    /// Battery state of charge after the step (MWh).
    pub soc_mwh: f64,
}

impl DispatchDecision {
    /// Renewable power actually used.
    pub fn renewable_used_mw(&self) -> f64 {
        self.wind_used_mw + self.solar_used_mw
    }
}

/// Complete record of a single simulation timestep.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Simulation timestep index.
    pub timestep: usize,
    /// Simulated wall-clock time at the start of the step.
    pub timestamp: NaiveDateTime,
    /// Facility demand split by consumer.
    pub load: LoadBreakdown,
    /// Wind generation, line loss and delivered power.
    pub wind: WindOutput,
    /// Solar power available at the facility (MW).
    pub solar_available_mw: f64,
    /// Dispatcher decision.
    pub decision: DispatchDecision,
    /// Demand left unserved (MW); zero for every accepted decision.
    pub deficit_mw: f64,
    /// Share of the load served by wind and solar (0.0 to 1.0).
    pub utilization_ratio: f64,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.decision;
        write!(
            f,
            "t={:>4} ({}) | load={:>6.3} MW | grid={:>6.3}  wind={:>5.3}/{:<5.3}  \
             solar={:>6.3}/{:<6.3} | bat +{:.3} -{:.3} (SoC={:.3} MWh) | renew={:.1}%",
            self.timestep,
            self.timestamp.format("%m-%d %H:%M"),
            self.load.total_mw,
            d.grid_import_mw,
            d.wind_used_mw,
            self.wind.delivered_mw,
            d.solar_used_mw,
            self.solar_available_mw,
            d.battery_charge_mw,
            d.battery_discharge_mw,
            d.soc_mwh,
            self.utilization_ratio * 100.0,
        )
    }
}
