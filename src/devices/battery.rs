use serde::Serialize;

use crate::config::BatteryConfig;

/// Static parameters of a battery energy storage system.
///
/// `BatteryParams` carries no state of charge; the SOC lives in
/// [`BatteryState`] and advances only through [`BatteryParams::next_soc`].
///
/// # Power Flow Convention
/// - Charge: power drawn from the bus into the battery (MW, non-negative)
/// - Discharge: power delivered from the battery to the bus (MW, non-negative)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryParams {
    /// Battery capacity in megawatt-hours.
    pub capacity_mwh: f64,

    /// Lowest allowed state of charge as a fraction of capacity.
    pub min_soc_fraction: f64,

    /// Charge and discharge power limit in megawatts.
    pub max_rate_mw: f64,

    /// Charging efficiency (0..1.0].
    pub eta_c: f64,

    /// Discharging efficiency (0..1.0].
    pub eta_d: f64,
}

/// Energy stored in the battery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryState {
    /// State of charge in megawatt-hours.
    pub soc_mwh: f64,
}

impl BatteryParams {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            capacity_mwh: config.capacity_mwh.max(0.0),
            min_soc_fraction: config.min_soc_fraction,
            max_rate_mw: config.max_charge_rate_mw.max(0.0),
            eta_c: config.charge_efficiency,
            eta_d: config.discharge_efficiency,
        }
    }

    /// State at the start of a run.
    pub fn initial_state(config: &BatteryConfig) -> BatteryState {
        BatteryState {
            soc_mwh: config.initial_soc_fraction * config.capacity_mwh.max(0.0),
        }
    }

    /// Lowest allowed SOC (MWh).
    pub fn min_soc_mwh(&self) -> f64 {
        self.min_soc_fraction * self.capacity_mwh
    }

    /// Highest allowed SOC (MWh).
    pub fn max_soc_mwh(&self) -> f64 {
        self.capacity_mwh
    }

    /// SOC after one step of `charge_mw` and `discharge_mw` lasting `dt_hours`.
    ///
    /// Charging stores `charge × η_c`; discharging draws `discharge / η_d`
    /// from storage. The result is not clamped.
    pub fn next_soc(&self, soc_mwh: f64, charge_mw: f64, discharge_mw: f64, dt_hours: f64) -> f64 {
        soc_mwh + (charge_mw * self.eta_c - discharge_mw / self.eta_d) * dt_hours
    }

    /// Clamps `soc_mwh` into `[min_soc, capacity]`.
    pub fn clamp_soc(&self, soc_mwh: f64) -> f64 {
        soc_mwh.clamp(self.min_soc_mwh(), self.max_soc_mwh())
    }
}

impl BatteryState {
    /// SOC as a fraction of `params.capacity_mwh`, 0 for a zero-capacity battery.
    pub fn fraction(&self, params: &BatteryParams) -> f64 {
        if params.capacity_mwh > 0.0 {
            self.soc_mwh / params.capacity_mwh
        } else {
            0.0
        }
    }
}
