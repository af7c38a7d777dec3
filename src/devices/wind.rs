use std::f64::consts::PI;

use serde::Serialize;

use super::spline::CubicSpline;
use super::transmission::TransmissionLine;
use crate::config::{ConfigError, SimulationConfig, WindConfig};

/// Turbulence intensity of the simplified IEC class B perturbation.
pub const TURBULENCE_INTENSITY: f64 = 0.1;

/// Wind speed at which a turbine reaches its nameplate rating (m/s).
pub const RATED_WIND_SPEED_MS: f64 = 11.5;

/// Wind farm output at one instant, before and after the transmission line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WindOutput {
    /// Farm output after the capacity-factor ceiling (MW).
    pub generated_mw: f64,
    /// Ohmic loss on the line to the facility (MW).
    pub loss_mw: f64,
    /// Power arriving at the facility (MW).
    pub delivered_mw: f64,
}

/// A wind farm modeled from a diurnal wind speed profile and a turbine power curve.
///
/// Output follows `P = ½ρAv³ · Cp · η`, scaled by the number of turbines needed
/// to reach the rated capacity at [`RATED_WIND_SPEED_MS`], and is capped at
/// `rated_capacity × capacity_factor`. The cap applies an annual-average
/// statistic as an instantaneous ceiling.
#[derive(Debug, Clone)]
pub struct WindFarm {
    /// Installed capacity (MW).
    pub rated_capacity_mw: f64,
    pub rotor_radius_m: f64,
    pub air_density_kg_m3: f64,
    pub betz_limit: f64,
    pub mechanical_efficiency: f64,
    pub converter_efficiency: f64,
    pub capacity_factor: f64,
    /// Base wind speed over the day, knots spread evenly across 0-24 h.
    profile: CubicSpline,
    line: TransmissionLine,
}

impl WindFarm {
    /// Creates a wind farm feeding the facility over `line`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on `wind.base_speeds_ms` if the profile
    /// cannot be interpolated.
    pub fn new(config: &WindConfig, line: TransmissionLine) -> Result<Self, ConfigError> {
        let profile = CubicSpline::evenly_spaced(0.0, 24.0, config.base_speeds_ms.clone())
            .map_err(|e| ConfigError::new("wind.base_speeds_ms", e.to_string()))?;
        Ok(Self {
            rated_capacity_mw: config.rated_capacity_mw,
            rotor_radius_m: config.rotor_radius_m,
            air_density_kg_m3: config.air_density_kg_m3,
            betz_limit: config.betz_limit,
            mechanical_efficiency: config.mechanical_efficiency,
            converter_efficiency: config.converter_efficiency,
            capacity_factor: config.capacity_factor,
            profile,
            line,
        })
    }

    /// Creates the wind farm and its line from the full simulation config.
    ///
    /// # Errors
    ///
    /// See [`WindFarm::new`].
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::new(&config.wind, TransmissionLine::new(&config.transmission))
    }

    /// The line connecting the farm to the facility.
    pub fn line(&self) -> &TransmissionLine {
        &self.line
    }

    /// Effective hub wind speed at `time_of_day` hours, including turbulence.
    pub fn wind_speed_ms(&self, time_of_day: f64) -> f64 {
        let base = self
            .profile
            .eval(time_of_day.rem_euclid(24.0))
            .unwrap_or(0.0);
        let turbulence = base * TURBULENCE_INTENSITY * (2.0 * PI * time_of_day / 12.0).sin();
        (base + turbulence).max(0.0)
    }

    /// Output of a single turbine at `speed_ms` (MW).
    ///
    /// Returns zero when any geometric or efficiency parameter is non-positive.
    pub fn turbine_power_mw(&self, speed_ms: f64) -> f64 {
        let coefficient = self.air_density_kg_m3
            * self.betz_limit
            * self.mechanical_efficiency
            * self.converter_efficiency;
        if self.rotor_radius_m <= 0.0 || coefficient <= 0.0 || speed_ms <= 0.0 {
            return 0.0;
        }
        let swept_area = PI * self.rotor_radius_m * self.rotor_radius_m;
        0.5 * swept_area * speed_ms.powi(3) * coefficient / 1e6
    }

    /// Number of turbines (fractional) that sum to the rated capacity at rated speed.
    pub fn turbine_count(&self) -> f64 {
        let rated_turbine = self.turbine_power_mw(RATED_WIND_SPEED_MS);
        if self.rated_capacity_mw <= 0.0 || rated_turbine <= 0.0 {
            return 0.0;
        }
        self.rated_capacity_mw / rated_turbine
    }

    /// Unclamped farm output at `speed_ms` (MW).
    pub fn raw_power_mw(&self, speed_ms: f64) -> f64 {
        self.turbine_power_mw(speed_ms) * self.turbine_count()
    }

    /// Farm output at `time_of_day` hours, after the capacity-factor ceiling
    /// and the transmission line.
    pub fn instantaneous_output(&self, time_of_day: f64) -> WindOutput {
        let raw = self.raw_power_mw(self.wind_speed_ms(time_of_day));
        let ceiling = (self.rated_capacity_mw * self.capacity_factor).max(0.0);
        let generated_mw = raw.min(ceiling);
        let loss_mw = self.line.loss_mw(generated_mw, self.line.distance_km);
        let delivered_mw = (generated_mw - loss_mw).max(0.0);

        WindOutput {
            generated_mw,
            loss_mw: generated_mw - delivered_mw,
            delivered_mw,
        }
    }

    /// Expected annual energy production (GWh).
    pub fn annual_energy_production_gwh(&self) -> f64 {
        self.rated_capacity_mw.max(0.0) * self.capacity_factor * 8760.0 / 1000.0
    }
}
