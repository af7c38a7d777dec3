//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Top-level simulation configuration parsed from TOML.
///
/// Loaded once before the run and passed by reference into every component
/// constructor. All sections have defaults matching the baseline scenario.
/// Load from TOML with [`SimulationConfig::from_toml_file`] or use
/// [`SimulationConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Horizon, step duration, start time and seed.
    #[serde(default)]
    pub simulation: TimingConfig,
    /// Data-center load parameters.
    #[serde(default)]
    pub facility: FacilityConfig,
    /// Wind farm parameters.
    #[serde(default)]
    pub wind: WindConfig,
    /// Line between the wind farm and the facility.
    #[serde(default)]
    pub transmission: TransmissionConfig,
    /// Solar farm parameters.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Grid import limit and price.
    #[serde(default)]
    pub grid: GridConfig,
    /// Dispatch objective weights.
    #[serde(default)]
    pub optimization: OptimizationConfig,
    /// Emissions intensities per source.
    #[serde(default)]
    pub emissions: EmissionsConfig,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Simulated horizon in hours.
    pub horizon_hours: f64,
    /// Duration of one step in minutes (must be > 0).
    pub step_minutes: f64,
    /// Simulated timestamp of the first step.
    pub start: NaiveDateTime,
    /// Master random seed.
    pub seed: u64,
}

impl TimingConfig {
    /// Step duration in hours.
    pub fn step_hours(&self) -> f64 {
        self.step_minutes / 60.0
    }

    /// Number of steps covering the horizon, rounded down.
    pub fn total_steps(&self) -> usize {
        if self.step_minutes <= 0.0 || self.horizon_hours <= 0.0 {
            return 0;
        }
        (self.horizon_hours * 60.0 / self.step_minutes).floor() as usize
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            horizon_hours: 24.0,
            step_minutes: 5.0,
            start: NaiveDate::from_ymd_opt(2025, 5, 21)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            seed: 42,
        }
    }
}

/// Shape of the facility utilization over a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationPattern {
    /// Constant at `max_utilization`.
    Constant,
    /// Sinusoid between `min_utilization` and `max_utilization`, peaking at `peak_hour`.
    Diurnal,
}

/// Data-center hardware and load parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacilityConfig {
    /// Total compute nodes.
    pub total_nodes: u32,
    /// Fraction of nodes carrying GPUs.
    pub gpu_node_ratio: f64,
    /// Fraction of CPU-only nodes.
    pub cpu_node_ratio: f64,
    /// Fraction of nodes counted as storage.
    pub storage_node_ratio: f64,
    /// Fraction of nodes counted as network infrastructure.
    pub network_node_ratio: f64,
    /// Peak GPU node power (W).
    pub gpu_power_per_node_w: f64,
    /// Peak CPU node power (W).
    pub cpu_power_per_node_w: f64,
    /// Storage node power (W), utilization independent.
    pub storage_power_per_node_w: f64,
    /// Network node power (W), utilization independent.
    pub network_power_per_node_w: f64,
    /// Power budget that sizes the ASIC fleet (MW).
    pub asic_budget_mw: f64,
    /// Power per ASIC unit (W).
    pub asic_power_per_unit_w: f64,
    /// Power usage effectiveness; cooling is `it * (pue - 1)`.
    pub design_pue: f64,
    /// UPS, lighting and security overhead as a fraction of IT power.
    pub overhead_fraction: f64,
    /// Utilization curve shape.
    pub pattern: UtilizationPattern,
    /// Lowest utilization of the day (0.0-1.0).
    pub min_utilization: f64,
    /// Highest utilization of the day (0.0-1.0).
    pub max_utilization: f64,
    /// Hour at which the diurnal curve crosses its mean on the way up.
    pub peak_hour: f64,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            total_nodes: 2000,
            gpu_node_ratio: 0.75,
            cpu_node_ratio: 0.20,
            storage_node_ratio: 0.08,
            network_node_ratio: 0.06,
            gpu_power_per_node_w: 2000.0,
            cpu_power_per_node_w: 600.0,
            storage_power_per_node_w: 150.0,
            network_power_per_node_w: 100.0,
            asic_budget_mw: 2.0,
            asic_power_per_unit_w: 3200.0,
            design_pue: 1.22,
            overhead_fraction: 0.02,
            pattern: UtilizationPattern::Diurnal,
            min_utilization: 0.85,
            max_utilization: 1.0,
            peak_hour: 14.0,
        }
    }
}

/// Alberta diurnal base wind speed profile (m/s), one value per hour.
pub const DEFAULT_BASE_WIND_SPEEDS: [f64; 24] = [
    6.5, 6.7, 6.8, 6.7, 6.5, 6.3, 6.0, 6.2, 6.8, 7.5, 8.0, 8.3, 8.5, 8.7, 8.8, 8.7, 8.4, 8.1, 7.8,
    7.4, 7.0, 6.7, 6.5, 6.4,
];

/// Wind farm parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindConfig {
    /// Installed capacity (MW).
    pub rated_capacity_mw: f64,
    /// Turbine rotor radius (m).
    pub rotor_radius_m: f64,
    /// Air density (kg/m³).
    pub air_density_kg_m3: f64,
    /// Aerodynamic power coefficient ceiling.
    pub betz_limit: f64,
    /// Drive-train efficiency.
    pub mechanical_efficiency: f64,
    /// Power converter efficiency.
    pub converter_efficiency: f64,
    /// Regional capacity factor, applied as an instantaneous ceiling.
    pub capacity_factor: f64,
    /// 24-point base wind speed profile (m/s).
    pub base_speeds_ms: Vec<f64>,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            rated_capacity_mw: 3.5,
            rotor_radius_m: 75.0,
            air_density_kg_m3: 1.225,
            betz_limit: 0.593,
            mechanical_efficiency: 0.95,
            converter_efficiency: 0.98,
            capacity_factor: 0.38,
            base_speeds_ms: DEFAULT_BASE_WIND_SPEEDS.to_vec(),
        }
    }
}

/// Number of conductors carrying the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phases {
    Single,
    Three,
}

/// Transmission line parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransmissionConfig {
    /// Line length (km).
    pub distance_km: f64,
    /// Line-to-line voltage (kV).
    pub voltage_kv: f64,
    /// Conductor resistivity (Ω·m); copper by default.
    pub resistivity_ohm_m: f64,
    /// Conductor cross-section (mm²).
    pub conductor_area_mm2: f64,
    /// Single- or three-phase line.
    pub phases: Phases,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            distance_km: 1000.0,
            voltage_kv: 34.5,
            resistivity_ohm_m: 1.68e-8,
            conductor_area_mm2: 500.0,
            phases: Phases::Three,
        }
    }
}

/// Hourly output of one 38.9 MW Alberta solar farm (MW), hours 0..23.
pub const DEFAULT_SOLAR_CURVE_MW: [f64; 24] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 9.5, 18.0, 25.5, 32.0, 36.0, 38.5, 38.0, 36.0, 32.0, 25.5,
    18.0, 9.5, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Alberta seasonal multipliers, January first.
pub const DEFAULT_MONTHLY_FACTORS: [f64; 12] = [
    0.28, 0.51, 0.99, 1.35, 1.70, 1.74, 1.78, 1.50, 1.01, 0.59, 0.30, 0.21,
];

/// Solar farm parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// 24-point hourly generation curve of one farm (MW).
    pub hourly_curve_mw: Vec<f64>,
    /// Seasonal multipliers, January first; months past the end use 1.0.
    pub monthly_factors: Vec<f64>,
    /// Number of identical farms.
    pub farm_count: u32,
    /// Half-width of the uniform multiplicative perturbation (0.0-1.0).
    pub perturbation: f64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            hourly_curve_mw: DEFAULT_SOLAR_CURVE_MW.to_vec(),
            monthly_factors: DEFAULT_MONTHLY_FACTORS.to_vec(),
            farm_count: 1,
            perturbation: 0.1,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Total energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Initial state of charge as a fraction of capacity.
    pub initial_soc_fraction: f64,
    /// Lowest allowed state of charge as a fraction of capacity.
    pub min_soc_fraction: f64,
    /// Charge and discharge power limit (MW).
    pub max_charge_rate_mw: f64,
    /// Charge efficiency (0.0-1.0].
    pub charge_efficiency: f64,
    /// Discharge efficiency (0.0-1.0].
    pub discharge_efficiency: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_mwh: 1.5,
            initial_soc_fraction: 0.5,
            min_soc_fraction: 0.1,
            max_charge_rate_mw: 0.75,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
        }
    }
}

/// Grid connection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Import limit (MW). Must exceed the worst-case deficit for every step to be feasible.
    pub max_import_mw: f64,
    /// Energy price (currency/MWh).
    pub energy_price_per_mwh: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_import_mw: 10.0,
            energy_price_per_mwh: 80.0,
        }
    }
}

/// Dispatch objective weights.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationConfig {
    /// Penalty per MWh of curtailed wind or solar.
    pub curtailment_penalty_per_mwh: f64,
    /// Cost per MWh of battery throughput (charge plus discharge).
    ///
    /// Charging from surplus only pays off while this is below the curtailment
    /// penalty; simultaneous charge and discharge is ruled out while it exceeds
    /// `penalty / (1 + charge_eff * discharge_eff)`.
    ///
    /// Set to 0 to drop the term and optimize grid cost plus curtailment
    /// penalty alone. The absorption limit `wind + solar <= load + charge`
    /// stays in force either way.
    pub cycling_cost_per_mwh: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            curtailment_penalty_per_mwh: 10.0,
            cycling_cost_per_mwh: 7.5,
        }
    }
}

/// Lifecycle emissions intensities (kg CO₂ per MWh delivered).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmissionsConfig {
    pub grid_kg_per_mwh: f64,
    pub wind_kg_per_mwh: f64,
    pub solar_kg_per_mwh: f64,
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        Self {
            grid_kg_per_mwh: 420.0,
            wind_kg_per_mwh: 11.0,
            solar_kg_per_mwh: 41.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_mwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl SimulationConfig {
    /// Returns the baseline scenario: 2 MW ASIC budget, 3.5 MW wind, one solar farm.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the wind-only preset: no solar, larger battery to smooth the wind.
    pub fn wind_only() -> Self {
        Self {
            solar: SolarConfig {
                farm_count: 0,
                ..SolarConfig::default()
            },
            battery: BatteryConfig {
                capacity_mwh: 3.0,
                max_charge_rate_mw: 1.0,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the solar-heavy preset: two farms, 15 MWh battery, short line.
    pub fn solar_heavy() -> Self {
        Self {
            solar: SolarConfig {
                farm_count: 2,
                ..SolarConfig::default()
            },
            battery: BatteryConfig {
                capacity_mwh: 15.0,
                max_charge_rate_mw: 3.0,
                charge_efficiency: 0.92,
                discharge_efficiency: 0.92,
                ..BatteryConfig::default()
            },
            transmission: TransmissionConfig {
                distance_km: 100.0,
                ..TransmissionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "wind_only", "solar_heavy"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "wind_only" => Ok(Self::wind_only()),
            "solar_heavy" => Ok(Self::solar_heavy()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates every field and returns the full list of problems.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        let t = &self.simulation;
        check(t.step_minutes > 0.0, "simulation.step_minutes", "must be > 0");
        check(t.horizon_hours > 0.0, "simulation.horizon_hours", "must be > 0");
        check(
            t.step_minutes <= 0.0 || t.horizon_hours <= 0.0 || t.total_steps() > 0,
            "simulation.horizon_hours",
            "must cover at least one step",
        );

        let f = &self.facility;
        for (field, ratio) in [
            ("facility.gpu_node_ratio", f.gpu_node_ratio),
            ("facility.cpu_node_ratio", f.cpu_node_ratio),
            ("facility.storage_node_ratio", f.storage_node_ratio),
            ("facility.network_node_ratio", f.network_node_ratio),
            ("facility.overhead_fraction", f.overhead_fraction),
        ] {
            check((0.0..=1.0).contains(&ratio), field, "must be in [0.0, 1.0]");
        }
        check(
            f.gpu_node_ratio + f.cpu_node_ratio <= 1.0,
            "facility.cpu_node_ratio",
            "gpu_node_ratio + cpu_node_ratio must be <= 1.0",
        );
        for (field, value) in [
            ("facility.gpu_power_per_node_w", f.gpu_power_per_node_w),
            ("facility.cpu_power_per_node_w", f.cpu_power_per_node_w),
            ("facility.storage_power_per_node_w", f.storage_power_per_node_w),
            ("facility.network_power_per_node_w", f.network_power_per_node_w),
            ("facility.asic_budget_mw", f.asic_budget_mw),
        ] {
            check(value >= 0.0, field, "must be >= 0");
        }
        check(
            f.asic_power_per_unit_w > 0.0,
            "facility.asic_power_per_unit_w",
            "must be > 0",
        );
        check(f.design_pue >= 1.0, "facility.design_pue", "must be >= 1.0");
        check(
            (0.0..=1.0).contains(&f.min_utilization),
            "facility.min_utilization",
            "must be in [0.0, 1.0]",
        );
        check(
            (0.0..=1.0).contains(&f.max_utilization),
            "facility.max_utilization",
            "must be in [0.0, 1.0]",
        );
        check(
            f.min_utilization <= f.max_utilization,
            "facility.min_utilization",
            "must be <= facility.max_utilization",
        );

        let w = &self.wind;
        check(
            w.rated_capacity_mw >= 0.0,
            "wind.rated_capacity_mw",
            "must be >= 0",
        );
        check(
            (0.0..=1.0).contains(&w.capacity_factor),
            "wind.capacity_factor",
            "must be in [0.0, 1.0]",
        );
        check(
            w.base_speeds_ms.len() == 24,
            "wind.base_speeds_ms",
            "must have 24 hourly values",
        );
        check(
            w.base_speeds_ms.iter().all(|v| *v >= 0.0),
            "wind.base_speeds_ms",
            "speeds must be >= 0",
        );

        let tr = &self.transmission;
        check(tr.distance_km >= 0.0, "transmission.distance_km", "must be >= 0");
        check(tr.voltage_kv > 0.0, "transmission.voltage_kv", "must be > 0");
        check(
            tr.resistivity_ohm_m >= 0.0,
            "transmission.resistivity_ohm_m",
            "must be >= 0",
        );
        check(
            tr.conductor_area_mm2 > 0.0,
            "transmission.conductor_area_mm2",
            "must be > 0",
        );

        let s = &self.solar;
        check(
            s.hourly_curve_mw.len() == 24,
            "solar.hourly_curve_mw",
            "must have 24 hourly values",
        );
        check(
            s.hourly_curve_mw.iter().all(|v| *v >= 0.0),
            "solar.hourly_curve_mw",
            "values must be >= 0",
        );
        check(
            s.monthly_factors.len() <= 12,
            "solar.monthly_factors",
            "must have at most 12 values",
        );
        check(
            s.monthly_factors.iter().all(|v| *v >= 0.0),
            "solar.monthly_factors",
            "values must be >= 0",
        );
        check(
            (0.0..1.0).contains(&s.perturbation),
            "solar.perturbation",
            "must be in [0.0, 1.0)",
        );

        let b = &self.battery;
        check(b.capacity_mwh >= 0.0, "battery.capacity_mwh", "must be >= 0");
        check(
            (0.0..=1.0).contains(&b.min_soc_fraction),
            "battery.min_soc_fraction",
            "must be in [0.0, 1.0]",
        );
        check(
            (0.0..=1.0).contains(&b.initial_soc_fraction),
            "battery.initial_soc_fraction",
            "must be in [0.0, 1.0]",
        );
        check(
            b.initial_soc_fraction >= b.min_soc_fraction,
            "battery.initial_soc_fraction",
            "must be >= battery.min_soc_fraction",
        );
        check(
            b.max_charge_rate_mw >= 0.0,
            "battery.max_charge_rate_mw",
            "must be >= 0",
        );
        check(
            b.charge_efficiency > 0.0 && b.charge_efficiency <= 1.0,
            "battery.charge_efficiency",
            "must be in (0.0, 1.0]",
        );
        check(
            b.discharge_efficiency > 0.0 && b.discharge_efficiency <= 1.0,
            "battery.discharge_efficiency",
            "must be in (0.0, 1.0]",
        );

        let g = &self.grid;
        check(g.max_import_mw >= 0.0, "grid.max_import_mw", "must be >= 0");
        check(
            g.energy_price_per_mwh >= 0.0,
            "grid.energy_price_per_mwh",
            "must be >= 0",
        );

        let o = &self.optimization;
        check(
            o.curtailment_penalty_per_mwh >= 0.0,
            "optimization.curtailment_penalty_per_mwh",
            "must be >= 0",
        );
        check(
            o.cycling_cost_per_mwh >= 0.0,
            "optimization.cycling_cost_per_mwh",
            "must be >= 0",
        );

        let e = &self.emissions;
        for (field, value) in [
            ("emissions.grid_kg_per_mwh", e.grid_kg_per_mwh),
            ("emissions.wind_kg_per_mwh", e.wind_kg_per_mwh),
            ("emissions.solar_kg_per_mwh", e.solar_kg_per_mwh),
        ] {
            check(value >= 0.0, field, "must be >= 0");
        }

        errors
    }

    /// Validates the configuration, turning any problem into [`SimError::Configuration`].
    ///
    /// # Errors
    ///
    /// Returns every invalid field at once.
    pub fn ensure_valid(&self) -> Result<(), SimError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimError::Configuration(errors))
        }
    }
}
