use std::f64::consts::PI;

use serde::Serialize;

use crate::config::{FacilityConfig, UtilizationPattern};

/// Facility power demand at one step, split by consumer (MW).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadBreakdown {
    pub gpu_mw: f64,
    pub cpu_mw: f64,
    pub asic_mw: f64,
    pub storage_mw: f64,
    pub network_mw: f64,
    pub cooling_mw: f64,
    pub overhead_mw: f64,
    /// Sum of every category above.
    pub total_mw: f64,
}

impl LoadBreakdown {
    /// IT power: compute, storage and network.
    pub fn it_mw(&self) -> f64 {
        self.gpu_mw + self.cpu_mw + self.asic_mw + self.storage_mw + self.network_mw
    }
}

/// A data-center load generator driven by a utilization pattern.
///
/// `FacilityLoad` sizes the node fleet once from the configured ratios, then
/// scales GPU, CPU and ASIC power by the utilization of each step. Storage and
/// network draw constant power. Cooling and overhead are proportional to IT
/// power through the PUE and the overhead fraction.
///
/// # Examples
///
/// ```
/// use hybrid_dc_sim::config::FacilityConfig;
/// use hybrid_dc_sim::devices::facility::FacilityLoad;
///
/// let load = FacilityLoad::new(&FacilityConfig::default(), 5.0 / 60.0);
///
/// // Demand at 14:00 on the first day
/// let demand = load.breakdown(168);
/// assert!(demand.total_mw > demand.it_mw());
/// ```
#[derive(Debug, Clone)]
pub struct FacilityLoad {
    pub gpu_nodes: u32,
    pub cpu_nodes: u32,
    pub storage_nodes: u32,
    pub network_nodes: u32,
    pub asic_units: u64,

    /// Per-unit peak powers (W).
    gpu_power_w: f64,
    cpu_power_w: f64,
    storage_power_w: f64,
    network_power_w: f64,
    asic_power_w: f64,

    design_pue: f64,
    overhead_fraction: f64,
    pattern: UtilizationPattern,
    min_utilization: f64,
    max_utilization: f64,
    peak_hour: f64,

    /// Duration of one timestep in hours.
    dt_hours: f64,
}

impl FacilityLoad {
    /// Creates a load generator for a facility.
    ///
    /// # Arguments
    ///
    /// * `config` - Fleet composition, unit powers, PUE and utilization pattern
    /// * `dt_hours` - Step duration, used to place each step on the daily curve
    pub fn new(config: &FacilityConfig, dt_hours: f64) -> Self {
        let nodes = |ratio: f64| (f64::from(config.total_nodes) * ratio).floor().max(0.0) as u32;
        let asic_units = if config.asic_power_per_unit_w > 0.0 {
            (config.asic_budget_mw * 1e6 / config.asic_power_per_unit_w)
                .floor()
                .max(0.0) as u64
        } else {
            0
        };

        Self {
            gpu_nodes: nodes(config.gpu_node_ratio),
            cpu_nodes: nodes(config.cpu_node_ratio),
            storage_nodes: nodes(config.storage_node_ratio),
            network_nodes: nodes(config.network_node_ratio),
            asic_units,
            gpu_power_w: config.gpu_power_per_node_w,
            cpu_power_w: config.cpu_power_per_node_w,
            storage_power_w: config.storage_power_per_node_w,
            network_power_w: config.network_power_per_node_w,
            asic_power_w: config.asic_power_per_unit_w,
            design_pue: config.design_pue,
            overhead_fraction: config.overhead_fraction,
            pattern: config.pattern,
            min_utilization: config.min_utilization,
            max_utilization: config.max_utilization,
            peak_hour: config.peak_hour,
            dt_hours,
        }
    }

    /// Utilization (0.0-1.0) at `timestep`.
    ///
    /// The diurnal curve is a sinusoid with a 24 h period, centred between
    /// the minimum and maximum utilization.
    pub fn utilization(&self, timestep: usize) -> f64 {
        match self.pattern {
            UtilizationPattern::Constant => self.max_utilization,
            UtilizationPattern::Diurnal => {
                let hours = timestep as f64 * self.dt_hours;
                let phase = (hours - self.peak_hour) / 24.0 * 2.0 * PI;
                self.min_utilization
                    + (self.max_utilization - self.min_utilization) * (0.5 + 0.5 * phase.sin())
            }
        }
    }

    /// Power demand at `timestep`, split by consumer.
    pub fn breakdown(&self, timestep: usize) -> LoadBreakdown {
        let u = self.utilization(timestep);
        let mw = |count: f64, watts: f64| count * watts / 1e6;

        let gpu_mw = mw(f64::from(self.gpu_nodes), self.gpu_power_w) * u;
        let cpu_mw = mw(f64::from(self.cpu_nodes), self.cpu_power_w) * u;
        let asic_mw = mw(self.asic_units as f64, self.asic_power_w) * u;
        let storage_mw = mw(f64::from(self.storage_nodes), self.storage_power_w);
        let network_mw = mw(f64::from(self.network_nodes), self.network_power_w);

        let it_mw = gpu_mw + cpu_mw + asic_mw + storage_mw + network_mw;
        let cooling_mw = it_mw * (self.design_pue - 1.0).max(0.0);
        let overhead_mw = it_mw * self.overhead_fraction;

        LoadBreakdown {
            gpu_mw,
            cpu_mw,
            asic_mw,
            storage_mw,
            network_mw,
            cooling_mw,
            overhead_mw,
            total_mw: it_mw + cooling_mw + overhead_mw,
        }
    }
}
