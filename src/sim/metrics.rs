//! Running energy, emissions and cost accounting over a simulation run.

use std::fmt;

use serde::Serialize;

use super::types::{DispatchDecision, StepRecord};
use crate::config::SimulationConfig;

/// Energy per category. Accumulated in MWh, reported in kWh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyTotals {
    pub gpu: f64,
    pub cpu: f64,
    pub asic: f64,
    pub storage: f64,
    pub network: f64,
    pub cooling: f64,
    pub overhead: f64,
    pub wind_generated: f64,
    pub wind_delivered: f64,
    pub wind_used: f64,
    pub wind_curtailed: f64,
    pub solar_available: f64,
    pub solar_used: f64,
    pub solar_curtailed: f64,
    pub grid_import: f64,
    pub battery_charge: f64,
    pub battery_discharge: f64,
    pub transmission_loss: f64,
    pub deficit: f64,
}

impl EnergyTotals {
    /// Facility consumption: compute, cooling and overhead.
    ///
    /// Supply categories are left out so nothing is counted twice.
    pub fn consumption(&self) -> f64 {
        self.gpu + self.cpu + self.asic + self.storage + self.network + self.cooling + self.overhead
    }

    /// Wind and solar energy actually used.
    pub fn renewable_used(&self) -> f64 {
        self.wind_used + self.solar_used
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            gpu: f(self.gpu),
            cpu: f(self.cpu),
            asic: f(self.asic),
            storage: f(self.storage),
            network: f(self.network),
            cooling: f(self.cooling),
            overhead: f(self.overhead),
            wind_generated: f(self.wind_generated),
            wind_delivered: f(self.wind_delivered),
            wind_used: f(self.wind_used),
            wind_curtailed: f(self.wind_curtailed),
            solar_available: f(self.solar_available),
            solar_used: f(self.solar_used),
            solar_curtailed: f(self.solar_curtailed),
            grid_import: f(self.grid_import),
            battery_charge: f(self.battery_charge),
            battery_discharge: f(self.battery_discharge),
            transmission_loss: f(self.transmission_loss),
            deficit: f(self.deficit),
        }
    }
}

/// Lifecycle emissions per source (kg CO₂).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Emissions {
    pub grid_kg: f64,
    pub wind_kg: f64,
    pub solar_kg: f64,
}

impl Emissions {
    pub fn total_kg(&self) -> f64 {
        self.grid_kg + self.wind_kg + self.solar_kg
    }
}

/// Share of the load served by wind and solar, clamped to `[0, 1]`.
///
/// Zero when there is no load.
pub fn utilization_ratio(load_mw: f64, decision: &DispatchDecision) -> f64 {
    if load_mw <= 0.0 {
        return 0.0;
    }
    (decision.renewable_used_mw() / load_mw).clamp(0.0, 1.0)
}

/// Accumulates per-step records into run totals.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    dt_hours: f64,
    grid_intensity: f64,
    wind_intensity: f64,
    solar_intensity: f64,
    energy_price_per_mwh: f64,
    curtailment_penalty_per_mwh: f64,
    cycling_cost_per_mwh: f64,
    battery_capacity_mwh: f64,

    energy_mwh: EnergyTotals,
    emissions: Emissions,
    peak_grid_import_mw: f64,
    utilization: Vec<f64>,
    soc_mwh: Vec<f64>,
}

impl MetricsAggregator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            dt_hours: config.simulation.step_hours(),
            grid_intensity: config.emissions.grid_kg_per_mwh,
            wind_intensity: config.emissions.wind_kg_per_mwh,
            solar_intensity: config.emissions.solar_kg_per_mwh,
            energy_price_per_mwh: config.grid.energy_price_per_mwh,
            curtailment_penalty_per_mwh: config.optimization.curtailment_penalty_per_mwh,
            cycling_cost_per_mwh: config.optimization.cycling_cost_per_mwh,
            battery_capacity_mwh: config.battery.capacity_mwh,
            energy_mwh: EnergyTotals::default(),
            emissions: Emissions::default(),
            peak_grid_import_mw: 0.0,
            utilization: Vec::new(),
            soc_mwh: Vec::new(),
        }
    }

    /// Adds one step to the running totals.
    pub fn update(&mut self, record: &StepRecord) {
        let dt = self.dt_hours;
        let d = &record.decision;
        let e = &mut self.energy_mwh;

        e.gpu += record.load.gpu_mw * dt;
        e.cpu += record.load.cpu_mw * dt;
        e.asic += record.load.asic_mw * dt;
        e.storage += record.load.storage_mw * dt;
        e.network += record.load.network_mw * dt;
        e.cooling += record.load.cooling_mw * dt;
        e.overhead += record.load.overhead_mw * dt;
        e.wind_generated += record.wind.generated_mw * dt;
        e.wind_delivered += record.wind.delivered_mw * dt;
        e.wind_used += d.wind_used_mw * dt;
        e.wind_curtailed += d.wind_curtailed_mw * dt;
        e.solar_available += record.solar_available_mw * dt;
        e.solar_used += d.solar_used_mw * dt;
        e.solar_curtailed += d.solar_curtailed_mw * dt;
        e.grid_import += d.grid_import_mw * dt;
        e.battery_charge += d.battery_charge_mw * dt;
        e.battery_discharge += d.battery_discharge_mw * dt;
        e.transmission_loss += record.wind.loss_mw * dt;
        e.deficit += record.deficit_mw * dt;

        self.emissions.grid_kg += d.grid_import_mw * dt * self.grid_intensity;
        // Lifecycle emissions follow what reaches the bus, curtailed or not.
        self.emissions.wind_kg += record.wind.delivered_mw * dt * self.wind_intensity;
        self.emissions.solar_kg += record.solar_available_mw * dt * self.solar_intensity;

        self.peak_grid_import_mw = self.peak_grid_import_mw.max(d.grid_import_mw);
        self.utilization.push(record.utilization_ratio);
        self.soc_mwh.push(d.soc_mwh);
    }

    /// Number of steps accumulated so far.
    pub fn steps(&self) -> usize {
        self.utilization.len()
    }

    /// Utilization ratio of every step, in order.
    pub fn utilization_samples(&self) -> &[f64] {
        &self.utilization
    }

    /// Summarizes the run so far. Pure read; may be called any number of times.
    pub fn summary(&self) -> MetricsSummary {
        let e = &self.energy_mwh;
        let grid_cost = e.grid_import * self.energy_price_per_mwh;
        let curtailment_cost =
            (e.wind_curtailed + e.solar_curtailed) * self.curtailment_penalty_per_mwh;
        let cycling_cost = (e.battery_charge + e.battery_discharge) * self.cycling_cost_per_mwh;

        let renewable = e.renewable_used();
        let renewable_penetration = if renewable + e.grid_import > 0.0 {
            renewable / (renewable + e.grid_import)
        } else {
            0.0
        };
        let throughput = e.battery_charge + e.battery_discharge;
        let equivalent_full_cycles = if self.battery_capacity_mwh > 0.0 {
            throughput / (2.0 * self.battery_capacity_mwh)
        } else {
            0.0
        };

        // The grand total is summed from the reported categories so the two always agree.
        let energy_kwh = e.map(|mwh| round_to(mwh * 1e3, 2));

        MetricsSummary {
            steps: self.steps(),
            energy_kwh,
            grand_total_kwh: round_to(energy_kwh.consumption(), 2),
            emissions: Emissions {
                grid_kg: round_to(self.emissions.grid_kg, 2),
                wind_kg: round_to(self.emissions.wind_kg, 2),
                solar_kg: round_to(self.emissions.solar_kg, 2),
            },
            total_emissions_kg: round_to(self.emissions.total_kg(), 2),
            grid_cost: round_to(grid_cost, 2),
            curtailment_cost: round_to(curtailment_cost, 2),
            cycling_cost: round_to(cycling_cost, 2),
            total_cost: round_to(grid_cost + curtailment_cost + cycling_cost, 2),
            mean_utilization: round_to(mean(&self.utilization), 4),
            renewable_penetration: round_to(renewable_penetration, 4),
            average_soc_mwh: round_to(mean(&self.soc_mwh), 2),
            peak_grid_import_mw: round_to(self.peak_grid_import_mw, 2),
            battery_equivalent_full_cycles: round_to(equivalent_full_cycles, 4),
        }
    }
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

/// Final run metrics, rounded for display.
///
/// Energy, emissions and cost carry 2 decimals; fractions carry 4.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub steps: usize,
    /// Energy per category (kWh).
    pub energy_kwh: EnergyTotals,
    /// Facility consumption: compute, cooling and overhead (kWh).
    pub grand_total_kwh: f64,
    pub emissions: Emissions,
    pub total_emissions_kg: f64,
    pub grid_cost: f64,
    pub curtailment_cost: f64,
    pub cycling_cost: f64,
    pub total_cost: f64,
    /// Mean share of load served by renewables (0.0 to 1.0).
    pub mean_utilization: f64,
    /// Renewable share of the energy used, grid included (0.0 to 1.0).
    pub renewable_penetration: f64,
    pub average_soc_mwh: f64,
    pub peak_grid_import_mw: f64,
    pub battery_equivalent_full_cycles: f64,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.energy_kwh;
        writeln!(f, "--- Run Summary ({} steps) ---", self.steps)?;
        writeln!(f, "Facility energy:       {:.2} kWh", self.grand_total_kwh)?;
        writeln!(
            f,
            "  compute:             gpu {:.2}  cpu {:.2}  asic {:.2}  storage {:.2}  network {:.2}",
            e.gpu, e.cpu, e.asic, e.storage, e.network
        )?;
        writeln!(f, "  cooling:             {:.2} kWh", e.cooling)?;
        writeln!(f, "  overhead:            {:.2} kWh", e.overhead)?;
        writeln!(f, "Grid import:           {:.2} kWh (peak {:.2} MW)", e.grid_import, self.peak_grid_import_mw)?;
        writeln!(
            f,
            "Wind:                  {:.2} generated, {:.2} lost, {:.2} used, {:.2} curtailed (kWh)",
            e.wind_generated, e.transmission_loss, e.wind_used, e.wind_curtailed
        )?;
        writeln!(
            f,
            "Solar:                 {:.2} available, {:.2} used, {:.2} curtailed (kWh)",
            e.solar_available, e.solar_used, e.solar_curtailed
        )?;
        writeln!(
            f,
            "Battery:               +{:.2} / -{:.2} kWh ({:.2} equiv. cycles, avg SoC {:.2} MWh)",
            e.battery_charge, e.battery_discharge, self.battery_equivalent_full_cycles, self.average_soc_mwh
        )?;
        writeln!(
            f,
            "Emissions:             {:.2} kg CO2 (grid {:.2}, wind {:.2}, solar {:.2})",
            self.total_emissions_kg, self.emissions.grid_kg, self.emissions.wind_kg, self.emissions.solar_kg
        )?;
        writeln!(
            f,
            "Cost:                  {:.2} (grid {:.2}, curtailment {:.2}, cycling {:.2})",
            self.total_cost, self.grid_cost, self.curtailment_cost, self.cycling_cost
        )?;
        writeln!(f, "Renewable utilization: {:.2}%", self.mean_utilization * 100.0)?;
        write!(f, "Renewable penetration: {:.2}%", self.renewable_penetration * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::facility::LoadBreakdown;
    use crate::devices::wind::WindOutput;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDateTime;

    fn config() -> SimulationConfig {
        let mut cfg = SimulationConfig::baseline();
        cfg.simulation.step_minutes = 60.0;
        cfg
    }

    fn record(load: f64, grid: f64, wind: f64, solar: f64) -> StepRecord {
        let decision = DispatchDecision {
            grid_import_mw: grid,
            wind_used_mw: wind,
            solar_used_mw: solar,
            soc_mwh: 0.75,
            ..DispatchDecision::default()
        };
        StepRecord {
            timestep: 0,
            timestamp: NaiveDateTime::default(),
            load: LoadBreakdown {
                gpu_mw: load * 0.5,
                asic_mw: load * 0.3,
                cooling_mw: load * 0.2,
                total_mw: load,
                ..LoadBreakdown::default()
            },
            wind: WindOutput {
                generated_mw: wind + 0.1,
                loss_mw: 0.1,
                delivered_mw: wind,
            },
            solar_available_mw: solar,
            decision,
            deficit_mw: 0.0,
            utilization_ratio: utilization_ratio(load, &decision),
        }
    }

    #[test]
    fn empty_summary_is_zero() {
        let s = MetricsAggregator::new(&config()).summary();
        assert_eq!(s.steps, 0);
        assert_eq!(s.mean_utilization, 0.0);
        assert_eq!(s.grand_total_kwh, 0.0);
        assert_eq!(s.renewable_penetration, 0.0);
    }

    #[test]
    fn energy_accumulates_in_kwh() {
        let mut m = MetricsAggregator::new(&config());
        m.update(&record(4.0, 3.0, 1.0, 0.0));
        m.update(&record(4.0, 2.0, 1.0, 1.0));
        let s = m.summary();
        assert_abs_diff_eq!(s.energy_kwh.grid_import, 5000.0);
        assert_abs_diff_eq!(s.energy_kwh.wind_used, 2000.0);
        assert_abs_diff_eq!(s.energy_kwh.transmission_loss, 200.0);
        assert_abs_diff_eq!(s.grand_total_kwh, 8000.0);
    }

    #[test]
    fn grand_total_excludes_supply() {
        let mut m = MetricsAggregator::new(&config());
        m.update(&record(2.0, 1.0, 1.0, 0.0));
        let s = m.summary();
        let e = &s.energy_kwh;
        let consumption = e.gpu + e.cpu + e.asic + e.storage + e.network + e.cooling + e.overhead;
        assert_abs_diff_eq!(s.grand_total_kwh, consumption, epsilon = 1e-6);
    }

    #[test]
    fn grand_total_matches_reported_categories_over_many_steps() {
        let mut cfg = SimulationConfig::baseline();
        cfg.simulation.step_minutes = 7.0;
        let mut m = MetricsAggregator::new(&cfg);
        for i in 0..61 {
            let load = 6.123_456_789 + f64::from(i) * 0.017_3;
            m.update(&record(load, load - 1.0, 1.0, 0.0));
        }
        let s = m.summary();
        assert_eq!(s.grand_total_kwh, round_to(s.energy_kwh.consumption(), 2));
        assert_abs_diff_eq!(s.grand_total_kwh, s.energy_kwh.consumption(), epsilon = 1e-6);
    }

    #[test]
    fn emissions_and_cost() {
        let mut m = MetricsAggregator::new(&config());
        m.update(&record(3.0, 2.0, 1.0, 0.0));
        let s = m.summary();
        assert_abs_diff_eq!(s.emissions.grid_kg, 840.0);
        assert_abs_diff_eq!(s.emissions.wind_kg, 11.0);
        assert_abs_diff_eq!(s.grid_cost, 160.0);
        assert_abs_diff_eq!(s.total_cost, 160.0);
    }

    #[test]
    fn renewable_emissions_count_delivered_energy() {
        let mut m = MetricsAggregator::new(&config());
        let mut r = record(1.0, 0.0, 0.5, 0.5);
        r.wind.delivered_mw = 2.0;
        r.solar_available_mw = 3.0;
        r.decision.wind_curtailed_mw = 1.5;
        r.decision.solar_curtailed_mw = 2.5;
        m.update(&r);
        let s = m.summary();
        assert_abs_diff_eq!(s.emissions.wind_kg, 2.0 * 11.0);
        assert_abs_diff_eq!(s.emissions.solar_kg, 3.0 * 41.0);
        assert_abs_diff_eq!(s.emissions.grid_kg, 0.0);
    }

    #[test]
    fn utilization_and_penetration() {
        let mut m = MetricsAggregator::new(&config());
        m.update(&record(4.0, 3.0, 1.0, 0.0));
        m.update(&record(4.0, 0.0, 2.0, 2.0));
        m.update(&record(0.0, 0.0, 0.0, 0.0));
        let s = m.summary();
        assert_abs_diff_eq!(s.mean_utilization, round_to((0.25 + 1.0 + 0.0) / 3.0, 4));
        assert_abs_diff_eq!(s.renewable_penetration, 0.625);
        assert_eq!(m.utilization_samples(), &[0.25, 1.0, 0.0]);
    }

    #[test]
    fn utilization_ratio_is_clamped() {
        let d = DispatchDecision {
            wind_used_mw: 3.0,
            battery_charge_mw: 1.0,
            ..DispatchDecision::default()
        };
        assert_eq!(utilization_ratio(2.0, &d), 1.0);
        assert_eq!(utilization_ratio(0.0, &d), 0.0);
    }

    #[test]
    fn summary_is_idempotent() {
        let mut m = MetricsAggregator::new(&SimulationConfig::baseline());
        for i in 0..10 {
            m.update(&record(6.5, 5.0 - f64::from(i) * 0.1, 1.0, f64::from(i) * 0.1));
        }
        let a = serde_json::to_vec(&m.summary()).ok();
        let b = serde_json::to_vec(&m.summary()).ok();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.123456, 4), 0.1235);
    }
}
