//! Simulation engine that orchestrates load, generation, dispatch and metrics.

use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::devices::{DeviceContext, FacilityLoad, SolarFarm, WindFarm};
use crate::error::SimError;

use super::clock::Clock;
use super::dispatch::DispatchOptimizer;
use super::metrics::{MetricsAggregator, MetricsSummary, utilization_ratio};
use super::power_balance::deficit_mw;
use super::types::{StepInput, StepRecord};

/// Simulation engine owning every model, the dispatcher and the metrics.
///
/// Holds typed model fields rather than trait objects since the set of
/// sources is fixed. One engine runs one scenario; it owns its battery state
/// and accumulator outright, so independent engines never share anything.
pub struct Engine {
    clock: Clock,
    total_steps: usize,
    load: FacilityLoad,
    wind: WindFarm,
    solar: SolarFarm,
    optimizer: DispatchOptimizer,
    metrics: MetricsAggregator,
}

impl Engine {
    /// Builds an engine from a validated scenario.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] listing every invalid field.
    pub fn from_scenario(config: &SimulationConfig) -> Result<Self, SimError> {
        config.ensure_valid()?;

        let timing = &config.simulation;
        let total_steps = timing.total_steps();
        Ok(Self {
            clock: Clock::new(total_steps, timing.start, timing.step_minutes),
            total_steps,
            load: FacilityLoad::new(&config.facility, timing.step_hours()),
            wind: WindFarm::from_config(config)?,
            solar: SolarFarm::new(&config.solar, timing.seed)?,
            optimizer: DispatchOptimizer::from_config(config),
            metrics: MetricsAggregator::new(config),
        })
    }

    /// Executes one simulation timestep and returns its record.
    ///
    /// # Errors
    ///
    /// Propagates dispatch failures, tagged with the step index.
    pub fn step(&mut self, ctx: &DeviceContext) -> Result<StepRecord, SimError> {
        // 1. Demand and generation
        let load = self.load.breakdown(ctx.timestep);
        let wind = self.wind.instantaneous_output(ctx.hour_of_day());
        let solar_available_mw = self.solar.expected_output(&ctx.timestamp);

        // 2. Dispatch
        let input = StepInput {
            timestep: ctx.timestep,
            load_mw: load.total_mw,
            wind_available_mw: wind.delivered_mw,
            solar_available_mw,
        };
        let decision = self.optimizer.step(&input)?;

        // 3. Record and accumulate
        let record = StepRecord {
            timestep: ctx.timestep,
            timestamp: ctx.timestamp,
            load,
            wind,
            solar_available_mw,
            decision,
            deficit_mw: deficit_mw(load.total_mw, &decision),
            utilization_ratio: utilization_ratio(load.total_mw, &decision),
        };
        self.metrics.update(&record);
        debug!(
            step = record.timestep,
            load_mw = load.total_mw,
            grid_mw = decision.grid_import_mw,
            soc_mwh = decision.soc_mwh,
            "step dispatched"
        );

        Ok(record)
    }

    /// Executes every timestep and returns the records in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error.
    pub fn run(&mut self) -> Result<Vec<StepRecord>, SimError> {
        info!(steps = self.total_steps, "simulation started");
        let mut records = Vec::with_capacity(self.total_steps);
        while let Some((t, ts)) = self.clock.tick() {
            records.push(self.step(&DeviceContext::new(t, ts))?);
        }
        let summary = self.metrics.summary();
        info!(
            steps = records.len(),
            grid_kwh = summary.energy_kwh.grid_import,
            renewable_penetration = summary.renewable_penetration,
            "simulation finished"
        );
        Ok(records)
    }

    /// Current run summary.
    pub fn summary(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    /// Returns a reference to the dispatcher (for SOC history queries).
    pub fn optimizer(&self) -> &DispatchOptimizer {
        &self.optimizer
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config(hours: f64) -> SimulationConfig {
        let mut cfg = SimulationConfig::baseline();
        cfg.simulation.horizon_hours = hours;
        cfg
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut cfg = SimulationConfig::baseline();
        cfg.simulation.step_minutes = 0.0;
        assert!(matches!(
            Engine::from_scenario(&cfg),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn run_produces_one_record_per_step() {
        let mut engine = Engine::from_scenario(&short_config(2.0)).expect("valid config");
        let records = engine.run().expect("run should succeed");
        assert_eq!(records.len(), 24);
        assert!(records.iter().enumerate().all(|(i, r)| r.timestep == i));
        assert_eq!(engine.summary().steps, 24);
        assert_eq!(engine.optimizer().soc_history().len(), 25);
    }

    #[test]
    fn timestamps_follow_step_duration() {
        let mut engine = Engine::from_scenario(&short_config(1.0)).expect("valid config");
        let records = engine.run().expect("run should succeed");
        let first = records[0].timestamp;
        let last = records[11].timestamp;
        assert_eq!((last - first).num_minutes(), 55);
    }

    #[test]
    fn engine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Engine>();
    }

    #[test]
    fn undersized_grid_fails_with_step_index() {
        let mut cfg = short_config(1.0);
        cfg.grid.max_import_mw = 0.5;
        cfg.wind.rated_capacity_mw = 0.0;
        cfg.solar.farm_count = 0;
        let mut engine = Engine::from_scenario(&cfg).expect("valid config");
        let err = engine.run();
        assert!(matches!(
            err,
            Err(SimError::OptimizationInfeasible { step: 0, .. })
        ));
    }
}
