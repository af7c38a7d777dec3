//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use hybrid_dc_sim::config::SimulationConfig;
use hybrid_dc_sim::sim::engine::Engine;
use hybrid_dc_sim::sim::metrics::MetricsSummary;
use hybrid_dc_sim::sim::types::StepRecord;

/// Relative tolerance for the power balance checks.
pub const BALANCE_TOL: f64 = 1e-6;

/// Baseline scenario cut to `hours` of simulated time.
pub fn short_config(hours: f64) -> SimulationConfig {
    let mut cfg = SimulationConfig::baseline();
    cfg.simulation.horizon_hours = hours;
    cfg
}

/// Runs a scenario to completion and returns its records and summary.
///
/// # Panics
///
/// Panics if the scenario is invalid or any step fails.
pub fn run(config: &SimulationConfig) -> (Vec<StepRecord>, MetricsSummary) {
    let mut engine = Engine::from_scenario(config).expect("scenario should be valid");
    let records = engine.run().expect("run should succeed");
    let summary = engine.summary();
    (records, summary)
}

/// Asserts every per-step invariant of an accepted decision.
pub fn assert_step_invariants(config: &SimulationConfig, r: &StepRecord) {
    let d = &r.decision;
    let b = &config.battery;
    let rate = b.max_charge_rate_mw;
    let t = r.timestep;

    assert!(
        (0.0..=config.grid.max_import_mw).contains(&d.grid_import_mw),
        "step {t}: grid {} out of range",
        d.grid_import_mw
    );
    assert!(
        (0.0..=r.wind.delivered_mw).contains(&d.wind_used_mw),
        "step {t}: wind used {} exceeds {}",
        d.wind_used_mw,
        r.wind.delivered_mw
    );
    assert!(
        (0.0..=r.solar_available_mw).contains(&d.solar_used_mw),
        "step {t}: solar used {} exceeds {}",
        d.solar_used_mw,
        r.solar_available_mw
    );
    assert!((0.0..=rate).contains(&d.battery_charge_mw), "step {t}: charge");
    assert!((0.0..=rate).contains(&d.battery_discharge_mw), "step {t}: discharge");

    let supply = d.grid_import_mw + d.wind_used_mw + d.solar_used_mw + d.battery_discharge_mw
        - d.battery_charge_mw;
    let load = r.load.total_mw;
    assert!(
        supply >= load - BALANCE_TOL * load.max(1.0),
        "step {t}: supply {supply} below load {load}"
    );

    let min_soc = b.min_soc_fraction * b.capacity_mwh;
    assert!(
        d.soc_mwh >= min_soc && d.soc_mwh <= b.capacity_mwh,
        "step {t}: SOC {} outside [{min_soc}, {}]",
        d.soc_mwh,
        b.capacity_mwh
    );
}
