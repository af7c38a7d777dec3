//! Integration tests for the default simulation scenario.

mod common;

use approx::assert_abs_diff_eq;
use hybrid_dc_sim::config::SimulationConfig;
use hybrid_dc_sim::error::SimError;
use hybrid_dc_sim::sim::engine::Engine;

#[test]
fn full_run_produces_correct_step_count() {
    let (records, summary) = common::run(&SimulationConfig::baseline());
    assert_eq!(records.len(), 288);
    assert_eq!(summary.steps, 288);
}

#[test]
fn every_step_respects_bounds_balance_and_soc() {
    let cfg = SimulationConfig::baseline();
    let (records, _) = common::run(&cfg);
    for r in &records {
        common::assert_step_invariants(&cfg, r);
        assert_eq!(r.deficit_mw, 0.0);
    }
}

#[test]
fn summary_values_are_finite_and_non_negative() {
    let (_, s) = common::run(&SimulationConfig::baseline());
    let e = &s.energy_kwh;
    for v in [
        s.grand_total_kwh,
        s.total_cost,
        s.total_emissions_kg,
        e.grid_import,
        e.wind_used,
        e.solar_used,
        e.transmission_loss,
        e.battery_charge,
        e.battery_discharge,
    ] {
        assert!(v.is_finite() && v >= 0.0);
    }
    assert!((0.0..=1.0).contains(&s.mean_utilization));
    assert!((0.0..=1.0).contains(&s.renewable_penetration));
}

#[test]
fn energy_is_conserved_over_the_run() {
    let (_, s) = common::run(&common::short_config(6.0));
    let e = &s.energy_kwh;
    let supplied = e.grid_import + e.wind_used + e.solar_used + e.battery_discharge - e.battery_charge;
    // Each term is rounded to 0.01 kWh.
    assert_abs_diff_eq!(supplied, s.grand_total_kwh, epsilon = 0.1);
}

#[test]
fn grand_total_is_the_sum_of_reported_consumption() {
    for hours in [5.0, 13.0, 24.0] {
        let (_, s) = common::run(&common::short_config(hours));
        let e = &s.energy_kwh;
        let sum = e.gpu + e.cpu + e.asic + e.storage + e.network + e.cooling + e.overhead;
        assert_abs_diff_eq!(s.grand_total_kwh, sum, epsilon = 1e-6);
    }
}

#[test]
fn used_plus_curtailed_matches_available() {
    let (records, _) = common::run(&common::short_config(12.0));
    for r in &records {
        let d = &r.decision;
        assert_abs_diff_eq!(d.wind_used_mw + d.wind_curtailed_mw, r.wind.delivered_mw, epsilon = 1e-9);
        assert_abs_diff_eq!(d.solar_used_mw + d.solar_curtailed_mw, r.solar_available_mw, epsilon = 1e-9);
    }
}

#[test]
fn determinism_two_identical_runs_produce_identical_results() {
    let cfg = common::short_config(8.0);
    let (records1, summary1) = common::run(&cfg);
    let (records2, summary2) = common::run(&cfg);

    assert_eq!(records1.len(), records2.len());
    for (a, b) in records1.iter().zip(&records2) {
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.solar_available_mw, b.solar_available_mw);
    }
    assert_eq!(
        serde_json::to_string(&summary1).ok(),
        serde_json::to_string(&summary2).ok()
    );
}

#[test]
fn different_seeds_change_solar_only() {
    let mut a = common::short_config(14.0);
    let mut b = a.clone();
    a.simulation.seed = 1;
    b.simulation.seed = 2;
    let (ra, _) = common::run(&a);
    let (rb, _) = common::run(&b);
    assert!(ra.iter().zip(&rb).all(|(x, y)| x.wind == y.wind && x.load == y.load));
    assert!(
        ra.iter()
            .zip(&rb)
            .any(|(x, y)| (x.solar_available_mw - y.solar_available_mw).abs() > 1e-9)
    );
}

#[test]
fn no_renewables_and_idle_battery_import_exact_load() {
    let mut cfg = common::short_config(24.0);
    cfg.wind.rated_capacity_mw = 0.0;
    cfg.solar.farm_count = 0;
    cfg.battery.max_charge_rate_mw = 0.0;
    let (records, s) = common::run(&cfg);
    for r in &records {
        assert_eq!(r.decision.grid_import_mw, r.load.total_mw);
        assert_eq!(r.utilization_ratio, 0.0);
    }
    assert_eq!(s.renewable_penetration, 0.0);
}

#[test]
fn zero_capacity_wind_farm_delivers_nothing() {
    let mut cfg = common::short_config(24.0);
    cfg.wind.rated_capacity_mw = 0.0;
    for distance_km in [0.0, 100.0, 1000.0, 2000.0] {
        cfg.transmission.distance_km = distance_km;
        let (records, _) = common::run(&cfg);
        assert!(records.iter().all(|r| r.wind.delivered_mw == 0.0 && r.wind.loss_mw == 0.0));
    }
}

#[test]
fn soc_history_starts_at_initial_charge() {
    let cfg = common::short_config(3.0);
    let mut engine = Engine::from_scenario(&cfg).expect("valid config");
    let records = engine.run().expect("run should succeed");
    let history = engine.optimizer().soc_history();
    assert_eq!(history.len(), records.len() + 1);
    assert_abs_diff_eq!(history[0], 0.75);
    for (r, soc) in records.iter().zip(&history[1..]) {
        assert_eq!(r.decision.soc_mwh, *soc);
    }
}

#[test]
fn invalid_scenario_reports_every_field() {
    let mut cfg = SimulationConfig::baseline();
    cfg.battery.capacity_mwh = -1.0;
    cfg.grid.max_import_mw = -5.0;
    match Engine::from_scenario(&cfg) {
        Err(SimError::Configuration(errors)) => {
            assert!(errors.iter().any(|e| e.field == "battery.capacity_mwh"));
            assert!(errors.iter().any(|e| e.field == "grid.max_import_mw"));
        }
        other => panic!("expected configuration error, got {:?}", other.err()),
    }
}
