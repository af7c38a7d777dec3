//! Facility bus power balance.

use super::types::DispatchDecision;

/// Relative tolerance of the power balance check.
pub const BALANCE_REL_TOL: f64 = 1e-6;

/// Net power supplied to the facility bus by a decision.
///
/// Sources add, battery charging subtracts:
/// `grid + wind + solar + discharge - charge`.
pub fn supply_mw(decision: &DispatchDecision) -> f64 {
    decision.grid_import_mw
        + decision.wind_used_mw
        + decision.solar_used_mw
        + decision.battery_discharge_mw
        - decision.battery_charge_mw
}

/// Demand left unserved by a decision (MW, >= 0).
///
/// A shortfall within [`BALANCE_REL_TOL`] of the load is summation
/// round-off, not unserved demand, and reports as zero.
pub fn deficit_mw(load_mw: f64, decision: &DispatchDecision) -> f64 {
    if balance_holds(load_mw, decision, BALANCE_REL_TOL) {
        0.0
    } else {
        load_mw - supply_mw(decision)
    }
}

/// Whether supply meets `load_mw` within a relative tolerance.
///
/// The tolerance scales with the load, with a floor of one unit so that
/// a zero load is checked against an absolute `rel_tol`.
pub fn balance_holds(load_mw: f64, decision: &DispatchDecision, rel_tol: f64) -> bool {
    supply_mw(decision) >= load_mw - rel_tol * load_mw.abs().max(1.0)
}
