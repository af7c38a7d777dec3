//! Per-step linear dispatch of grid, wind, solar and battery.
//!
//! Each step is solved myopically from the current battery state:
//!
//! ```text
//! minimise   price·grid + penalty·(wind_curt + solar_curt) + cycling·(charge + discharge)
//! subject to grid + wind + solar + discharge - charge >= load
//!            wind + solar <= load + charge
//!            min_soc <= soc + (charge·η_c - discharge/η_d)·Δt <= capacity
//!            every flow within its box bounds
//! ```
//!
//! The cycling cost keeps the solver from burning surplus by charging and
//! discharging in the same step; it must stay below the curtailment penalty
//! for the battery to soak up surplus at all.

use good_lp::solvers::minilp::minilp;
use good_lp::{Expression, ResolutionError, Solution, SolverModel, constraint, variable, variables};
use tracing::{debug, warn};

pub use super::power_balance::BALANCE_REL_TOL;
use super::power_balance::balance_holds;
use super::types::{DispatchDecision, StepInput};
use crate::config::SimulationConfig;
use crate::devices::battery::{BatteryParams, BatteryState};
use crate::error::{Constraint, SimError};

/// Deviations beyond this are reported as warnings rather than debug noise.
const CLAMP_WARN_MW: f64 = 1e-9;

/// Limits, prices and step length shared by every dispatch step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchParams {
    pub battery: BatteryParams,
    /// Grid import limit (MW).
    pub max_import_mw: f64,
    /// Grid energy price (currency/MWh).
    pub energy_price_per_mwh: f64,
    /// Penalty per curtailed MWh of wind or solar.
    pub curtailment_penalty_per_mwh: f64,
    /// Cost per MWh of battery throughput.
    pub cycling_cost_per_mwh: f64,
    /// Step duration (h).
    pub dt_hours: f64,
}

impl DispatchParams {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            battery: BatteryParams::new(&config.battery),
            max_import_mw: config.grid.max_import_mw.max(0.0),
            energy_price_per_mwh: config.grid.energy_price_per_mwh,
            curtailment_penalty_per_mwh: config.optimization.curtailment_penalty_per_mwh,
            cycling_cost_per_mwh: config.optimization.cycling_cost_per_mwh,
            dt_hours: config.simulation.step_hours(),
        }
    }
}

/// Solves one dispatch step.
///
/// Pure: the same `params`, `state` and `input` always give the same result.
///
/// # Arguments
///
/// * `params` - Battery, grid and objective parameters
/// * `state` - Battery state at the start of the step
/// * `input` - Load and renewable availability for the step
///
/// # Returns
///
/// The battery state after the step and the decision that produced it.
///
/// # Errors
///
/// Returns [`SimError::OptimizationInfeasible`] when no dispatch meets every
/// constraint, naming the constraint that cannot be satisfied, and
/// [`SimError::Solver`] for any other solver failure.
pub fn dispatch_step(
    params: &DispatchParams,
    state: BatteryState,
    input: &StepInput,
) -> Result<(BatteryState, DispatchDecision), SimError> {
    let step = input.timestep;
    let load = input.load_mw.max(0.0);
    let wind_avail = input.wind_available_mw.max(0.0);
    let solar_avail = input.solar_available_mw.max(0.0);
    let battery = &params.battery;
    let rate = battery.max_rate_mw;
    let dt = params.dt_hours;
    let soc = state.soc_mwh;

    let mut vars = variables!();
    let grid = vars.add(variable().min(0.0).max(params.max_import_mw));
    let wind = vars.add(variable().min(0.0).max(wind_avail));
    let solar = vars.add(variable().min(0.0).max(solar_avail));
    let charge = vars.add(variable().min(0.0).max(rate));
    let discharge = vars.add(variable().min(0.0).max(rate));

    // Curtailment is `available - used`; its constant part drops out of the objective.
    let objective: Expression = grid * params.energy_price_per_mwh
        - (wind + solar) * params.curtailment_penalty_per_mwh
        + (charge + discharge) * params.cycling_cost_per_mwh;
    let soc_delta = charge * (battery.eta_c * dt) - discharge * (dt / battery.eta_d);

    let solution = vars
        .minimise(objective)
        .using(minilp)
        .with(constraint!(grid + wind + solar + discharge - charge >= load))
        .with(constraint!(wind + solar - charge <= load))
        .with(constraint!(soc_delta.clone() <= battery.max_soc_mwh() - soc))
        .with(constraint!(soc_delta >= battery.min_soc_mwh() - soc))
        .solve()
        .map_err(|e| match e {
            ResolutionError::Infeasible => SimError::OptimizationInfeasible {
                step,
                constraint: diagnose(params, soc, load, wind_avail + solar_avail),
            },
            other => SimError::Solver {
                step,
                message: other.to_string(),
            },
        })?;

    let wind_used = clamp_to_bounds(step, "wind_used", solution.value(wind), wind_avail);
    let solar_used = clamp_to_bounds(step, "solar_used", solution.value(solar), solar_avail);
    let charge_mw = clamp_to_bounds(step, "battery_charge", solution.value(charge), rate);
    let discharge_mw = clamp_to_bounds(step, "battery_discharge", solution.value(discharge), rate);
    let grid_raw = clamp_to_bounds(step, "grid_import", solution.value(grid), params.max_import_mw);

    // Grid covers exactly the residual, which removes solver round-off from the balance.
    let residual = load - wind_used - solar_used - discharge_mw + charge_mw;
    let grid_import = residual.clamp(0.0, params.max_import_mw);
    if (grid_import - grid_raw).abs() > CLAMP_WARN_MW * load.max(1.0) {
        debug!(step, grid_raw, grid_import, "grid import snapped to residual load");
    }

    let soc_mwh = settle_soc(step, battery, battery.next_soc(soc, charge_mw, discharge_mw, dt));

    let decision = DispatchDecision {
        grid_import_mw: grid_import,
        wind_used_mw: wind_used,
        solar_used_mw: solar_used,
        battery_charge_mw: charge_mw,
        battery_discharge_mw: discharge_mw,
        wind_curtailed_mw: (wind_avail - wind_used).max(0.0),
        solar_curtailed_mw: (solar_avail - solar_used).max(0.0),
        soc_mwh,
    };

    if !balance_holds(load, &decision, BALANCE_REL_TOL) {
        return Err(SimError::OptimizationInfeasible {
            step,
            constraint: Constraint::PowerBalance,
        });
    }

    Ok((BatteryState { soc_mwh }, decision))
}

/// Clamps a solver value into `[0, upper]`, logging any correction.
fn clamp_to_bounds(step: usize, name: &'static str, value: f64, upper: f64) -> f64 {
    let clamped = value.clamp(0.0, upper.max(0.0));
    let off = (clamped - value).abs();
    if off > CLAMP_WARN_MW {
        warn!(step, variable = name, value, clamped, "solver value outside bounds, clamped");
    } else if off > 0.0 {
        debug!(step, variable = name, value, clamped, "round-off clamp");
    }
    clamped
}

/// Clamps a post-solve SOC into the battery band, logging any correction.
fn settle_soc(step: usize, battery: &BatteryParams, next: f64) -> f64 {
    let soc_mwh = battery.clamp_soc(next);
    let off = (soc_mwh - next).abs();
    if off > CLAMP_WARN_MW {
        warn!(step, soc = next, clamped = soc_mwh, "SOC outside band after solve, clamped");
    } else if off > 0.0 {
        debug!(step, soc = next, clamped = soc_mwh, "SOC round-off clamp");
    }
    soc_mwh
}

/// Names the constraint that makes a step infeasible.
fn diagnose(params: &DispatchParams, soc: f64, load: f64, renewable_mw: f64) -> Constraint {
    let battery = &params.battery;
    let dt = params.dt_hours;
    let headroom = (soc - battery.min_soc_mwh()).max(0.0);
    let max_discharge = if dt > 0.0 {
        battery.max_rate_mw.min(headroom * battery.eta_d / dt)
    } else {
        0.0
    };

    if params.max_import_mw + renewable_mw + max_discharge < load {
        Constraint::PowerBalance
    } else if soc - battery.max_rate_mw / battery.eta_d * dt > battery.max_soc_mwh() {
        Constraint::SocUpperBound
    } else if soc + battery.max_rate_mw * battery.eta_c * dt < battery.min_soc_mwh() {
        Constraint::SocLowerBound
    } else {
        Constraint::Unidentified
    }
}

/// Stateful wrapper around [`dispatch_step`] that owns the battery state.
#[derive(Debug, Clone)]
pub struct DispatchOptimizer {
    params: DispatchParams,
    state: BatteryState,
    /// SOC at the start of the run followed by the SOC after every step (MWh).
    soc_history: Vec<f64>,
}

impl DispatchOptimizer {
    pub fn new(params: DispatchParams, initial: BatteryState) -> Self {
        Self {
            params,
            state: initial,
            soc_history: vec![initial.soc_mwh],
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            DispatchParams::from_config(config),
            BatteryParams::initial_state(&config.battery),
        )
    }

    /// Solves one step and advances the battery state.
    ///
    /// # Errors
    ///
    /// Propagates [`dispatch_step`] errors; the state is left unchanged.
    pub fn step(&mut self, input: &StepInput) -> Result<DispatchDecision, SimError> {
        let (next, decision) = dispatch_step(&self.params, self.state, input)?;
        self.state = next;
        self.soc_history.push(next.soc_mwh);
        Ok(decision)
    }

    pub fn params(&self) -> &DispatchParams {
        &self.params
    }

    pub fn state(&self) -> BatteryState {
        self.state
    }

    pub fn soc_history(&self) -> &[f64] {
        &self.soc_history
    }
}
