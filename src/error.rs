//! Error types shared by configuration loading and the simulation core.

use std::fmt;

use crate::config::ConfigError;

/// Dispatch constraint blamed for an infeasible step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// `grid + wind + solar + discharge - charge >= load` cannot be met.
    PowerBalance,
    /// Next SOC cannot be kept at or below capacity.
    SocUpperBound,
    /// Next SOC cannot be kept at or above the minimum SOC.
    SocLowerBound,
    /// The solver reported infeasibility but no single bound explains it.
    Unidentified,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PowerBalance => "power balance",
            Self::SocUpperBound => "SOC upper bound",
            Self::SocLowerBound => "SOC lower bound",
            Self::Unidentified => "unidentified constraint",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the simulation core.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// One or more configuration fields are invalid; raised before any step runs.
    #[error("invalid configuration: {}", describe(.0))]
    Configuration(Vec<ConfigError>),

    /// The per-step LP has no feasible point. The run cannot continue because
    /// SOC continuity is broken.
    #[error("step {step}: optimization infeasible, violated {constraint}")]
    OptimizationInfeasible { step: usize, constraint: Constraint },

    /// The solver failed for a reason other than infeasibility.
    #[error("step {step}: solver failure: {message}")]
    Solver { step: usize, message: String },
}

impl From<ConfigError> for SimError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(vec![error])
    }
}

fn describe(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
