//! Common types for the generation and load models.

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::{Rng, rngs::StdRng};

/// Contextual information passed to the models for one simulation step.
/// # Fields
/// * `timestep` - Current simulation step index
/// * `timestamp` - Simulated wall-clock time of the step
#[derive(Debug, Clone, Copy)]
pub struct DeviceContext {
    pub timestep: usize,
    pub timestamp: NaiveDateTime,
}

impl DeviceContext {
    pub fn new(timestep: usize, timestamp: NaiveDateTime) -> Self {
        Self {
            timestep,
            timestamp,
        }
    }

    /// Fractional hour of the day, in `[0, 24)`.
    pub fn hour_of_day(&self) -> f64 {
        fractional_hour(&self.timestamp)
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }
}

/// Fractional hour of the day of `timestamp`, in `[0, 24)`.
pub fn fractional_hour(timestamp: &NaiveDateTime) -> f64 {
    f64::from(timestamp.hour())
        + f64::from(timestamp.minute()) / 60.0
        + f64::from(timestamp.second()) / 3600.0
}

/// Draws a multiplicative factor uniformly from `[1 - amplitude, 1 + amplitude]`.
///
/// Mean is 1. An amplitude of zero (or below) returns exactly 1.0 without
/// touching the generator.
pub fn bounded_noise(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return 1.0;
    }
    1.0 + rng.random_range(-amplitude..=amplitude)
}
