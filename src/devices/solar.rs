use chrono::{Datelike, NaiveDateTime};
use rand::{SeedableRng, rngs::StdRng};

use super::spline::CubicSpline;
use super::types::{bounded_noise, fractional_hour};
use crate::config::{ConfigError, SolarConfig};

/// Solar generation driven by an hourly reference curve and seasonal factors.
///
/// `SolarFarm` interpolates the hourly curve of one farm with a cubic spline,
/// scales it by the month's seasonal factor and the number of farms, and
/// perturbs it with bounded multiplicative noise to stand in for weather.
///
/// # Power Flow Convention
/// Returns **non-negative** MW available at the facility bus.
#[derive(Debug, Clone)]
pub struct SolarFarm {
    /// Hourly curve of a single farm, knots at hours 0..23.
    profile: CubicSpline,

    /// Seasonal multipliers, January first.
    pub monthly_factors: Vec<f64>,

    /// Number of identical farms.
    pub farm_count: u32,

    /// Half-width of the uniform perturbation.
    pub perturbation: f64,

    /// Random number generator for the perturbation.
    rng: StdRng,
}

impl SolarFarm {
    /// Creates a new solar farm.
    ///
    /// # Arguments
    ///
    /// * `config` - Curve, seasonal factors, farm count and perturbation
    /// * `seed` - Random seed for reproducible perturbation
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on `solar.hourly_curve_mw` if the curve
    /// cannot be interpolated.
    pub fn new(config: &SolarConfig, seed: u64) -> Result<Self, ConfigError> {
        let xs = (0..config.hourly_curve_mw.len()).map(|h| h as f64).collect();
        let profile = CubicSpline::new(xs, config.hourly_curve_mw.clone())
            .map_err(|e| ConfigError::new("solar.hourly_curve_mw", e.to_string()))?;
        Ok(Self {
            profile,
            monthly_factors: config.monthly_factors.clone(),
            farm_count: config.farm_count,
            perturbation: config.perturbation.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Unperturbed output of a single farm at `hour` (MW).
    ///
    /// Hours past the last knot produce nothing; spline undershoot near
    /// sunrise and sunset is clamped to zero.
    pub fn reference_output_mw(&self, hour: f64) -> f64 {
        self.profile.eval(hour).unwrap_or(0.0).max(0.0)
    }

    /// Seasonal factor for `month` (1-12), 1.0 when no factor is configured.
    pub fn monthly_factor(&self, month: u32) -> f64 {
        month
            .checked_sub(1)
            .and_then(|i| self.monthly_factors.get(i as usize))
            .copied()
            .unwrap_or(1.0)
    }

    /// Solar power available at `timestamp` (MW).
    ///
    /// Draws one perturbation sample per call, so the sequence of outputs is
    /// a deterministic function of the seed and the sequence of timestamps.
    pub fn expected_output(&mut self, timestamp: &NaiveDateTime) -> f64 {
        let noise = bounded_noise(&mut self.rng, self.perturbation);
        let base = self.reference_output_mw(fractional_hour(timestamp));
        let seasonal = self.monthly_factor(timestamp.month());
        (base * seasonal * f64::from(self.farm_count) * noise).max(0.0)
    }
}

/// Number of farms whose average daily energy covers a constant load.
///
/// Returns 0 when a farm produces nothing on average.
pub fn required_farms(avg_load_mw: f64, farm_capacity_mw: f64, capacity_factor: f64) -> u32 {
    let farm_average_mw = farm_capacity_mw * capacity_factor;
    if farm_average_mw <= 0.0 || avg_load_mw <= 0.0 {
        return 0;
    }
    (avg_load_mw / farm_average_mw).ceil() as u32
}
