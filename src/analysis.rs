//! Transmission loss versus distance for the configured wind farm.

use std::fmt;

use serde::Serialize;

use crate::config::{ConfigError, SimulationConfig};
use crate::devices::transmission::TransmissionLine;
use crate::devices::wind::WindFarm;

/// Wind speed at which the representative farm output is evaluated (m/s).
pub const REPRESENTATIVE_WIND_SPEED_MS: f64 = 8.0;

/// Loss of the representative output at one line length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub distance_km: f64,
    pub generated_mw: f64,
    pub loss_mw: f64,
    pub delivered_mw: f64,
    /// Loss as a share of the generated power (0.0 to 1.0).
    pub loss_fraction: f64,
}

/// Loss table across line lengths.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceSweep {
    pub points: Vec<SweepPoint>,
}

/// Evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Default sweep distances: 20 points from 100 to 2000 km.
pub fn default_distances() -> Vec<f64> {
    linspace(100.0, 2000.0, 20)
}

/// Computes transmission loss of the farm's representative output at each distance.
///
/// The representative output is the unclamped farm power at
/// [`REPRESENTATIVE_WIND_SPEED_MS`]; the capacity-factor ceiling does not apply.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the wind farm cannot be built.
pub fn distance_sweep(
    config: &SimulationConfig,
    distances: &[f64],
) -> Result<DistanceSweep, ConfigError> {
    let farm = WindFarm::from_config(config)?;
    let line = TransmissionLine::new(&config.transmission);
    let generated_mw = farm.raw_power_mw(REPRESENTATIVE_WIND_SPEED_MS);

    let points = distances
        .iter()
        .map(|&distance_km| {
            let loss_mw = line.loss_mw(generated_mw, distance_km).min(generated_mw);
            SweepPoint {
                distance_km,
                generated_mw,
                loss_mw,
                delivered_mw: (generated_mw - loss_mw).max(0.0),
                loss_fraction: if generated_mw > 0.0 {
                    loss_mw / generated_mw
                } else {
                    0.0
                },
            }
        })
        .collect();

    Ok(DistanceSweep { points })
}

impl fmt::Display for DistanceSweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Transmission Loss vs Distance ---")?;
        write!(
            f,
            "{:>10}  {:>10}  {:>10}  {:>10}  {:>7}",
            "km", "gen MW", "loss MW", "net MW", "loss %"
        )?;
        for p in &self.points {
            write!(
                f,
                "\n{:>10.1}  {:>10.4}  {:>10.4}  {:>10.4}  {:>6.2}%",
                p.distance_km,
                p.generated_mw,
                p.loss_mw,
                p.delivered_mw,
                p.loss_fraction * 100.0
            )?;
        }
        Ok(())
    }
}
