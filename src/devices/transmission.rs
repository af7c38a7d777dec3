use crate::config::{Phases, TransmissionConfig};

/// Ohmic loss model of a transmission line (P = I²R).
///
/// Pure and stateless: the same model serves the live wind feeder and the
/// offline distance sweep, which only varies the distance argument.
#[derive(Debug, Clone, Copy)]
pub struct TransmissionLine {
    /// Line length used by [`TransmissionLine::net_power_mw`] (km).
    pub distance_km: f64,
    /// Line voltage (V).
    pub voltage_v: f64,
    /// Conductor resistivity (Ω·m).
    pub resistivity_ohm_m: f64,
    /// Conductor cross-section (m²).
    pub conductor_area_m2: f64,
    pub phases: Phases,
}

impl TransmissionLine {
    pub fn new(config: &TransmissionConfig) -> Self {
        Self {
            distance_km: config.distance_km,
            voltage_v: config.voltage_kv * 1e3,
            resistivity_ohm_m: config.resistivity_ohm_m,
            conductor_area_m2: config.conductor_area_mm2 * 1e-6,
            phases: config.phases,
        }
    }

    /// Conductor resistance over `distance_km` (Ω).
    pub fn resistance_ohm(&self, distance_km: f64) -> f64 {
        self.resistivity_ohm_m * distance_km.max(0.0) * 1e3 / self.conductor_area_m2
    }

    /// Power lost carrying `power_mw` over `distance_km` (MW).
    ///
    /// Non-positive power carries no loss. A line without voltage or conductor
    /// area cannot carry anything, so the whole flow is reported as loss.
    pub fn loss_mw(&self, power_mw: f64, distance_km: f64) -> f64 {
        if power_mw <= 0.0 {
            return 0.0;
        }
        if self.voltage_v <= 0.0 || self.conductor_area_m2 <= 0.0 {
            return power_mw;
        }

        let power_w = power_mw * 1e6;
        let resistance = self.resistance_ohm(distance_km);
        let loss_w = match self.phases {
            Phases::Three => {
                let current = power_w / (self.voltage_v * 3.0_f64.sqrt());
                3.0 * current * current * resistance
            }
            Phases::Single => {
                let current = power_w / self.voltage_v;
                current * current * resistance
            }
        };
        loss_w / 1e6
    }

    /// Power delivered after losses over the configured distance, floored at 0.
    pub fn net_power_mw(&self, generated_mw: f64) -> f64 {
        (generated_mw - self.loss_mw(generated_mw, self.distance_km)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line(phases: Phases) -> TransmissionLine {
        TransmissionLine::new(&TransmissionConfig {
            phases,
            ..TransmissionConfig::default()
        })
    }

    #[test]
    fn resistance_of_copper_line() {
        // 1.68e-8 Ω·m × 1e6 m / 500e-6 m² = 33.6 Ω
        assert_abs_diff_eq!(line(Phases::Three).resistance_ohm(1000.0), 33.6, epsilon = 1e-9);
    }

    #[test]
    fn three_phase_loss_matches_hand_calculation() {
        // I = 1.33e6 / (34500 √3), loss = 3 I² R
        let l = line(Phases::Three);
        let current = 1.33e6 / (34_500.0 * 3.0_f64.sqrt());
        let expected = 3.0 * current * current * 33.6 / 1e6;
        assert_abs_diff_eq!(l.loss_mw(1.33, 1000.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn phase_count_does_not_change_loss_at_equal_voltage() {
        // 3 (P / (V√3))² R == (P / V)² R
        let single = line(Phases::Single).loss_mw(2.0, 500.0);
        let three = line(Phases::Three).loss_mw(2.0, 500.0);
        assert_abs_diff_eq!(single, three, epsilon = 1e-12);
    }

    #[test]
    fn lower_voltage_loses_more() {
        let mut low = line(Phases::Single);
        low.voltage_v /= 2.0;
        let high = line(Phases::Single);
        // Halving the voltage doubles the current and quadruples the loss.
        assert_abs_diff_eq!(
            low.loss_mw(2.0, 500.0),
            4.0 * high.loss_mw(2.0, 500.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn loss_increases_with_distance() {
        let l = line(Phases::Three);
        let p = 1.2;
        assert!(l.loss_mw(p, 100.0) < l.loss_mw(p, 1000.0));
        assert!(l.loss_mw(p, 1000.0) < l.loss_mw(p, 2000.0));
    }

    #[test]
    fn zero_power_has_no_loss() {
        let l = line(Phases::Three);
        assert_eq!(l.loss_mw(0.0, 1000.0), 0.0);
        assert_eq!(l.loss_mw(-1.0, 1000.0), 0.0);
        assert_eq!(l.net_power_mw(0.0), 0.0);
    }

    #[test]
    fn net_power_floors_at_zero() {
        let mut l = line(Phases::Single);
        l.voltage_v = 100.0;
        assert_eq!(l.net_power_mw(5.0), 0.0);
    }

    #[test]
    fn dead_line_delivers_nothing() {
        let mut l = line(Phases::Three);
        l.voltage_v = 0.0;
        assert_eq!(l.net_power_mw(3.0), 0.0);
        assert!(l.loss_mw(3.0, 10.0).is_finite());
    }
}
