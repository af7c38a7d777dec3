use chrono::{Duration, NaiveDateTime};

/// A simulation clock that tracks steps and simulated time over a fixed horizon.
///
/// The `Clock` yields each step index together with the timestamp at the
/// start of that step.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use hybrid_dc_sim::sim::clock::Clock;
///
/// let start = NaiveDate::from_ymd_opt(2025, 5, 21)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .unwrap();
/// let mut clock = Clock::new(3, start, 15.0);
/// let mut steps = Vec::new();
///
/// clock.run(|step, _| steps.push(step));
/// assert_eq!(steps, vec![0, 1, 2]);
/// ```
pub struct Clock {
    /// Current step of the simulation
    current: usize,
    /// Total steps to run in the simulation
    total: usize,
    /// Timestamp of step 0
    start: NaiveDateTime,
    /// Step duration
    step: Duration,
}

impl Clock {
    /// Creates a new clock.
    ///
    /// # Arguments
    ///
    /// * `total` - The total number of steps the clock will run
    /// * `start` - Simulated time of the first step
    /// * `step_minutes` - Duration of one step in minutes
    pub fn new(total: usize, start: NaiveDateTime, step_minutes: f64) -> Self {
        let step = Duration::milliseconds((step_minutes * 60_000.0).round() as i64);
        Self {
            current: 0,
            total,
            start,
            step,
        }
    }

    /// Timestamp at the start of `step`.
    pub fn timestamp(&self, step: usize) -> NaiveDateTime {
        i32::try_from(step)
            .ok()
            .and_then(|s| self.step.checked_mul(s))
            .and_then(|offset| self.start.checked_add_signed(offset))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some((step, timestamp))` - The current step (starting from 0) and its time
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            Some((step, self.timestamp(step)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining step in the clock.
    ///
    /// # Arguments
    ///
    /// * `f` - A function that takes the step number and its timestamp
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((step, ts)) = self.tick() {
            f(step, ts);
        }
    }
}

impl Iterator for Clock {
    type Item = (usize, NaiveDateTime);

    fn next(&mut self) -> Option<Self::Item> {
        self.tick()
    }
}
