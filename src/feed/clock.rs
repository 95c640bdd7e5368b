use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Playhead that decides which instant of the track is shown.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SimulationClock {
    start_time: DateTime<Utc>,
    current_time: DateTime<Utc>,
    multiplier: f64,
    should_animate: bool,
}

impl SimulationClock {
    pub fn new(start_time: DateTime<Utc>, multiplier: f64) -> Self {
        Self {
            start_time,
            current_time: start_time,
            multiplier,
            should_animate: true,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn is_animating(&self) -> bool {
        self.should_animate
    }

    /// Restart playback at `time`: both the start and the playhead move there.
    pub fn anchor_at(&mut self, time: DateTime<Utc>) {
        self.start_time = time;
        self.current_time = time;
    }

    pub fn pause(&mut self) {
        self.should_animate = false;
    }

    pub fn resume(&mut self) {
        self.should_animate = true;
    }

    /// Advance by `wall_elapsed` scaled by the multiplier. No-op while paused.
    ///
    /// A step that would leave chrono's representable range pauses the clock
    /// at its current time.
    pub fn tick(&mut self, wall_elapsed: std::time::Duration) -> DateTime<Utc> {
        if !self.should_animate {
            return self.current_time;
        }
        let micros = wall_elapsed.as_secs_f64() * 1e6 * self.multiplier;
        match self
            .current_time
            .checked_add_signed(Duration::microseconds(micros.round() as i64))
        {
            Some(next) => self.current_time = next,
            None => {
                log::warn!(
                    "Clock at {} cannot advance by {:?} x{}, pausing",
                    self.current_time,
                    wall_elapsed,
                    self.multiplier
                );
                self.should_animate = false;
            }
        }
        self.current_time
    }

    /// How far the playhead has moved past the start time.
    pub fn elapsed_since_start(&self) -> Duration {
        self.current_time - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration as StdDuration;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn ticks_at_wall_rate() {
        let mut clock = SimulationClock::new(start(), 1.0);
        clock.tick(StdDuration::from_millis(1500));
        assert_eq!(clock.current_time(), start() + Duration::milliseconds(1500));
        assert_eq!(clock.elapsed_since_start(), Duration::milliseconds(1500));
    }

    #[test]
    fn multiplier_scales_ticks() {
        let mut clock = SimulationClock::new(start(), 10.0);
        clock.tick(StdDuration::from_secs(2));
        assert_eq!(clock.current_time(), start() + Duration::seconds(20));
    }

    #[test]
    fn paused_clock_holds() {
        let mut clock = SimulationClock::new(start(), 1.0);
        clock.pause();
        clock.tick(StdDuration::from_secs(5));
        assert_eq!(clock.current_time(), start());
        clock.resume();
        clock.tick(StdDuration::from_secs(5));
        assert_eq!(clock.current_time(), start() + Duration::seconds(5));
    }

    #[test]
    fn anchoring_restarts_playback() {
        let mut clock = SimulationClock::new(start(), 4.0);
        clock.tick(StdDuration::from_secs(1));
        let later = start() + Duration::days(3);
        clock.anchor_at(later);
        assert_eq!(clock.current_time(), later);
        assert_eq!(clock.start_time(), later);
        assert_eq!(clock.elapsed_since_start(), Duration::zero());
        assert_eq!(clock.multiplier(), 4.0);
    }

    #[test]
    fn out_of_range_step_pauses_instead_of_panicking() {
        let mut clock = SimulationClock::new(start(), 1e12);
        let mut last = clock.current_time();
        for _ in 0..300 {
            let now = clock.tick(StdDuration::from_millis(50));
            assert!(now >= last);
            last = now;
        }
        assert!(!clock.is_animating());
        assert_eq!(clock.current_time(), last);
    }
}
