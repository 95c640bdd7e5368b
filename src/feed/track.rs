use chrono::{DateTime, Utc};
use serde::Serialize;

use super::geodesy::Cartesian3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    pub position: Cartesian3,
}

/// Append-only position history, kept in arrival order.
///
/// Lookups assume the producer delivered samples in time order; nothing is
/// reordered or deduplicated here.
#[derive(Debug, Clone, Default)]
pub struct PositionTrack {
    points: Vec<TrackPoint>,
}

impl PositionTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sample(&mut self, time: DateTime<Utc>, position: Cartesian3) {
        self.points.push(TrackPoint { time, position });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn latest(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    /// First and last sample time.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if self.is_empty() {
            return None;
        }
        Some((self.points[0].time, self.points[self.points.len() - 1].time))
    }

    /// Linear interpolation between the samples bracketing `time`.
    /// Returns `None` outside the track's span.
    pub fn interpolate(&self, time: DateTime<Utc>) -> Option<Cartesian3> {
        let (start, end) = self.span()?;
        if time < start || time > end {
            return None;
        }

        // index of the first sample strictly after `time`
        let next = self.points.partition_point(|p| p.time <= time);
        if next == 0 {
            return Some(self.points[0].position);
        }
        let before = &self.points[next - 1];
        if before.time == time || next == self.points.len() {
            return Some(before.position);
        }
        let after = &self.points[next];

        let width = (after.time - before.time).num_microseconds()? as f64;
        let offset = (time - before.time).num_microseconds()? as f64;
        Some(before.position.lerp(&after.position, offset / width))
    }

    /// Samples at or before `until`, i.e. the path already flown.
    pub fn trail(&self, until: DateTime<Utc>) -> &[TrackPoint] {
        let end = self.points.partition_point(|p| p.time <= until);
        &self.points[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn track() -> PositionTrack {
        let mut track = PositionTrack::new();
        track.add_sample(t0(), Cartesian3::new(0.0, 0.0, 0.0));
        track.add_sample(t0() + Duration::seconds(10), Cartesian3::new(10.0, 20.0, 30.0));
        track.add_sample(t0() + Duration::seconds(30), Cartesian3::new(30.0, 20.0, 10.0));
        track
    }

    #[test]
    fn empty_track_has_no_position() {
        let track = PositionTrack::new();
        assert!(track.is_empty());
        assert_eq!(track.span(), None);
        assert_eq!(track.interpolate(t0()), None);
    }

    #[test]
    fn single_sample_answers_only_its_own_time() {
        let mut track = PositionTrack::new();
        track.add_sample(t0(), Cartesian3::new(1.0, 2.0, 3.0));
        assert_eq!(track.interpolate(t0()), Some(Cartesian3::new(1.0, 2.0, 3.0)));
        assert_eq!(track.interpolate(t0() + Duration::seconds(1)), None);
    }

    #[test]
    fn exact_sample_times_return_samples() {
        let track = track();
        for p in track.points() {
            assert_eq!(track.interpolate(p.time), Some(p.position));
        }
    }

    #[test]
    fn interpolates_between_brackets() {
        let track = track();
        assert_eq!(
            track.interpolate(t0() + Duration::seconds(5)),
            Some(Cartesian3::new(5.0, 10.0, 15.0))
        );
        assert_eq!(
            track.interpolate(t0() + Duration::seconds(20)),
            Some(Cartesian3::new(20.0, 20.0, 20.0))
        );
    }

    #[test]
    fn outside_span_is_none() {
        let track = track();
        assert_eq!(track.interpolate(t0() - Duration::milliseconds(1)), None);
        assert_eq!(track.interpolate(t0() + Duration::seconds(31)), None);
    }

    #[test]
    fn trail_stops_at_playhead() {
        let track = track();
        assert_eq!(track.trail(t0() - Duration::seconds(1)).len(), 0);
        assert_eq!(track.trail(t0() + Duration::seconds(10)).len(), 2);
        assert_eq!(track.trail(t0() + Duration::hours(1)).len(), 3);
    }

    #[test]
    fn keeps_arrival_order() {
        let mut track = PositionTrack::new();
        track.add_sample(t0() + Duration::seconds(5), Cartesian3::new(1.0, 0.0, 0.0));
        track.add_sample(t0(), Cartesian3::new(2.0, 0.0, 0.0));
        track.add_sample(t0(), Cartesian3::new(3.0, 0.0, 0.0));
        let xs: Vec<f64> = track.points().iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(track.latest().map(|p| p.position.x), Some(3.0));
    }
}
