use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::clock::SimulationClock;
use super::error::FeedError;
use super::geodesy::{ecef_to_geodetic, geodetic_to_ecef, AltitudeUnit, Cartesian3, Geodetic};
use super::sample::OrbitSample;
use super::time::TimeNormalizer;
use super::track::PositionTrack;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedSettings {
    pub normalizer: TimeNormalizer,
    pub altitude_unit: AltitudeUnit,
    pub clock_multiplier: f64,
}

/// Whether the clock has been moved onto the first live sample yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnchorState {
    Unset,
    Set { at: DateTime<Utc> },
}

/// A decoded sample that passed every check and only needs to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSample {
    pub sample: OrbitSample,
    pub time: DateTime<Utc>,
    pub position: Cartesian3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ingested {
    pub time: DateTime<Utc>,
    pub anchored: bool,
    pub track_len: usize,
}

#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct SessionStats {
    pub accepted: u64,
    pub rejected: u64,
    pub out_of_order: u64,
}

/// What the renderer should draw at the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Frame {
    pub time: DateTime<Utc>,
    pub position: Option<Cartesian3>,
    pub geodetic: Option<Geodetic>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SessionStatus {
    pub id: Uuid,
    pub anchor: AnchorState,
    pub track_len: usize,
    pub span_start: Option<DateTime<Utc>>,
    pub span_end: Option<DateTime<Utc>>,
    pub clock: SimulationClock,
    pub stats: SessionStats,
    /// Attitude is carried here as received; it is not applied to the frame.
    pub last_sample: Option<OrbitSample>,
}

/// Live animation state for one producer connection.
#[derive(Debug)]
pub struct FeedSession {
    id: Uuid,
    settings: FeedSettings,
    track: PositionTrack,
    clock: SimulationClock,
    anchor: AnchorState,
    stats: SessionStats,
    last_sample: Option<OrbitSample>,
}

impl FeedSession {
    pub fn new(settings: FeedSettings, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            track: PositionTrack::new(),
            clock: SimulationClock::new(now, settings.clock_multiplier),
            anchor: AnchorState::Unset,
            stats: SessionStats::default(),
            last_sample: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn track(&self) -> &PositionTrack {
        &self.track
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }

    pub fn anchor(&self) -> AnchorState {
        self.anchor
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Decode one wire message and resolve its time and position without
    /// touching the session.
    pub fn prepare(&self, text: &str) -> Result<PreparedSample, FeedError> {
        let sample = OrbitSample::from_json(text)?;
        self.prepare_sample(sample)
    }

    pub fn prepare_sample(&self, sample: OrbitSample) -> Result<PreparedSample, FeedError> {
        let time = self.settings.normalizer.normalize(&sample.time)?;
        let alt_m = self.settings.altitude_unit.to_meters(sample.alt);
        let position = geodetic_to_ecef(sample.lat, sample.lon, alt_m);
        Ok(PreparedSample {
            sample,
            time,
            position,
        })
    }

    /// Anchor the clock on the first sample, then append to the track.
    pub fn apply(&mut self, prepared: PreparedSample) -> Ingested {
        let anchored = self.anchor() == AnchorState::Unset;
        if anchored {
            self.clock.anchor_at(prepared.time);
            self.anchor = AnchorState::Set { at: prepared.time };
            log::info!("Session {} clock anchored to {}", self.id, prepared.time);
        }

        if let Some(latest) = self.track.latest() {
            if prepared.time <= latest.time {
                self.stats.out_of_order += 1;
                log::warn!(
                    "Sample at {} does not follow {}; appending as received",
                    prepared.time,
                    latest.time
                );
            }
        }

        self.track.add_sample(prepared.time, prepared.position);
        self.stats.accepted += 1;
        self.last_sample = Some(prepared.sample);

        Ingested {
            time: prepared.time,
            anchored,
            track_len: self.track.len(),
        }
    }

    pub fn handle_message(&mut self, text: &str) -> Result<Ingested, FeedError> {
        match self.prepare(text) {
            Ok(prepared) => Ok(self.apply(prepared)),
            Err(e) => {
                self.record_rejected();
                Err(e)
            }
        }
    }

    pub fn record_rejected(&mut self) {
        self.stats.rejected += 1;
    }

    pub fn frame(&self) -> Frame {
        let time = self.clock.current_time();
        let position = self.track.interpolate(time);
        Frame {
            time,
            position,
            geodetic: position.as_ref().map(ecef_to_geodetic),
        }
    }

    /// Render tick: move the playhead by `wall_elapsed` and sample the track.
    pub fn advance(&mut self, wall_elapsed: std::time::Duration) -> Frame {
        self.clock.tick(wall_elapsed);
        self.frame()
    }

    pub fn status(&self) -> SessionStatus {
        let span = self.track.span();
        SessionStatus {
            id: self.id,
            anchor: self.anchor,
            track_len: self.track.len(),
            span_start: span.map(|s| s.0),
            span_end: span.map(|s| s.1),
            clock: self.clock.clone(),
            stats: self.stats.clone(),
            last_sample: self.last_sample.clone(),
        }
    }
}
