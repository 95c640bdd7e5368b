mod clock;
mod error;
mod geodesy;
mod sample;
mod session;
mod time;
mod track;

pub use clock::SimulationClock;
pub use geodesy::{ecef_to_geodetic, AltitudeUnit, Cartesian3, Geodetic};
pub use sample::OrbitSample;
pub use session::{AnchorState, FeedSession, FeedSettings, Frame, SessionStats, SessionStatus};
pub use time::{parse_offset, TimeNormalizer, TimePolicy};
pub use track::TrackPoint;
