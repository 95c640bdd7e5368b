use serde::{Deserialize, Serialize};

use super::error::FeedError;

/// One telemetry update as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
pub struct OrbitSample {
    pub time: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl OrbitSample {
    pub fn from_json(text: &str) -> Result<Self, FeedError> {
        let sample: OrbitSample = serde_json::from_str(text)?;
        Ok(sample)
    }
}
