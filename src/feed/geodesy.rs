use serde::{Deserialize, Serialize};

// WGS-84
const WGS84_A_M: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B_M: f64 = WGS84_A_M * (1.0 - WGS84_F);
const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
const WGS84_EP2: f64 = WGS84_E2 / (1.0 - WGS84_E2);

/// Earth-centred, earth-fixed position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Cartesian3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    pub fn lerp(&self, other: &Cartesian3, t: f64) -> Cartesian3 {
        Cartesian3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    #[cfg(test)]
    pub fn distance(&self, other: &Cartesian3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Geodetic {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
}

/// Unit of the `alt` field on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum_macros::Display,
    clap::ValueEnum,
    utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum AltitudeUnit {
    Meters,
    Kilometers,
}

impl AltitudeUnit {
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            AltitudeUnit::Meters => value,
            AltitudeUnit::Kilometers => value * 1000.0,
        }
    }

    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            AltitudeUnit::Meters => meters,
            AltitudeUnit::Kilometers => meters / 1000.0,
        }
    }
}

pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Cartesian3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A_M / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    Cartesian3 {
        x: (n + alt_m) * cos_lat * lon.cos(),
        y: (n + alt_m) * cos_lat * lon.sin(),
        z: (n * (1.0 - WGS84_E2) + alt_m) * sin_lat,
    }
}

/// Bowring's estimate followed by two fixed-point refinements, which keeps
/// the error well under a millimetre out to geostationary altitude.
pub fn ecef_to_geodetic(pos: &Cartesian3) -> Geodetic {
    let p = (pos.x * pos.x + pos.y * pos.y).sqrt();
    let lon = pos.y.atan2(pos.x);

    let theta = (pos.z * WGS84_A_M).atan2(p * WGS84_B_M);
    let (sin_t, cos_t) = theta.sin_cos();
    let mut lat = (pos.z + WGS84_EP2 * WGS84_B_M * sin_t.powi(3))
        .atan2(p - WGS84_E2 * WGS84_A_M * cos_t.powi(3));
    for _ in 0..2 {
        let sin_lat = lat.sin();
        let n = WGS84_A_M / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        lat = (pos.z + WGS84_E2 * n * sin_lat).atan2(p);
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = WGS84_A_M / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt = if cos_lat.abs() > 1e-10 {
        p / cos_lat - n
    } else {
        pos.z.abs() - WGS84_B_M
    };

    Geodetic {
        lat_deg: lat.to_degrees(),
        lon_deg: lon.to_degrees(),
        alt_m: alt,
    }
}
