use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use super::error::SimulateError;
use super::tle::ElementSet;
use crate::feed::{ecef_to_geodetic, AltitudeUnit, Cartesian3, OrbitSample, TimeNormalizer};

/// Produces wire samples for one satellite by SGP4 propagation.
pub struct Simulator {
    name: Option<String>,
    elements: Elements,
    constants: Constants,
    normalizer: TimeNormalizer,
    altitude_unit: AltitudeUnit,
}

impl Simulator {
    pub fn from_tle(
        tle: &str,
        normalizer: TimeNormalizer,
        altitude_unit: AltitudeUnit,
    ) -> Result<Self, SimulateError> {
        let set = ElementSet::split(tle)?;
        let name = set.name.map(str::to_string);
        let elements =
            Elements::from_tle(name.clone(), set.line1.as_bytes(), set.line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            name,
            elements,
            constants,
            normalizer,
            altitude_unit,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sample_at(&self, timestamp: DateTime<Utc>) -> Result<OrbitSample, SimulateError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| SimulateError::Propagation(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| SimulateError::Propagation(e.to_string()))?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &timestamp.naive_utc(),
        ));
        let geo = ecef_to_geodetic(&earth_fixed_meters(prediction.position, sidereal));

        Ok(OrbitSample {
            time: self.normalizer.format(timestamp),
            lat: geo.lat_deg,
            lon: geo.lon_deg,
            alt: self.altitude_unit.from_meters(geo.alt_m),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
        })
    }
}

/// TEME position in km to ECEF in meters: a rotation about the polar axis by
/// the sidereal angle. Polar motion is ignored.
fn earth_fixed_meters(teme_km: [f64; 3], sidereal: f64) -> Cartesian3 {
    let (sin, cos) = sidereal.sin_cos();
    let [x, y, z] = teme_km.map(|v| v * 1000.0);
    Cartesian3::new(cos * x + sin * y, cos * y - sin * x, z)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feed::parse_offset;
    use chrono::TimeZone;

    pub(crate) const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 20, 12, 30, 0).unwrap()
    }

    #[test]
    fn iss_sample_is_plausible() {
        let sim = Simulator::from_tle(ISS_TLE, TimeNormalizer::strict_iso(), AltitudeUnit::Meters)
            .unwrap();
        assert_eq!(sim.name(), Some("ISS (ZARYA)"));

        let sample = sim.sample_at(at()).unwrap();
        assert_eq!(sample.time, "2008-09-20T12:30:00.000Z");
        assert!(sample.lat.abs() <= 51.7, "lat {}", sample.lat);
        assert!((-180.0..=180.0).contains(&sample.lon));
        assert!(sample.alt > 300_000.0 && sample.alt < 450_000.0, "alt {}", sample.alt);
    }

    #[test]
    fn honours_unit_and_time_policy() {
        let sim = Simulator::from_tle(
            ISS_TLE,
            TimeNormalizer::local_shift(parse_offset("+9h").unwrap()),
            AltitudeUnit::Kilometers,
        )
        .unwrap();
        let sample = sim.sample_at(at()).unwrap();
        assert_eq!(sample.time, "2008-09-20 21:30:00.000");
        assert!(sample.alt > 300.0 && sample.alt < 450.0, "alt {}", sample.alt);
    }

    #[test]
    fn rotation_preserves_radius() {
        let teme = [4000.0, -3000.0, 5000.0];
        let ecef = earth_fixed_meters(teme, 1.234);
        let origin = Cartesian3::new(0.0, 0.0, 0.0);
        assert!((ecef.distance(&origin) - 1000.0 * 50_000_000f64.sqrt()).abs() < 1e-6);
        assert_eq!(ecef.z, 5_000_000.0);

        let quarter = earth_fixed_meters([1.0, 0.0, 0.0], std::f64::consts::FRAC_PI_2);
        assert!(quarter.x.abs() < 1e-9 && (quarter.y + 1000.0).abs() < 1e-9);
    }

    #[test]
    fn bad_tle_is_rejected() {
        assert!(Simulator::from_tle(
            "1 nope\n2 nope",
            TimeNormalizer::strict_iso(),
            AltitudeUnit::Meters
        )
        .is_err());
    }
}
