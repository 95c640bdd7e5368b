use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::error::FeedError;

// Extended and basic ISO-8601 date-times, seconds optional.
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];
const ZONED_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%z",
];

/// How the `time` field of an incoming sample is read.
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
pub enum TimePolicy {
    /// ISO-8601 with a zone designator; a bare timestamp is read as UTC.
    StrictIso,
    /// Naive wall-clock time in a fixed zone east of UTC.
    LocalShift,
}

/// Turns source timestamps into the canonical UTC instant used as the
/// track key and the clock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    policy: TimePolicy,
    local_offset: FixedOffset,
}

impl TimeNormalizer {
    pub fn strict_iso() -> Self {
        Self {
            policy: TimePolicy::StrictIso,
            local_offset: Utc.fix(),
        }
    }

    /// `local_offset` is the source zone's offset from UTC, so the canonical
    /// instant is the local reading minus that offset.
    pub fn local_shift(local_offset: FixedOffset) -> Self {
        Self {
            policy: TimePolicy::LocalShift,
            local_offset,
        }
    }

    pub fn policy(&self) -> TimePolicy {
        self.policy
    }

    pub fn local_offset(&self) -> FixedOffset {
        self.local_offset
    }

    /// Accepts ISO-8601 date-times in extended (`2024-01-01T12:30:00`) or
    /// basic (`20240101T123000`) form, with optional seconds and fraction.
    /// A date without a time of day is rejected.
    pub fn normalize(&self, input: &str) -> Result<DateTime<Utc>, FeedError> {
        let s = input.trim();

        // An explicit zone designator always wins, whatever the policy.
        if let Some(dt) = parse_zoned(s) {
            return Ok(dt);
        }

        let naive = parse_naive(s).ok_or_else(|| FeedError::InvalidTimestamp {
            input: input.to_string(),
            reason: "expected ISO-8601 date-time".into(),
        })?;

        match self.policy {
            TimePolicy::StrictIso => Ok(naive.and_utc()),
            TimePolicy::LocalShift => self
                .local_offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| FeedError::InvalidTimestamp {
                    input: input.to_string(),
                    reason: "local time out of range".into(),
                }),
        }
    }

    /// Inverse of [`normalize`](Self::normalize): renders an instant the way a
    /// producer following this policy would send it.
    pub fn format(&self, time: DateTime<Utc>) -> String {
        match self.policy {
            TimePolicy::StrictIso => time.to_rfc3339_opts(SecondsFormat::Millis, true),
            TimePolicy::LocalShift => time
                .with_timezone(&self.local_offset)
                .naive_local()
                .format("%Y-%m-%d %H:%M:%S%.3f")
                .to_string(),
        }
    }
}

fn parse_zoned(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(rest) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return parse_naive(rest).map(|naive| naive.and_utc());
    }
    ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parses a signed offset such as `+9h`, `-5h 30m` or `0s`. No sign means
/// east of UTC.
pub fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    let s = s.trim();
    let (neg, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let secs = humantime::parse_duration(rest.trim())
        .map_err(|e| e.to_string())?
        .as_secs();
    let secs = i32::try_from(secs).map_err(|_| format!("offset too large: {}", s))?;
    let secs = if neg { -secs } else { secs };
    FixedOffset::east_opt(secs).ok_or_else(|| format!("offset out of range: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn kst() -> FixedOffset {
        parse_offset("+9h").unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn strict_iso_reads_utc_marker() {
        let t = TimeNormalizer::strict_iso()
            .normalize("2024-01-01T00:00:00Z")
            .unwrap();
        assert_eq!(t, utc("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn strict_iso_honours_explicit_offset() {
        let t = TimeNormalizer::strict_iso()
            .normalize("2024-01-01T09:00:00+09:00")
            .unwrap();
        assert_eq!(t, utc("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn strict_iso_reads_bare_timestamp_as_utc() {
        let t = TimeNormalizer::strict_iso()
            .normalize("2024-01-01T00:00:00.250")
            .unwrap();
        assert_eq!(t, utc("2024-01-01T00:00:00.250Z"));
    }

    #[test]
    fn local_shift_subtracts_zone_offset() {
        let n = TimeNormalizer::local_shift(kst());
        assert_eq!(
            n.normalize("2024-01-01T00:00:00").unwrap(),
            utc("2023-12-31T15:00:00Z")
        );
        assert_eq!(
            n.normalize("2024-01-01 00:00:00").unwrap(),
            utc("2023-12-31T15:00:00Z")
        );
    }

    #[test]
    fn reduced_precision_and_basic_forms() {
        for n in [
            TimeNormalizer::strict_iso(),
            TimeNormalizer::local_shift(kst()),
        ] {
            assert_eq!(
                n.normalize("2024-01-01T12:30Z").unwrap(),
                utc("2024-01-01T12:30:00Z")
            );
            assert_eq!(
                n.normalize("20240101T123000Z").unwrap(),
                utc("2024-01-01T12:30:00Z")
            );
            assert_eq!(
                n.normalize("20240101T213000+0900").unwrap(),
                utc("2024-01-01T12:30:00Z")
            );
            assert_eq!(
                n.normalize("2024-01-01T21:30+09:00").unwrap(),
                utc("2024-01-01T12:30:00Z")
            );
        }
        assert_eq!(
            TimeNormalizer::local_shift(kst())
                .normalize("20240101T2130")
                .unwrap(),
            utc("2024-01-01T12:30:00Z")
        );
    }

    #[test]
    fn malformed_input_is_rejected() {
        for n in [
            TimeNormalizer::strict_iso(),
            TimeNormalizer::local_shift(kst()),
        ] {
            for input in [
                "not-a-date",
                "",
                "2024-13-01T00:00:00",
                "2024-01-01",
                "2024-01-01Z",
                "2024-01-01T12:30:00Zulu",
            ] {
                assert!(
                    matches!(n.normalize(input), Err(FeedError::InvalidTimestamp { .. })),
                    "{} accepted {:?}",
                    n.policy(),
                    input
                );
            }
        }
    }

    #[test]
    fn chronological_inputs_stay_ordered() {
        let n = TimeNormalizer::local_shift(kst());
        let a = n.normalize("2024-01-01 08:59:59.900").unwrap();
        let b = n.normalize("2024-01-01 09:00:00").unwrap();
        let c = n.normalize("2024-01-01 09:00:00.001").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn format_is_read_back_by_normalize() {
        let t = utc("2024-05-06T07:08:09.125Z");
        for n in [
            TimeNormalizer::strict_iso(),
            TimeNormalizer::local_shift(kst()),
        ] {
            assert_eq!(n.normalize(&n.format(t)).unwrap(), t);
        }
        assert_eq!(
            TimeNormalizer::local_shift(kst()).format(t),
            "2024-05-06 16:08:09.125"
        );
    }

    #[test]
    fn offsets_parse_with_sign() {
        assert_eq!(kst().local_minus_utc(), 9 * 3600);
        assert_eq!(
            parse_offset("-5h 30m").unwrap().local_minus_utc(),
            -(Duration::minutes(330).num_seconds() as i32)
        );
        assert_eq!(parse_offset("0s").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("+30h").is_err());
        assert!(parse_offset("soon").is_err());
    }
}
