use axum::{extract::State, response::IntoResponse};

use crate::feed::{AnchorState, Frame};
use crate::link::ConnectionState;
use crate::web::state::AppState;

use super::templates::{DashboardTemplate, SessionView};

pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    dashboard_view(&state)
}

fn dashboard_view(state: &AppState) -> DashboardTemplate {
    let status = state.link.status();
    let frame = state.link.frame();

    DashboardTemplate {
        url: status.url,
        state: state_label(&status.state),
        connections: status.connections,
        policy: state.config.time.policy.to_string(),
        altitude_unit: state.config.altitude_unit.to_string(),
        session: status.session.map(|s| SessionView {
            id: s.id.to_string(),
            anchor: match s.anchor {
                AnchorState::Unset => "waiting for first sample".to_string(),
                AnchorState::Set { at } => at.to_rfc3339(),
            },
            track_len: s.track_len,
            clock_time: s.clock.current_time().to_rfc3339(),
            playback: format!(
                "{}s since {} at x{}",
                s.clock.elapsed_since_start().num_seconds(),
                s.clock.start_time().to_rfc3339(),
                s.clock.multiplier()
            ),
            animating: s.clock.is_animating(),
            accepted: s.stats.accepted,
            rejected: s.stats.rejected,
            out_of_order: s.stats.out_of_order,
            position: position_label(frame),
        }),
    }
}

fn state_label(state: &ConnectionState) -> String {
    match state {
        ConnectionState::Idle => "idle".to_string(),
        ConnectionState::Connecting { attempt } => format!("connecting (attempt {})", attempt),
        ConnectionState::AwaitingData { since } => {
            format!("connected, awaiting data since {}", since.to_rfc3339())
        }
        ConnectionState::Streaming { last_message } => {
            format!("streaming, last message {}", last_message.to_rfc3339())
        }
        ConnectionState::Lost {
            reason,
            attempt,
            retry_at,
        } => format!(
            "lost: {} (attempt {}, retry at {})",
            reason,
            attempt,
            retry_at.to_rfc3339()
        ),
        ConnectionState::Stopped { reason: None } => "stopped".to_string(),
        ConnectionState::Stopped {
            reason: Some(reason),
        } => format!("stopped: {}", reason),
    }
}

fn position_label(frame: Option<Frame>) -> String {
    match frame.and_then(|f| f.geodetic) {
        Some(geo) => format!(
            "{:.4}°, {:.4}°, {:.1} m",
            geo.lat_deg, geo.lon_deg, geo.alt_m
        ),
        None => "outside track".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feed::{AltitudeUnit, FeedSession, FeedSettings, TimeNormalizer};
    use crate::link::LinkHandle;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn playback_counts_from_the_anchor() {
        let config =
            Config::from_str("time:\n  policy: strict_iso\naltitude_unit: meters\n").unwrap();
        let state = AppState {
            link: LinkHandle::new(&config.feed.url),
            config: Arc::new(config),
        };
        assert!(dashboard_view(&state).session.is_none());

        state.link.install_session(FeedSession::new(
            FeedSettings {
                normalizer: TimeNormalizer::strict_iso(),
                altitude_unit: AltitudeUnit::Meters,
                clock_multiplier: 3.0,
            },
            Utc::now(),
        ));
        state.link.ingest(r#"{"time":"2024-01-01T00:00:00Z","lat":36.394,"lon":127.367,"alt":500,"roll":0,"pitch":0,"yaw":0}"#);
        state
            .link
            .with_session_mut(|s| s.advance(std::time::Duration::from_secs(2)));

        let view = dashboard_view(&state);
        assert_eq!(view.policy, "strict_iso");
        let session = view.session.unwrap();
        assert_eq!(session.playback, "6s since 2024-01-01T00:00:00+00:00 at x3");
        assert_eq!(session.track_len, 1);
    }

    #[test]
    fn labels_lost_with_retry() {
        let retry_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap();
        let label = state_label(&ConnectionState::Lost {
            reason: "connection reset".to_string(),
            attempt: 2,
            retry_at,
        });
        assert_eq!(
            label,
            "lost: connection reset (attempt 2, retry at 2024-01-01T00:00:05+00:00)"
        );
    }

    #[test]
    fn position_needs_a_fix() {
        assert_eq!(position_label(None), "outside track");
    }
}
