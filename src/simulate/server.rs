use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tower_http::trace::TraceLayer;

use super::propagation::Simulator;

#[derive(Clone)]
struct SimState {
    simulator: Arc<Simulator>,
    interval: Duration,
    start: DateTime<Utc>,
    origin: Instant,
}

impl SimState {
    /// Simulated "now": the configured start plus wall time since launch.
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed()).unwrap_or_default();
        self.start + elapsed
    }
}

/// `start` defaults to the current time; set it to replay a TLE near its
/// epoch.
pub fn router(simulator: Simulator, interval: Duration, start: Option<DateTime<Utc>>) -> Router {
    let state = SimState {
        simulator: Arc::new(simulator),
        interval,
        start: start.unwrap_or_else(Utc::now),
        origin: Instant::now(),
    };
    Router::new()
        .route("/", get(upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_simulator(
    bind: &str,
    simulator: Simulator,
    interval: Duration,
    start: Option<DateTime<Utc>>,
) -> std::io::Result<()> {
    log::info!(
        "Simulating {} on ws://{} every {:?}",
        simulator.name().unwrap_or("satellite"),
        bind,
        interval
    );
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, router(simulator, interval, start)).await
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<SimState>) -> Response {
    ws.on_upgrade(move |socket| stream_samples(socket, state))
}

async fn stream_samples(mut socket: WebSocket, state: SimState) {
    let mut ticker = interval(state.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    log::info!("Feed client connected");

    loop {
        ticker.tick().await;

        let sample = match state.simulator.sample_at(state.now()) {
            Ok(sample) => sample,
            Err(e) => {
                log::error!("Propagation failed, closing feed: {}", e);
                break;
            }
        };
        let json = match serde_json::to_string(&sample) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize sample: {}", e);
                continue;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            log::info!("Feed client disconnected");
            break;
        }
    }
}
