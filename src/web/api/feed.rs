use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::feed::{Frame, SimulationClock, TrackPoint};
use crate::link::LinkStatus;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrackQuery {
    /// Only return samples at or before the playhead.
    #[serde(default)]
    pub trail: bool,
}

#[utoipa::path(
    get,
    path = "/api/feed/status",
    responses(
        (status = 200, description = "Connection and session status", body = LinkStatus)
    ),
    tag = "feed"
)]
pub async fn status(State(state): State<AppState>) -> Json<LinkStatus> {
    Json(state.link.status())
}

#[utoipa::path(
    get,
    path = "/api/feed/frame",
    responses(
        (status = 200, description = "Latest animator frame", body = Frame),
        (status = 404, description = "No frame yet", body = ErrorResponse)
    ),
    tag = "feed"
)]
pub async fn frame(State(state): State<AppState>) -> ApiResult<Json<Frame>> {
    state.link.frame().map(Json).ok_or(ApiError::NoFrame)
}

#[utoipa::path(
    get,
    path = "/api/feed/track",
    params(TrackQuery),
    responses(
        (status = 200, description = "Position track of the live session", body = Vec<TrackPoint>),
        (status = 404, description = "No session yet", body = ErrorResponse)
    ),
    tag = "feed"
)]
pub async fn track(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<Json<Vec<TrackPoint>>> {
    state
        .link
        .with_session(|s| {
            if query.trail {
                s.track().trail(s.clock().current_time()).to_vec()
            } else {
                s.track().points().to_vec()
            }
        })
        .map(Json)
        .ok_or(ApiError::NoSession)
}

#[utoipa::path(
    post,
    path = "/api/feed/clock/pause",
    responses(
        (status = 200, description = "Clock paused", body = SimulationClock),
        (status = 404, description = "No session yet", body = ErrorResponse)
    ),
    tag = "feed"
)]
pub async fn pause(State(state): State<AppState>) -> ApiResult<Json<SimulationClock>> {
    state
        .link
        .with_session_mut(|s| {
            s.clock_mut().pause();
            s.clock().clone()
        })
        .map(Json)
        .ok_or(ApiError::NoSession)
}

#[utoipa::path(
    post,
    path = "/api/feed/clock/resume",
    responses(
        (status = 200, description = "Clock running", body = SimulationClock),
        (status = 404, description = "No session yet", body = ErrorResponse)
    ),
    tag = "feed"
)]
pub async fn resume(State(state): State<AppState>) -> ApiResult<Json<SimulationClock>> {
    state
        .link
        .with_session_mut(|s| {
            s.clock_mut().resume();
            s.clock().clone()
        })
        .map(Json)
        .ok_or(ApiError::NoSession)
}
