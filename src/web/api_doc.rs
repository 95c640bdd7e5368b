use utoipa::OpenApi;

use super::api::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::feed::status,
        super::api::feed::frame,
        super::api::feed::track,
        super::api::feed::pause,
        super::api::feed::resume,
    ),
    components(
        schemas(
            ErrorResponse,
            crate::link::LinkStatus,
            crate::link::ConnectionState,
            crate::feed::SessionStatus,
            crate::feed::SessionStats,
            crate::feed::AnchorState,
            crate::feed::SimulationClock,
            crate::feed::OrbitSample,
            crate::feed::Frame,
            crate::feed::TrackPoint,
            crate::feed::Cartesian3,
            crate::feed::Geodetic,
        )
    ),
    info(
        title = "Sat-O-Scope Feed API",
        description = "Live view of the telemetry feed, its position track and the playback clock",
        version = "0.1.0"
    ),
    tags(
        (name = "feed", description = "Telemetry feed and animation state")
    )
)]
pub struct ApiDoc;
