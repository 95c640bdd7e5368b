use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

pub enum ApiError {
    NoSession,
    NoFrame,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NoSession => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::with_message(
                    "no_session",
                    "no producer connection has been made yet",
                )),
            )
                .into_response(),
            ApiError::NoFrame => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::with_message(
                    "no_frame",
                    "the animator has not produced a frame yet",
                )),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
