//! Mapping core errors onto HTTP statuses

use agentic_core::{Error, ErrorKind, UserFriendlyError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

/// Error body: `{"detail": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// An HTTP error response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down")
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = match &error {
            Error::ConversationActive { .. } => StatusCode::CONFLICT,
            Error::ConversationNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidState(_) | Error::InvalidToken(_) => StatusCode::BAD_REQUEST,
            _ => match error.kind() {
                ErrorKind::Upstream | ErrorKind::Parsing => StatusCode::BAD_GATEWAY,
                ErrorKind::Protocol => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        // 4xx details describe the caller's mistake; 5xx details stay generic
        let detail = if status.is_client_error() {
            error.to_string()
        } else {
            warn!(error = %error, status = status.as_u16(), "Request failed");
            error.user_message()
        };
        Self { status, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::ConversationKind;

    #[test]
    fn test_status_mapping() {
        let active = ApiError::from(Error::ConversationActive {
            user_id: "u1".into(),
            kind: ConversationKind::Resume,
        });
        assert_eq!(active.status, StatusCode::CONFLICT);
        assert!(active.detail.contains("u1"));

        let missing = ApiError::from(Error::ConversationNotFound {
            user_id: "u1".into(),
            kind: ConversationKind::Resume,
        });
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let bad_state = ApiError::from(Error::InvalidState("fifth".into()));
        assert_eq!(bad_state.status, StatusCode::BAD_REQUEST);

        let upstream = ApiError::from(Error::Llm(agentic_llm::Error::Timeout(1000)));
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);
        assert!(!upstream.detail.contains("1000"));

        let internal = ApiError::from(Error::Internal("redis down".into()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.detail.contains("redis"));
    }
}
