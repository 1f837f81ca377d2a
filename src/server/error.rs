use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::error::{ErrorCode, PexError};

/// Error half of every handler result.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PexError),
    MalformedBody(String),
    RouteNotFound,
}

impl From<PexError> for ApiError {
    fn from(err: PexError) -> Self {
        Self::Pipeline(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::MalformedBody(detail) => {
                (StatusCode::BAD_REQUEST, format!("Invalid request body: {detail}"))
            }
            Self::RouteNotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            Self::Pipeline(err) => {
                let code = err.code();
                if code.is_input_error() {
                    (StatusCode::BAD_REQUEST, err.to_string())
                } else if code == ErrorCode::NotFound {
                    (StatusCode::NOT_FOUND, err.to_string())
                } else {
                    error!(code = %code, error = %err, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_bad_request() {
        for err in [
            PexError::EmptyContent,
            PexError::UnsupportedFormat("pdf".into()),
            PexError::UnsupportedPlatform("tiktok".into()),
            PexError::InvalidInput("bad".into()),
        ] {
            let (status, _) = ApiError::from(err).status_and_message();
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn missing_folder_is_not_found() {
        let (status, message) = ApiError::from(PexError::NotFound("folder 'x'".into())).status_and_message();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(message.contains("folder 'x'"));
    }

    #[test]
    fn internal_details_are_hidden() {
        let (status, message) =
            ApiError::from(PexError::SinkFailed("disk full at /srv".into())).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }
}
