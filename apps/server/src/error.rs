// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meshport_processing::LoadError;
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing file in request")]
    MissingFile,

    #[error("File too large: maximum size is {max_mb} MB")]
    FileTooLarge { max_mb: usize },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Raw cause, for logs and developer tooling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&LoadError> for ErrorResponse {
    fn from(err: &LoadError) -> Self {
        Self {
            error: err.user_message(),
            code: err.code().to_string(),
            detail: Some(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::BadRequest(_) | ApiError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Load(e) => load_status(e),
            ApiError::Internal(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::MissingFile => "MISSING_FILE",
            ApiError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Multipart(_) => "MULTIPART_ERROR",
            ApiError::Load(e) => e.code(),
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Join(_) => "TASK_ERROR",
        }
    }
}

fn load_status(err: &LoadError) -> StatusCode {
    match err {
        LoadError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        LoadError::NetworkFailure { .. } => StatusCode::BAD_GATEWAY,
        LoadError::CorsBlocked { .. } => StatusCode::FORBIDDEN,
        LoadError::EmptyOrCorrupt { .. } | LoadError::ParseFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LoadError::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Load(e) => ErrorResponse::from(e),
            other => ErrorResponse {
                error: other.to_string(),
                code: other.code().to_string(),
                detail: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshport_processing::FormatTag;

    #[test]
    fn test_load_error_status() {
        let cases = [
            (LoadError::UnsupportedFormat { extension: "xyz".into() }, 415),
            (LoadError::NetworkFailure { detail: "reset".into() }, 502),
            (LoadError::CorsBlocked { detail: "403".into() }, 403),
            (
                LoadError::EmptyOrCorrupt {
                    format: FormatTag::Stl,
                    detail: "no facets".into(),
                },
                422,
            ),
            (
                LoadError::ParseFailure {
                    format: FormatTag::Ply,
                    detail: "bad header".into(),
                },
                422,
            ),
            (LoadError::Unknown { detail: "?".into() }, 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::Load(err).status().as_u16(), status);
        }
    }

    #[test]
    fn test_load_error_body_uses_user_message() {
        let err = LoadError::UnsupportedFormat { extension: "xyz".into() };
        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, "UNSUPPORTED_FORMAT");
        assert_eq!(body.error, err.user_message());
        assert_eq!(body.detail.as_deref(), Some("Unsupported format: .xyz"));
    }
}
