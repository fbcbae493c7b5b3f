// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for fetching, parsing and loading.
//!
//! [`FetchError`] and [`ParseError`] are raw errors raised inside a load
//! attempt. [`LoadError`] is the classified form a caller receives.

use std::time::Duration;

use meshport_core::FormatTag;
use thiserror::Error;

/// Failure retrieving bytes for a location
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Server refused the request (401/403), typically a cross-origin rejection
    #[error("Access denied (HTTP {status}) for {location}")]
    AccessDenied { status: u16, location: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} fetching {location}")]
    Status { status: u16, location: String },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Failure inside one parse attempt
#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] meshport_core::Error),

    #[error("Parser task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ParseError {
    fn from(err: tokio::task::JoinError) -> Self {
        ParseError::Task(err.to_string())
    }
}

/// Classified load failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Unsupported format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("Network failure: {detail}")]
    NetworkFailure { detail: String },

    #[error("Cross-origin request blocked: {detail}")]
    CorsBlocked { detail: String },

    #[error("{format} file is empty or corrupt: {detail}")]
    EmptyOrCorrupt { format: FormatTag, detail: String },

    #[error("Failed to parse {format} file: {detail}")]
    ParseFailure { format: FormatTag, detail: String },

    #[error("Unknown error: {detail}")]
    Unknown { detail: String },
}

impl LoadError {
    /// Map a raw attempt error onto the fixed taxonomy
    pub fn classify(raw: &ParseError, format: FormatTag) -> Self {
        let detail = raw.to_string();
        match raw {
            ParseError::Fetch(FetchError::AccessDenied { .. }) => LoadError::CorsBlocked { detail },
            ParseError::Fetch(_) => LoadError::NetworkFailure { detail },
            ParseError::Decode(meshport_core::Error::UnsupportedFormat { extension }) => {
                LoadError::UnsupportedFormat {
                    extension: extension.clone(),
                }
            }
            ParseError::Decode(e) if e.is_empty_or_truncated() => {
                LoadError::EmptyOrCorrupt { format, detail }
            }
            ParseError::Decode(_) => LoadError::ParseFailure { format, detail },
            ParseError::Task(_) => LoadError::Unknown { detail },
        }
    }

    /// Everything except an unsupported format is retried
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LoadError::UnsupportedFormat { .. })
    }

    /// Stable machine-readable code
    pub const fn code(&self) -> &'static str {
        match self {
            LoadError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            LoadError::NetworkFailure { .. } => "NETWORK_FAILURE",
            LoadError::CorsBlocked { .. } => "CORS_BLOCKED",
            LoadError::EmptyOrCorrupt { .. } => "EMPTY_OR_CORRUPT",
            LoadError::ParseFailure { .. } => "PARSE_FAILURE",
            LoadError::Unknown { .. } => "UNKNOWN",
        }
    }

    /// Templated message safe to show an end user
    pub fn user_message(&self) -> String {
        match self {
            LoadError::UnsupportedFormat { extension } if extension.is_empty() => {
                "This file has no extension, so its 3D format could not be determined.".to_string()
            }
            LoadError::UnsupportedFormat { extension } => format!(
                "The .{} format is not supported. Supported formats: STL, OBJ, GLTF, GLB, PLY, STEP, IGES.",
                extension
            ),
            LoadError::NetworkFailure { .. } => {
                "Unable to load the 3D model file. Please check if the file is accessible.".to_string()
            }
            LoadError::CorsBlocked { .. } => {
                "The 3D model file could not be loaded because its server refused access.".to_string()
            }
            LoadError::EmptyOrCorrupt { format, .. } => format!(
                "The {} file contains no usable geometry. It may be empty or corrupted.",
                format
            ),
            LoadError::ParseFailure { format, .. } => format!(
                "The {} file could not be read. It may be damaged or use an unsupported variant.",
                format
            ),
            LoadError::Unknown { .. } => {
                "An unexpected error occurred while loading the 3D model.".to_string()
            }
        }
    }
}

impl From<meshport_core::Error> for LoadError {
    fn from(err: meshport_core::Error) -> Self {
        match err {
            meshport_core::Error::UnsupportedFormat { extension } => {
                LoadError::UnsupportedFormat { extension }
            }
            other => LoadError::Unknown {
                detail: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_fetch_errors() {
        let denied = ParseError::Fetch(FetchError::AccessDenied {
            status: 403,
            location: "https://cdn.example.com/a.stl".into(),
        });
        assert_eq!(LoadError::classify(&denied, FormatTag::Stl).code(), "CORS_BLOCKED");

        let missing = ParseError::Fetch(FetchError::NotFound("a.stl".into()));
        assert_eq!(LoadError::classify(&missing, FormatTag::Stl).code(), "NETWORK_FAILURE");

        let timeout = ParseError::Fetch(FetchError::Timeout(Duration::from_secs(30)));
        assert!(matches!(
            LoadError::classify(&timeout, FormatTag::Obj),
            LoadError::NetworkFailure { .. }
        ));
    }

    #[test]
    fn test_classify_decode_errors() {
        let empty = ParseError::Decode(meshport_core::Error::EmptyScene);
        assert!(matches!(
            LoadError::classify(&empty, FormatTag::Gltf),
            LoadError::EmptyOrCorrupt {
                format: FormatTag::Gltf,
                ..
            }
        ));

        let truncated = ParseError::Decode(meshport_core::Error::Truncated {
            expected: 184,
            got: 90,
        });
        assert_eq!(LoadError::classify(&truncated, FormatTag::Stl).code(), "EMPTY_OR_CORRUPT");

        let broken = ParseError::Decode(meshport_core::Error::Ply("bad header".into()));
        assert!(matches!(
            LoadError::classify(&broken, FormatTag::Ply),
            LoadError::ParseFailure {
                format: FormatTag::Ply,
                ..
            }
        ));

        let task = ParseError::Task("panicked".into());
        assert_eq!(LoadError::classify(&task, FormatTag::Ply).code(), "UNKNOWN");
    }

    #[test]
    fn test_retry_policy() {
        assert!(!LoadError::UnsupportedFormat {
            extension: "xyz".into()
        }
        .is_retryable());
        assert!(LoadError::CorsBlocked { detail: String::new() }.is_retryable());
        assert!(LoadError::EmptyOrCorrupt {
            format: FormatTag::Stl,
            detail: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_user_messages_hide_details() {
        let error = LoadError::NetworkFailure {
            detail: "connection reset by peer at 10.0.0.3:443".into(),
        };
        let message = error.user_message();
        assert!(message.contains("Unable to load the 3D model file"));
        assert!(!message.contains("10.0.0.3"));

        let unsupported = LoadError::UnsupportedFormat {
            extension: "xyz".into(),
        };
        assert!(unsupported.user_message().contains(".xyz"));
    }
}
