// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for detection and decoding
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while detecting or decoding a model file
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Truncated data: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("No drawable geometry found")]
    EmptyScene,

    #[error("OBJ error: {0}")]
    Obj(String),

    #[error("glTF error: {0}")]
    Gltf(String),

    #[error("PLY error: {0}")]
    Ply(String),

    #[error("Invalid UTF-8 content: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl Error {
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent(message.into())
    }

    /// True when the bytes were readable but held nothing usable.
    pub fn is_empty_or_truncated(&self) -> bool {
        matches!(self, Error::EmptyScene | Error::Truncated { .. })
    }
}
