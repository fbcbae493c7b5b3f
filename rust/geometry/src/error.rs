// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of individual sanitizer steps.
///
/// These never reach a caller of [`GeometrySanitizer::sanitize`]; each step
/// logs its error and the pipeline continues with the next one.
///
/// [`GeometrySanitizer::sanitize`]: crate::GeometrySanitizer::sanitize
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Empty geometry: {0}")]
    EmptyGeometry(String),

    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Non-finite {0}")]
    NonFinite(&'static str),

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),
}
