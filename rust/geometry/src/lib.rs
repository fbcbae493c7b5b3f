// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Meshport Geometry Processing
//!
//! Sanitization, analysis and framing for decoded meshes. Everything here
//! is synchronous and total: bad input degrades to a fallback value and a
//! logged warning, never an error returned to the caller.

pub mod analysis;
pub mod error;
pub mod framing;
pub mod material;
pub mod normals;
pub mod primitives;
pub mod sanitize;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use analysis::{analyze, AnalysisResult, GeometryIssue, IssueKind, Severity};
pub use error::{Error, Result};
pub use framing::{compute_framing, Framing};
pub use material::MaterialSanitizer;
pub use normals::calculate_normals;
pub use primitives::{placeholder, unit_cube, PLACEHOLDER_VERTEX_COUNT};
pub use sanitize::{GeometrySanitizer, SanitizeConfig};
