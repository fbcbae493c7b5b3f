// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load requests and results.

use meshport_core::{DecodedMesh, FormatTag, MaterialDescriptor, RawGeometry};
use meshport_geometry::{placeholder, AnalysisResult, Framing, GeometrySanitizer};

/// What to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// URL, file path or fetcher key
    pub location: String,
    /// Declared file name, used for format detection and diagnostics
    pub name: String,
    pub mime_hint: Option<String>,
    /// Replace materials with a single wireframe overlay
    pub wireframe: bool,
}

impl LoadRequest {
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            mime_hint: None,
            wireframe: false,
        }
    }

    pub fn with_mime_hint(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

/// Parser output. Geometry is always sanitized: the only constructors run
/// the sanitizer.
#[derive(Debug, Clone)]
pub struct ParsedModel {
    geometry: RawGeometry,
    materials: Vec<MaterialDescriptor>,
    byte_len: Option<usize>,
    approximate: bool,
}

impl ParsedModel {
    /// Validate decoder output, then sanitize it.
    ///
    /// Decoded buffers must already satisfy the geometry invariants, so an
    /// out-of-range index fails the parse instead of reaching the renderer.
    pub fn from_decoded(
        decoded: DecodedMesh,
        sanitizer: &GeometrySanitizer,
        byte_len: Option<usize>,
    ) -> meshport_core::Result<Self> {
        decoded.geometry.validate()?;
        Ok(Self {
            geometry: sanitizer.sanitize(decoded.geometry),
            materials: decoded.materials,
            byte_len,
            approximate: false,
        })
    }

    /// Stand-in part for an exchange format
    pub fn placeholder(format: FormatTag, sanitizer: &GeometrySanitizer) -> Self {
        Self {
            geometry: sanitizer.sanitize(placeholder(format)),
            materials: Vec::new(),
            byte_len: None,
            approximate: true,
        }
    }

    pub fn geometry(&self) -> &RawGeometry {
        &self.geometry
    }

    pub fn materials(&self) -> &[MaterialDescriptor] {
        &self.materials
    }

    pub fn byte_len(&self) -> Option<usize> {
        self.byte_len
    }

    pub fn is_approximate(&self) -> bool {
        self.approximate
    }

    pub(crate) fn into_geometry(self) -> RawGeometry {
        self.geometry
    }
}

/// Descriptive metadata of a loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    pub format: FormatTag,
    pub name: String,
    pub vertex_count: usize,
    pub face_count: usize,
    pub bounding_box_min: [f32; 3],
    pub bounding_box_max: [f32; 3],
    pub approx_file_size_bytes: Option<u64>,
    /// Placeholder geometry, not the real part
    pub approximate: bool,
    pub load_time_ms: u64,
    /// Parse attempts made, including the successful one
    pub attempts: u32,
}

/// Canonical result of a successful load. Immutable.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    geometry: RawGeometry,
    materials: Vec<MaterialDescriptor>,
    metadata: ModelMetadata,
    analysis: AnalysisResult,
}

impl LoadedModel {
    pub(crate) fn new(
        geometry: RawGeometry,
        materials: Vec<MaterialDescriptor>,
        metadata: ModelMetadata,
        analysis: AnalysisResult,
    ) -> Self {
        Self {
            geometry,
            materials,
            metadata,
            analysis,
        }
    }

    pub fn geometry(&self) -> &RawGeometry {
        &self.geometry
    }

    /// Never empty
    pub fn materials(&self) -> &[MaterialDescriptor] {
        &self.materials
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn analysis(&self) -> &AnalysisResult {
        &self.analysis
    }

    /// Camera placement for this model
    pub fn framing(&self) -> Framing {
        Framing::from_analysis(&self.analysis)
    }

    pub fn into_parts(self) -> (RawGeometry, Vec<MaterialDescriptor>, ModelMetadata, AnalysisResult) {
        (self.geometry, self.materials, self.metadata, self.analysis)
    }
}
