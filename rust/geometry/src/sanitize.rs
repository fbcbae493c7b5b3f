// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry sanitizer
//!
//! Turns decoder output into canonical geometry: declared buffers only,
//! normals present, bounds computed, centred on the origin and no larger
//! than the configured ceiling. Each step is independent. A failing step
//! logs a warning and leaves the geometry as the previous step produced it.
//!
//! The sanitizer never adds or removes vertices or faces. The one exception
//! is geometry with no usable positions, which is replaced by a unit cube.

use crate::error::{Error, Result};
use crate::normals::calculate_normals;
use crate::primitives::unit_cube;
use meshport_core::{BoundingBox, BoundingSphere, RawGeometry};

/// Largest extent tolerated before rescaling
pub const DEFAULT_MAX_DIMENSION: f32 = 10.0;
/// Largest extent after rescaling
pub const DEFAULT_TARGET_DIMENSION: f32 = 5.0;

/// Centre offsets below this fraction of the model size count as centred
const CENTER_TOLERANCE: f32 = 1e-6;

/// Sanitizer settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanitizeConfig {
    /// Rescale when the largest bounding-box extent exceeds this
    pub max_dimension: f32,
    /// Largest extent after rescaling
    pub target_dimension: f32,
    /// Translate the bounding-box centre to the origin
    pub center: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            target_dimension: DEFAULT_TARGET_DIMENSION,
            center: true,
        }
    }
}

/// Total, synchronous geometry normalisation
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometrySanitizer {
    config: SanitizeConfig,
}

impl GeometrySanitizer {
    pub fn new(config: SanitizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SanitizeConfig {
        &self.config
    }

    /// Run every step in order. Never fails.
    pub fn sanitize(&self, geometry: RawGeometry) -> RawGeometry {
        let mut geometry = rebuild(geometry);

        if !geometry.has_normals() {
            match calculate_normals(&geometry) {
                Ok(normals) => geometry.normals = Some(normals),
                Err(e) => step_failed("compute_normals", &e),
            }
        }

        if let Err(e) = update_bounds(&mut geometry) {
            step_failed("compute_bounds", &e);
        }

        if self.config.center {
            if let Err(e) = center(&mut geometry) {
                step_failed("center", &e);
            }
        }

        if let Err(e) = self.scale(&mut geometry) {
            step_failed("scale", &e);
        }

        geometry
    }

    fn scale(&self, geometry: &mut RawGeometry) -> Result<()> {
        let bounds = current_bounds(geometry)?;
        let max_dimension = bounds.max_dimension();
        if !(max_dimension > self.config.max_dimension) {
            return Ok(());
        }

        let factor = self.config.target_dimension / max_dimension;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::NonFinite("scale factor"));
        }

        geometry.positions.iter_mut().for_each(|v| *v *= factor);
        tracing::debug!(factor, from = max_dimension, "scaled geometry");
        update_bounds(geometry)
    }
}

fn step_failed(step: &'static str, error: &Error) {
    tracing::warn!(step, error = %error, "sanitizer step failed, continuing");
}

/// Fresh geometry built from the declared attributes only.
///
/// Attribute buffers whose length does not match the vertex count are
/// dropped. Cached bounds are discarded and recomputed later.
fn rebuild(geometry: RawGeometry) -> RawGeometry {
    let RawGeometry {
        positions,
        indices,
        normals,
        uvs,
        colors,
        ..
    } = geometry;

    if positions.is_empty() || positions.len() % 3 != 0 {
        tracing::warn!(
            values = positions.len(),
            "geometry has no usable positions, substituting unit cube"
        );
        return unit_cube();
    }

    let vertex_count = positions.len() / 3;
    let keep = |name: &'static str, buffer: Option<Vec<f32>>, expected: usize| {
        buffer.filter(|b| {
            let ok = b.len() == expected;
            if !ok && !b.is_empty() {
                tracing::warn!(attribute = name, len = b.len(), expected, "dropping mismatched attribute");
            }
            ok
        })
    };

    RawGeometry {
        normals: keep("normal", normals, vertex_count * 3),
        uvs: keep("uv", uvs, vertex_count * 2),
        colors: keep("color", colors, vertex_count * 3),
        positions,
        indices,
        bounding_box: None,
        bounding_sphere: None,
    }
}

fn update_bounds(geometry: &mut RawGeometry) -> Result<()> {
    let bounds = BoundingBox::from_positions(&geometry.positions)
        .ok_or_else(|| Error::EmptyGeometry("no positions to bound".into()))?;
    geometry.bounding_sphere = Some(BoundingSphere::from_positions(&geometry.positions, &bounds));
    geometry.bounding_box = Some(bounds);
    Ok(())
}

fn current_bounds(geometry: &RawGeometry) -> Result<BoundingBox> {
    geometry
        .bounding_box
        .ok_or_else(|| Error::EmptyGeometry("bounds were not computed".into()))
}

fn center(geometry: &mut RawGeometry) -> Result<()> {
    let bounds = current_bounds(geometry)?;
    let center = bounds.center();
    if !center.iter().all(|c| c.is_finite()) {
        return Err(Error::NonFinite("bounding-box center"));
    }

    let tolerance = CENTER_TOLERANCE * bounds.max_dimension().max(1.0);
    if center.coords.amax() <= tolerance {
        return Ok(());
    }

    for vertex in geometry.positions.chunks_exact_mut(3) {
        vertex[0] -= center.x;
        vertex[1] -= center.y;
        vertex[2] -= center.z;
    }
    update_bounds(geometry)
}
