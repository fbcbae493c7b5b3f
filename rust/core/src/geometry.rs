// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry data structures

use crate::error::{Error, Result};
use crate::material::MaterialDescriptor;
use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    #[inline]
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Degenerate box at the origin
    #[inline]
    pub fn zero() -> Self {
        Self::new(Point3::origin(), Point3::origin())
    }

    /// Bounds of a stride-3 position buffer.
    ///
    /// Returns `None` for an empty buffer. A NaN anywhere in the buffer
    /// poisons the whole box so callers can detect it with [`is_finite`].
    ///
    /// [`is_finite`]: BoundingBox::is_finite
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        if positions.len() < 3 {
            return None;
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);
        let mut saw_nan = false;

        positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            saw_nan |= x.is_nan() || y.is_nan() || z.is_nan();
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        if saw_nan {
            let nan = Point3::new(f32::NAN, f32::NAN, f32::NAN);
            return Some(Self::new(nan, nan));
        }

        Some(Self::new(min, max))
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Extents along each axis
    #[inline]
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest of the three extents
    #[inline]
    pub fn max_dimension(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// Bounding sphere centred on the box center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere around `bounds.center()` reaching the farthest vertex
    pub fn from_positions(positions: &[f32], bounds: &BoundingBox) -> Self {
        let center = bounds.center();
        let mut max_sq = 0.0f32;
        for chunk in positions.chunks_exact(3) {
            let dx = chunk[0] - center.x;
            let dy = chunk[1] - center.y;
            let dz = chunk[2] - center.z;
            let d = dx * dx + dy * dy + dz * dz;
            if d > max_sq || d.is_nan() {
                max_sq = d;
            }
        }
        Self {
            center,
            radius: max_sq.sqrt(),
        }
    }
}

/// Flat-buffer geometry for a single mesh.
///
/// Positions use stride 3, UVs stride 2, normals and colors stride 3.
/// An index buffer, when present, is a triangle list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGeometry {
    pub positions: Vec<f32>,
    pub indices: Option<Vec<u32>>,
    pub normals: Option<Vec<f32>>,
    pub uvs: Option<Vec<f32>>,
    pub colors: Option<Vec<f32>>,
    pub bounding_box: Option<BoundingBox>,
    pub bounding_sphere: Option<BoundingSphere>,
}

impl RawGeometry {
    /// Unindexed geometry from a position buffer
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    /// Indexed geometry from positions and a triangle list
    pub fn indexed(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices: Some(indices),
            ..Self::default()
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Indexed triangles, or one triangle per three vertices when unindexed
    #[inline]
    pub fn face_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Normals present and sized to the vertex count
    #[inline]
    pub fn has_normals(&self) -> bool {
        self.normals
            .as_ref()
            .is_some_and(|n| !n.is_empty() && n.len() == self.positions.len())
    }

    /// Position at vertex `index`
    #[inline]
    pub fn position(&self, index: usize) -> Option<Point3<f32>> {
        let base = index.checked_mul(3)?;
        let chunk = self.positions.get(base..base + 3)?;
        Some(Point3::new(chunk[0], chunk[1], chunk[2]))
    }

    /// Check the buffer invariants.
    ///
    /// Position length must be a non-zero multiple of 3, every index must
    /// reference an existing vertex, and optional attribute buffers must
    /// match the vertex count.
    pub fn validate(&self) -> Result<()> {
        if self.positions.is_empty() {
            return Err(Error::EmptyScene);
        }
        if self.positions.len() % 3 != 0 {
            return Err(Error::invalid_content(format!(
                "position buffer length {} is not a multiple of 3",
                self.positions.len()
            )));
        }

        let vertex_count = self.vertex_count();
        if let Some(indices) = &self.indices {
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::invalid_content(format!(
                    "index {} out of range for {} vertices",
                    bad, vertex_count
                )));
            }
        }

        check_attribute("normal", self.normals.as_deref(), vertex_count * 3)?;
        check_attribute("uv", self.uvs.as_deref(), vertex_count * 2)?;
        check_attribute("color", self.colors.as_deref(), vertex_count * 3)?;
        Ok(())
    }
}

fn check_attribute(name: &str, buffer: Option<&[f32]>, expected: usize) -> Result<()> {
    match buffer {
        Some(data) if data.len() != expected => Err(Error::invalid_content(format!(
            "{} buffer has {} values, expected {}",
            name,
            data.len(),
            expected
        ))),
        _ => Ok(()),
    }
}

/// Decoder output: one mesh plus whatever materials the file declared
#[derive(Debug, Clone, Default)]
pub struct DecodedMesh {
    pub geometry: RawGeometry,
    pub materials: Vec<MaterialDescriptor>,
}

impl DecodedMesh {
    pub fn new(geometry: RawGeometry, materials: Vec<MaterialDescriptor>) -> Self {
        Self {
            geometry,
            materials,
        }
    }
}
