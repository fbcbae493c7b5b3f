// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Descriptive geometry metrics
//!
//! Volume is the product of bounding-box extents and surface area is the
//! sum of indexed triangle areas. Both are coarse and make no attempt to
//! handle open or non-convex meshes.

use std::fmt;

use meshport_core::{BoundingBox, RawGeometry};
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Far fewer faces than the vertex count suggests
    DegenerateFaces,
    /// No normals survived sanitization
    InvertedNormals,
}

impl IssueKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            IssueKind::DegenerateFaces => "degenerate-faces",
            IssueKind::InvertedNormals => "inverted-normals",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic finding
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub count: u64,
    pub description: String,
}

/// Metrics of one sanitized geometry
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub vertex_count: usize,
    pub face_count: usize,
    pub bounding_box: BoundingBox,
    /// Product of bounding-box extents
    pub approx_volume: f64,
    /// Sum of indexed triangle areas, 0 when unindexed
    pub approx_surface_area: f64,
    pub issues: Vec<GeometryIssue>,
    pub center: Point3<f32>,
    pub extents: Vector3<f32>,
}

impl AnalysisResult {
    /// Largest bounding-box extent
    #[inline]
    pub fn max_extent(&self) -> f32 {
        self.extents.x.max(self.extents.y).max(self.extents.z)
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }
}

/// Analyze geometry without modifying it. Deterministic.
pub fn analyze(geometry: &RawGeometry) -> AnalysisResult {
    let vertex_count = geometry.vertex_count();
    let face_count = geometry.face_count();
    let bounding_box = geometry
        .bounding_box
        .or_else(|| BoundingBox::from_positions(&geometry.positions))
        .unwrap_or_default();
    let extents = bounding_box.size();

    let approx_volume = extents.x as f64 * extents.y as f64 * extents.z as f64;
    let approx_surface_area = surface_area(geometry);

    let mut issues = Vec::new();
    let expected_faces = vertex_count as f64 / 10.0;
    if (face_count as f64) < expected_faces {
        let count = (expected_faces - face_count as f64).floor() as u64;
        issues.push(GeometryIssue {
            kind: IssueKind::DegenerateFaces,
            severity: Severity::Medium,
            count,
            description: format!(
                "{} faces for {} vertices suggests missing or collapsed faces",
                face_count, vertex_count
            ),
        });
    }
    if !geometry.has_normals() {
        issues.push(GeometryIssue {
            kind: IssueKind::InvertedNormals,
            severity: Severity::Low,
            count: 1,
            description: "geometry has no vertex normals; shading may be wrong".to_string(),
        });
    }

    AnalysisResult {
        vertex_count,
        face_count,
        bounding_box,
        approx_volume,
        approx_surface_area,
        issues,
        center: bounding_box.center(),
        extents,
    }
}

fn surface_area(geometry: &RawGeometry) -> f64 {
    let Some(indices) = &geometry.indices else {
        return 0.0;
    };

    let point = |i: u32| {
        geometry
            .position(i as usize)
            .map(|p| Point3::new(p.x as f64, p.y as f64, p.z as f64))
    };

    indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let (a, b, c) = (point(tri[0])?, point(tri[1])?, point(tri[2])?);
            Some((b - a).cross(&(c - a)).norm() * 0.5)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::unit_cube;
    use crate::sanitize::GeometrySanitizer;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_cube_metrics() {
        let cube = GeometrySanitizer::default().sanitize(unit_cube());
        let result = analyze(&cube);
        assert_eq!(result.vertex_count, 8);
        assert_eq!(result.face_count, 12);
        assert_relative_eq!(result.approx_volume, 1.0);
        assert_relative_eq!(result.approx_surface_area, 6.0, epsilon = 1e-9);
        assert!(result.issues.is_empty());
        assert_relative_eq!(result.max_extent(), 1.0);
    }

    #[test]
    fn test_unindexed_area_is_zero() {
        let soup = RawGeometry::from_positions(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(analyze(&soup).approx_surface_area, 0.0);
    }

    #[test]
    fn test_degenerate_faces_heuristic() {
        // 100 vertices, 2 faces: floor(100 / 10 - 2) = 8
        let geometry = RawGeometry::indexed(vec![0.0; 300], vec![0, 1, 2, 3, 4, 5]);
        let result = analyze(&geometry);
        let issue = result
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::DegenerateFaces)
            .unwrap();
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.count, 8);
    }

    #[test]
    fn test_missing_normals_flagged() {
        let geometry = RawGeometry::from_positions(vec![0.0; 9]);
        let result = analyze(&geometry);
        assert!(result.has_issue(IssueKind::InvertedNormals));
        assert_eq!(IssueKind::InvertedNormals.to_string(), "inverted-normals");
    }

    #[test]
    fn test_invalid_indices_skipped_in_area() {
        let mut cube = unit_cube();
        if let Some(indices) = cube.indices.as_mut() {
            indices.extend_from_slice(&[0, 1, 200]);
        }
        assert_relative_eq!(analyze(&cube).approx_surface_area, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let geometry = GeometrySanitizer::default().sanitize(unit_cube());
        let first = analyze(&geometry);
        let second = analyze(&geometry);
        assert_eq!(first.vertex_count, second.vertex_count);
        assert_eq!(first.face_count, second.face_count);
        assert_eq!(first.bounding_box, second.bounding_box);
        assert_eq!(first, second);
    }
}
