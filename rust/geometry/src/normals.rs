// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex normal generation

use crate::error::{Error, Result};
use meshport_core::RawGeometry;
use nalgebra::{Point3, Vector3};

/// Area-weighted smooth vertex normals.
///
/// Indexed geometry accumulates each face normal onto its three corners.
/// Unindexed geometry treats each run of three vertices as a triangle, which
/// gives flat shading. Vertices touched by no (or only zero-area) faces get a
/// zero normal.
///
/// Fails without touching `geometry` if any index is out of range.
pub fn calculate_normals(geometry: &RawGeometry) -> Result<Vec<f32>> {
    let vertex_count = geometry.vertex_count();
    if vertex_count == 0 {
        return Err(Error::EmptyGeometry("no vertices to compute normals for".into()));
    }

    let mut normals = vec![Vector3::<f64>::zeros(); vertex_count];
    let positions = &geometry.positions;
    let point = |i: usize| {
        Point3::new(
            positions[i * 3] as f64,
            positions[i * 3 + 1] as f64,
            positions[i * 3 + 2] as f64,
        )
    };

    match &geometry.indices {
        Some(indices) => {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
            for tri in indices.chunks_exact(3) {
                let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
                let normal = face_normal(point(i0), point(i1), point(i2));
                normals[i0] += normal;
                normals[i1] += normal;
                normals[i2] += normal;
            }
        }
        None => {
            for base in (0..vertex_count / 3).map(|t| t * 3) {
                let normal = face_normal(point(base), point(base + 1), point(base + 2));
                normals[base] += normal;
                normals[base + 1] += normal;
                normals[base + 2] += normal;
            }
        }
    }

    let mut out = Vec::with_capacity(vertex_count * 3);
    for normal in normals {
        let n = normal.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);
        out.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
    }
    Ok(out)
}

#[inline]
fn face_normal(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Vector3<f64> {
    let normal = (v1 - v0).cross(&(v2 - v0));
    // NaN input would poison every neighbour
    if normal.iter().all(|c| c.is_finite()) {
        normal
    } else {
        Vector3::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_triangle() {
        let geometry = RawGeometry::from_positions(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let normals = calculate_normals(&geometry).unwrap();
        assert_eq!(normals.len(), 9);
        for n in normals.chunks_exact(3) {
            assert_relative_eq!(n[2], 1.0);
        }
    }

    #[test]
    fn test_indexed_shared_vertex() {
        // Two triangles folded along the X axis
        let geometry = RawGeometry::indexed(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2, 0, 3, 1],
        );
        let normals = calculate_normals(&geometry).unwrap();
        let shared = Vector3::new(normals[0], normals[1], normals[2]);
        assert_relative_eq!(shared.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(shared.y, shared.z, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_range_index() {
        let geometry = RawGeometry::indexed(vec![0.0; 9], vec![0, 1, 7]);
        assert_eq!(
            calculate_normals(&geometry),
            Err(Error::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_degenerate_face_zero_normal() {
        let geometry = RawGeometry::from_positions(vec![0.0; 9]);
        let normals = calculate_normals(&geometry).unwrap();
        assert!(normals.iter().all(|&c| c == 0.0));
    }
}
