// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Isometric viewport framing

use crate::analysis::AnalysisResult;
use nalgebra::{Point3, Vector3};

/// Minimum camera distance, keeps tiny models framable
pub const MIN_DISTANCE: f32 = 3.0;
/// Distance per unit of the largest extent
pub const DISTANCE_FACTOR: f32 = 1.8;
/// cos 45°
const ISOMETRIC: f32 = 0.7071;

/// Camera placement for the rendering collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub camera_position: Point3<f32>,
    pub camera_target: Point3<f32>,
    pub near_plane: f32,
    pub far_plane: f32,
    pub min_orbit_distance: f32,
    pub max_orbit_distance: f32,
}

impl Framing {
    pub fn from_analysis(analysis: &AnalysisResult) -> Self {
        compute_framing(analysis.center, analysis.max_extent())
    }

    /// Distance between camera and target
    pub fn distance(&self) -> f32 {
        (self.camera_position - self.camera_target).norm()
    }
}

/// Place the camera on the `(+1, +1, +1)` diagonal looking at `center`.
///
/// Clip planes are two orders of magnitude either side of the camera
/// distance.
pub fn compute_framing(center: Point3<f32>, max_extent: f32) -> Framing {
    let distance = (max_extent * DISTANCE_FACTOR).max(MIN_DISTANCE);
    let offset = distance * ISOMETRIC;

    Framing {
        camera_position: center + Vector3::new(offset, offset, offset),
        camera_target: center,
        near_plane: distance / 100.0,
        far_plane: distance * 100.0,
        min_orbit_distance: max_extent * 0.1,
        max_orbit_distance: max_extent * 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_large_model() {
        let framing = compute_framing(Point3::origin(), 5.0);
        assert_relative_eq!(framing.camera_position.x, 9.0 * 0.7071, epsilon = 1e-5);
        assert_relative_eq!(framing.camera_position.y, framing.camera_position.z);
        assert_relative_eq!(framing.min_orbit_distance, 0.5);
        assert_relative_eq!(framing.max_orbit_distance, 50.0);
        assert_relative_eq!(framing.near_plane, 0.09, epsilon = 1e-6);
        assert_relative_eq!(framing.far_plane, 900.0, epsilon = 1e-3);
    }

    #[test]
    fn test_tiny_model_uses_floor() {
        let framing = compute_framing(Point3::new(1.0, 2.0, 3.0), 0.2);
        assert_eq!(framing.camera_target, Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(framing.camera_position.x, 1.0 + 3.0 * 0.7071, epsilon = 1e-5);
        assert_relative_eq!(framing.camera_position.z, 3.0 + 3.0 * 0.7071, epsilon = 1e-5);
    }

    #[test]
    fn test_distance_matches_isometric_offset() {
        let framing = compute_framing(Point3::origin(), 10.0);
        assert_relative_eq!(framing.distance(), 18.0 * 0.7071 * 3f32.sqrt(), epsilon = 1e-4);
    }
}
