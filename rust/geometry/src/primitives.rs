// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed procedural meshes
//!
//! The unit cube replaces geometry that has no usable positions. The
//! hex prism with a cylindrical boss stands in for CAD exchange formats
//! (STEP, IGES) that have no boundary-representation importer.

use meshport_core::{FormatTag, RawGeometry};

/// Segments around the boss cylinder
pub const BOSS_SEGMENTS: usize = 24;

/// Vertex count of every placeholder mesh
pub const PLACEHOLDER_VERTEX_COUNT: usize = 7 + 7 + 24 + BOSS_SEGMENTS * 2 + BOSS_SEGMENTS + 1;

/// Triangle count of every placeholder mesh
pub const PLACEHOLDER_FACE_COUNT: usize = 6 + 6 + 12 + BOSS_SEGMENTS * 2 + BOSS_SEGMENTS;

/// Axis-aligned cube of edge 1 centred on the origin
pub fn unit_cube() -> RawGeometry {
    #[rustfmt::skip]
    let positions = vec![
        -0.5, -0.5, -0.5,
         0.5, -0.5, -0.5,
         0.5,  0.5, -0.5,
        -0.5,  0.5, -0.5,
        -0.5, -0.5,  0.5,
         0.5, -0.5,  0.5,
         0.5,  0.5,  0.5,
        -0.5,  0.5,  0.5,
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 3, 2,  0, 2, 1, // -Z
        4, 5, 6,  4, 6, 7, // +Z
        0, 1, 5,  0, 5, 4, // -Y
        3, 7, 6,  3, 6, 2, // +Y
        0, 4, 7,  0, 7, 3, // -X
        1, 2, 6,  1, 6, 5, // +X
    ];
    RawGeometry::indexed(positions, indices)
}

/// Dimensions of the stand-in part
#[derive(Debug, Clone, Copy)]
struct PartShape {
    prism_radius: f32,
    prism_height: f32,
    boss_radius: f32,
    boss_height: f32,
}

impl PartShape {
    fn for_format(format: FormatTag) -> Self {
        match format {
            FormatTag::Iges => PartShape {
                prism_radius: 1.0,
                prism_height: 0.4,
                boss_radius: 0.35,
                boss_height: 0.7,
            },
            _ => PartShape {
                prism_radius: 1.0,
                prism_height: 0.6,
                boss_radius: 0.45,
                boss_height: 0.5,
            },
        }
    }
}

/// Deterministic stand-in mesh for an exchange format.
///
/// Y-up hexagonal prism with a cylindrical boss on its top face. Output
/// depends only on `format`, and every format yields
/// [`PLACEHOLDER_VERTEX_COUNT`] vertices.
pub fn placeholder(format: FormatTag) -> RawGeometry {
    let shape = PartShape::for_format(format);
    let mut builder = Builder::default();

    let top = shape.prism_height;
    let hex = ring(shape.prism_radius, 6);
    builder.cap(&hex, 0.0, false);
    builder.cap(&hex, top, true);
    builder.faceted_wall(&hex, 0.0, top);

    let boss = ring(shape.boss_radius, BOSS_SEGMENTS);
    builder.smooth_wall(&boss, top, top + shape.boss_height);
    builder.cap(&boss, top + shape.boss_height, true);

    RawGeometry::indexed(builder.positions, builder.indices)
}

/// Points on a circle in the XZ plane
fn ring(radius: f32, segments: usize) -> Vec<(f32, f32)> {
    (0..segments)
        .map(|i| {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

#[derive(Default)]
struct Builder {
    positions: Vec<f32>,
    indices: Vec<u32>,
}

impl Builder {
    fn push(&mut self, x: f32, y: f32, z: f32) -> u32 {
        let index = (self.positions.len() / 3) as u32;
        self.positions.extend_from_slice(&[x, y, z]);
        index
    }

    /// Triangle fan around a centre vertex, facing +Y when `up`
    fn cap(&mut self, ring: &[(f32, f32)], y: f32, up: bool) {
        let center = self.push(0.0, y, 0.0);
        let first = self.push(ring[0].0, y, ring[0].1);
        for &(x, z) in &ring[1..] {
            self.push(x, y, z);
        }
        let n = ring.len() as u32;
        for i in 0..n {
            let a = first + i;
            let b = first + (i + 1) % n;
            if up {
                self.indices.extend_from_slice(&[center, b, a]);
            } else {
                self.indices.extend_from_slice(&[center, a, b]);
            }
        }
    }

    /// Outward quad between bottom `a0 a1` and top `b0 b1`
    fn quad(&mut self, a0: u32, a1: u32, b0: u32, b1: u32) {
        self.indices.extend_from_slice(&[a0, b0, a1, a1, b0, b1]);
    }

    /// Wall with four unshared vertices per side so each face shades flat
    fn faceted_wall(&mut self, ring: &[(f32, f32)], y0: f32, y1: f32) {
        for i in 0..ring.len() {
            let (x0, z0) = ring[i];
            let (x1, z1) = ring[(i + 1) % ring.len()];
            let a0 = self.push(x0, y0, z0);
            let a1 = self.push(x1, y0, z1);
            let b0 = self.push(x0, y1, z0);
            let b1 = self.push(x1, y1, z1);
            self.quad(a0, a1, b0, b1);
        }
    }

    /// Wall sharing one bottom and one top vertex per segment
    fn smooth_wall(&mut self, ring: &[(f32, f32)], y0: f32, y1: f32) {
        let bottom = (self.positions.len() / 3) as u32;
        for &(x, z) in ring {
            self.push(x, y0, z);
        }
        let top = (self.positions.len() / 3) as u32;
        for &(x, z) in ring {
            self.push(x, y1, z);
        }
        let n = ring.len() as u32;
        for i in 0..n {
            let j = (i + 1) % n;
            self.quad(bottom + i, bottom + j, top + i, top + j);
        }
    }
}
