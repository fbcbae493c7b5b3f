// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PLY decoder (ASCII and binary)
//!
//! Reads the `vertex` element (`x y z`, optional `nx ny nz`, UVs and
//! `red green blue`) and the `face` element, fan-triangulating polygons.
//! A file without faces decodes as an unindexed point set.

use std::io::BufReader;

use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{Error, Result};
use crate::geometry::{DecodedMesh, RawGeometry};
use crate::material::MaterialDescriptor;

const UV_NAMES: [(&str, &str); 3] = [("u", "v"), ("s", "t"), ("texture_u", "texture_v")];

pub fn decode_ply(bytes: &[u8]) -> Result<DecodedMesh> {
    let mut reader = BufReader::new(bytes);
    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| Error::Ply(e.to_string()))?;

    let vertices = ply
        .payload
        .get("vertex")
        .filter(|v| !v.is_empty())
        .ok_or(Error::EmptyScene)?;

    let count = vertices.len();
    let mut positions = Vec::with_capacity(count * 3);
    let mut normals = Vec::with_capacity(count * 3);
    let mut uvs = Vec::with_capacity(count * 2);
    let mut colors = Vec::with_capacity(count * 3);

    for vertex in vertices {
        for axis in ["x", "y", "z"] {
            let value = scalar(vertex.get(axis))
                .ok_or_else(|| Error::Ply(format!("vertex is missing numeric '{}'", axis)))?;
            positions.push(value);
        }

        if let (Some(nx), Some(ny), Some(nz)) = (
            scalar(vertex.get("nx")),
            scalar(vertex.get("ny")),
            scalar(vertex.get("nz")),
        ) {
            normals.extend_from_slice(&[nx, ny, nz]);
        }

        if let Some((u, v)) = UV_NAMES.iter().find_map(|(u, v)| {
            Some((scalar(vertex.get(*u))?, scalar(vertex.get(*v))?))
        }) {
            uvs.extend_from_slice(&[u, v]);
        }

        if let (Some(r), Some(g), Some(b)) = (
            channel(vertex.get("red")),
            channel(vertex.get("green")),
            channel(vertex.get("blue")),
        ) {
            colors.extend_from_slice(&[r, g, b]);
        }
    }

    let mut indices = Vec::new();
    let mut skipped = 0usize;
    if let Some(faces) = ply.payload.get("face") {
        for face in faces {
            let polygon = face
                .get("vertex_indices")
                .or_else(|| face.get("vertex_index"))
                .and_then(index_list);
            match polygon {
                Some(polygon) if polygon.len() >= 3 => {
                    for i in 1..polygon.len() - 1 {
                        indices.extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
                    }
                }
                _ => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped PLY faces without a usable index list");
    }

    let geometry = RawGeometry {
        indices: (!indices.is_empty()).then_some(indices),
        normals: (normals.len() == positions.len()).then_some(normals),
        uvs: (uvs.len() == count * 2).then_some(uvs),
        colors: (colors.len() == positions.len()).then_some(colors),
        positions,
        bounding_box: None,
        bounding_sphere: None,
    };

    tracing::debug!(
        vertices = geometry.vertex_count(),
        faces = geometry.face_count(),
        point_cloud = !geometry.is_indexed(),
        "decoded PLY"
    );

    let materials = if geometry.colors.is_some() {
        vec![MaterialDescriptor::vertex_colored()]
    } else {
        Vec::new()
    };
    Ok(DecodedMesh::new(geometry, materials))
}

fn scalar(property: Option<&Property>) -> Option<f32> {
    match property? {
        Property::Float(v) => Some(*v),
        Property::Double(v) => Some(*v as f32),
        Property::Int(v) => Some(*v as f32),
        Property::UInt(v) => Some(*v as f32),
        Property::Short(v) => Some(*v as f32),
        Property::UShort(v) => Some(*v as f32),
        Property::Char(v) => Some(*v as f32),
        Property::UChar(v) => Some(*v as f32),
        _ => None,
    }
}

/// Colour channel normalised to `[0, 1]`
fn channel(property: Option<&Property>) -> Option<f32> {
    match property? {
        Property::UChar(v) => Some(*v as f32 / 255.0),
        Property::UShort(v) => Some(*v as f32 / 65535.0),
        Property::Float(v) => Some(v.clamp(0.0, 1.0)),
        Property::Double(v) => Some(v.clamp(0.0, 1.0) as f32),
        other => scalar(Some(other)).map(|v| (v / 255.0).clamp(0.0, 1.0)),
    }
}

fn index_list(property: &Property) -> Option<Vec<u32>> {
    fn convert<T: Copy + TryInto<u32>>(values: &[T]) -> Option<Vec<u32>> {
        values.iter().map(|&v| v.try_into().ok()).collect()
    }
    match property {
        Property::ListInt(v) => convert(v),
        Property::ListUInt(v) => Some(v.clone()),
        Property::ListShort(v) => convert(v),
        Property::ListUShort(v) => convert(v),
        Property::ListChar(v) => convert(v),
        Property::ListUChar(v) => convert(v),
        _ => None,
    }
}
