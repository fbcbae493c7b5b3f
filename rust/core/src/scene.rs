// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF 2.0 / GLB scene decoder
//!
//! Decoding is split in two so the caller can fetch external buffers:
//!
//! 1. [`GltfAsset::from_slice`] parses the JSON (or GLB container)
//! 2. [`GltfAsset::external_buffers`] lists buffer URIs that need fetching
//! 3. [`GltfAsset::decode`] resolves buffers and extracts the first
//!    triangle mesh reachable from the default scene, with its world
//!    transform applied
//!
//! Embedded GLB chunks and base64 `data:` URIs are resolved here.

use base64::Engine;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::geometry::{DecodedMesh, RawGeometry};
use crate::material::MaterialDescriptor;

/// Parsed but not yet decoded glTF asset
pub struct GltfAsset {
    gltf: gltf::Gltf,
}

/// First drawable primitive found during traversal
struct Selected<'a> {
    primitive: gltf::Primitive<'a>,
    world: Matrix4<f32>,
}

impl GltfAsset {
    /// Parse a `.gltf` JSON document or a `.glb` container
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| Error::Gltf(e.to_string()))?;
        Ok(Self { gltf })
    }

    /// `(buffer_index, uri)` for every buffer stored outside the document
    pub fn external_buffers(&self) -> Vec<(usize, String)> {
        self.gltf
            .buffers()
            .filter_map(|buffer| match buffer.source() {
                gltf::buffer::Source::Uri(uri) if !uri.starts_with("data:") => {
                    Some((buffer.index(), uri.to_string()))
                }
                _ => None,
            })
            .collect()
    }

    /// Resolve buffers and extract the first triangle mesh
    pub fn decode(self, external: Vec<(usize, Vec<u8>)>) -> Result<DecodedMesh> {
        let gltf::Gltf { document, blob } = self.gltf;
        let buffers = resolve_buffers(&document, blob, external)?;

        let (selected, drawable) = select_primitive(&document);
        let selected = selected.ok_or(Error::EmptyScene)?;
        if drawable > 1 {
            tracing::debug!(drawable, "glTF has several triangle primitives, keeping the first");
        }

        let reader = selected
            .primitive
            .reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let positions: Vec<f32> = reader
            .read_positions()
            .ok_or_else(|| Error::Gltf("primitive has no POSITION attribute".to_string()))?
            .flat_map(|[x, y, z]| {
                let p = selected.world.transform_point(&Point3::new(x, y, z));
                [p.x, p.y, p.z]
            })
            .collect();
        if positions.is_empty() {
            return Err(Error::EmptyScene);
        }
        let vertex_count = positions.len() / 3;

        let normal_xform = normal_matrix(&selected.world);
        let normals: Option<Vec<f32>> = reader.read_normals().map(|iter| {
            iter.flat_map(|[x, y, z]| {
                let n = normal_xform * Vector3::new(x, y, z);
                let n = n.try_normalize(f32::EPSILON).unwrap_or(n);
                [n.x, n.y, n.z]
            })
            .collect()
        });

        let uvs: Option<Vec<f32>> = reader
            .read_tex_coords(0)
            .map(|t| t.into_f32().flatten().collect());
        let colors: Option<Vec<f32>> = reader
            .read_colors(0)
            .map(|c| c.into_rgb_f32().flatten().collect());
        let indices: Option<Vec<u32>> = reader.read_indices().map(|i| i.into_u32().collect());

        let geometry = RawGeometry {
            positions,
            indices,
            normals: normals.filter(|n| n.len() == vertex_count * 3),
            uvs: uvs.filter(|t| t.len() == vertex_count * 2),
            colors: colors.filter(|c| c.len() == vertex_count * 3),
            bounding_box: None,
            bounding_sphere: None,
        };

        let mut material = convert_material(&selected.primitive.material());
        material.vertex_colors = geometry.colors.is_some();

        tracing::debug!(
            vertices = geometry.vertex_count(),
            faces = geometry.face_count(),
            "decoded glTF primitive"
        );

        Ok(DecodedMesh::new(geometry, vec![material]))
    }
}

fn resolve_buffers(
    document: &gltf::Document,
    mut blob: Option<Vec<u8>>,
    external: Vec<(usize, Vec<u8>)>,
) -> Result<Vec<Vec<u8>>> {
    let mut external: Vec<Option<Vec<u8>>> = {
        let mut slots = vec![None; document.buffers().len()];
        for (index, data) in external {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(data);
            }
        }
        slots
    };

    document
        .buffers()
        .map(|buffer| {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => blob
                    .take()
                    .ok_or_else(|| Error::Gltf("GLB binary chunk is missing".to_string()))?,
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
                gltf::buffer::Source::Uri(uri) => external
                    .get_mut(buffer.index())
                    .and_then(Option::take)
                    .ok_or_else(|| Error::Gltf(format!("buffer '{}' was not provided", uri)))?,
            };
            if data.len() < buffer.length() {
                return Err(Error::Truncated {
                    expected: buffer.length(),
                    got: data.len(),
                });
            }
            Ok(data)
        })
        .collect()
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| Error::Gltf("malformed data URI".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(Error::Gltf("only base64 data URIs are supported".to_string()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::Gltf(format!("data URI: {}", e)))
}

/// Depth-first walk of the scene graph.
///
/// Roots are the default scene, else the first scene, else every node no
/// other node references. Returns the first triangle-list primitive with
/// its world matrix and the total number of triangle-list primitives.
fn select_primitive(document: &gltf::Document) -> (Option<Selected<'_>>, usize) {
    let roots: Vec<gltf::Node<'_>> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => {
            let children: FxHashSet<usize> = document
                .nodes()
                .flat_map(|n| n.children().map(|c| c.index()).collect::<Vec<_>>())
                .collect();
            document
                .nodes()
                .filter(|n| !children.contains(&n.index()))
                .collect()
        }
    };

    let mut stack: Vec<(gltf::Node<'_>, Matrix4<f32>)> = roots
        .into_iter()
        .rev()
        .map(|node| (node, Matrix4::identity()))
        .collect();
    let mut visited = FxHashSet::default();
    let mut selected = None;
    let mut drawable = 0usize;

    while let Some((node, parent)) = stack.pop() {
        if !visited.insert(node.index()) {
            continue;
        }
        let world = parent * Matrix4::from(node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    continue;
                }
                drawable += 1;
                if selected.is_none() {
                    selected = Some(Selected { primitive, world });
                }
            }
        }

        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (child, world)));
    }

    (selected, drawable)
}

fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = world.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|m| m.transpose())
        .unwrap_or_else(Matrix3::identity)
}

fn convert_material(material: &gltf::Material<'_>) -> MaterialDescriptor {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let mut descriptor =
        MaterialDescriptor::physical([r, g, b], pbr.roughness_factor(), pbr.metallic_factor());
    descriptor.opacity = match material.alpha_mode() {
        gltf::material::AlphaMode::Blend => a,
        _ => 1.0,
    };
    descriptor.double_sided = material.double_sided();
    descriptor.name = material.name().map(str::to_string);
    descriptor
}
