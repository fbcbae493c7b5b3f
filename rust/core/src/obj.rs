// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ decoder with optional MTL companion

use std::io::BufReader;

use memchr::memmem;

use crate::error::{Error, Result};
use crate::geometry::{DecodedMesh, RawGeometry};
use crate::material::{MaterialDescriptor, DEFAULT_COLOR, DEFAULT_SHININESS, DEFAULT_SPECULAR};

/// True when the OBJ text declares a material library
pub fn references_mtl(bytes: &[u8]) -> bool {
    memmem::find(bytes, b"mtllib").is_some()
}

/// Decode OBJ bytes.
///
/// `companion_mtl` is the already-fetched material library, if any. A
/// missing or unparsable library is not fatal: the mesh decodes with no
/// materials and a default is substituted downstream.
///
/// Faces are triangulated and attributes re-indexed onto a single index
/// buffer. Only the first object in the file is kept.
pub fn decode_obj(bytes: &[u8], companion_mtl: Option<&[u8]>) -> Result<DecodedMesh> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let mut reader = BufReader::new(bytes);
    let (models, materials) = tobj::load_obj_buf(&mut reader, &options, |_path| {
        match companion_mtl {
            Some(mtl) => {
                let mut mtl_reader = BufReader::new(mtl);
                tobj::load_mtl_buf(&mut mtl_reader)
            }
            None => Err(tobj::LoadError::OpenFileFailed),
        }
    })
    .map_err(|e| Error::Obj(e.to_string()))?;

    let materials = materials.unwrap_or_else(|e| {
        if references_mtl(bytes) {
            tracing::warn!(error = %e, "material library unavailable, using defaults");
        }
        Vec::new()
    });

    if models.len() > 1 {
        tracing::debug!(models = models.len(), "OBJ has several objects, keeping the first");
    }

    let model = models.into_iter().next().ok_or(Error::EmptyScene)?;
    let mesh = model.mesh;
    if mesh.positions.is_empty() {
        return Err(Error::EmptyScene);
    }

    let vertex_len = mesh.positions.len();
    let uv_len = vertex_len / 3 * 2;
    let geometry = RawGeometry {
        indices: (!mesh.indices.is_empty()).then_some(mesh.indices),
        normals: (mesh.normals.len() == vertex_len).then_some(mesh.normals),
        uvs: (mesh.texcoords.len() == uv_len && uv_len > 0).then_some(mesh.texcoords),
        colors: (mesh.vertex_color.len() == vertex_len).then_some(mesh.vertex_color),
        positions: mesh.positions,
        bounding_box: None,
        bounding_sphere: None,
    };
    let has_colors = geometry.colors.is_some();

    // Prefer the material the object binds. Otherwise keep the whole library.
    let selected: Vec<&tobj::Material> = match mesh.material_id.and_then(|id| materials.get(id)) {
        Some(bound) => vec![bound],
        None => materials.iter().collect(),
    };

    let mut descriptors: Vec<MaterialDescriptor> = selected
        .into_iter()
        .map(|material| {
            let mut descriptor = convert_material(material);
            descriptor.vertex_colors = has_colors;
            descriptor
        })
        .collect();
    if descriptors.is_empty() && has_colors {
        descriptors.push(MaterialDescriptor::vertex_colored());
    }

    tracing::debug!(
        name = %model.name,
        vertices = geometry.vertex_count(),
        faces = geometry.face_count(),
        "decoded OBJ"
    );

    Ok(DecodedMesh::new(geometry, descriptors))
}

fn convert_material(material: &tobj::Material) -> MaterialDescriptor {
    let mut descriptor = MaterialDescriptor::phong(
        material.diffuse.unwrap_or(DEFAULT_COLOR),
        material.shininess.unwrap_or(DEFAULT_SHININESS),
        material.specular.unwrap_or(DEFAULT_SPECULAR),
    );
    descriptor.opacity = material.dissolve.unwrap_or(1.0);
    if !material.name.is_empty() {
        descriptor.name = Some(material.name.clone());
    }
    descriptor
}
