// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Material sanitizer

use crate::error::{Error, Result};
use meshport_core::{MaterialDescriptor, Shading};

/// Produces render-safe material lists. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialSanitizer;

impl MaterialSanitizer {
    /// Sanitize decoder materials for display.
    ///
    /// Wireframe mode replaces everything with one translucent overlay.
    /// Otherwise each descriptor is rebuilt field by field and forced
    /// double-sided. An invalid descriptor becomes the default grey, and
    /// an empty list becomes a single default grey.
    pub fn sanitize(&self, materials: &[MaterialDescriptor], wireframe: bool) -> Vec<MaterialDescriptor> {
        if wireframe {
            return vec![MaterialDescriptor::wireframe_overlay()];
        }

        if materials.is_empty() {
            return vec![MaterialDescriptor::default_grey()];
        }

        materials
            .iter()
            .map(|material| {
                rebuild(material).unwrap_or_else(|e| {
                    tracing::warn!(
                        material = material.name.as_deref().unwrap_or("<unnamed>"),
                        error = %e,
                        "substituting default material"
                    );
                    MaterialDescriptor::default_grey()
                })
            })
            .collect()
    }
}

fn rebuild(material: &MaterialDescriptor) -> Result<MaterialDescriptor> {
    if !material.color.iter().all(|c| c.is_finite()) {
        return Err(Error::InvalidMaterial("non-finite color".into()));
    }
    if !material.shading.is_finite() {
        return Err(Error::InvalidMaterial("non-finite shading parameters".into()));
    }
    if !material.opacity.is_finite() {
        return Err(Error::InvalidMaterial("non-finite opacity".into()));
    }

    let shading = match material.shading {
        Shading::Physical {
            roughness,
            metalness,
        } => Shading::Physical {
            roughness: roughness.clamp(0.0, 1.0),
            metalness: metalness.clamp(0.0, 1.0),
        },
        Shading::Phong {
            shininess,
            specular,
        } => Shading::Phong {
            shininess: shininess.max(0.0),
            specular: specular.map(unit),
        },
    };

    Ok(MaterialDescriptor {
        name: material.name.clone(),
        color: material.color.map(unit),
        shading,
        opacity: unit(material.opacity),
        double_sided: true,
        wireframe: false,
        vertex_colors: material.vertex_colors,
    })
}

#[inline]
fn unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}
