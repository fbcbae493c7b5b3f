// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render-agnostic material description

/// Neutral grey used when a file declares no usable material
pub const DEFAULT_COLOR: [f32; 3] = [0.6, 0.6, 0.6];
pub const DEFAULT_ROUGHNESS: f32 = 0.5;
pub const DEFAULT_METALNESS: f32 = 0.1;
pub const DEFAULT_SHININESS: f32 = 30.0;
pub const DEFAULT_SPECULAR: [f32; 3] = [0.2, 0.2, 0.2];
/// Overlay colour and opacity for wireframe display
pub const WIREFRAME_COLOR: [f32; 3] = [0.27, 0.53, 1.0];
pub const WIREFRAME_OPACITY: f32 = 0.3;

/// Shading model parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Metallic-roughness PBR
    Physical { roughness: f32, metalness: f32 },
    /// Blinn-Phong
    Phong { shininess: f32, specular: [f32; 3] },
}

impl Shading {
    pub fn default_physical() -> Self {
        Shading::Physical {
            roughness: DEFAULT_ROUGHNESS,
            metalness: DEFAULT_METALNESS,
        }
    }

    pub fn default_phong() -> Self {
        Shading::Phong {
            shininess: DEFAULT_SHININESS,
            specular: DEFAULT_SPECULAR,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            Shading::Physical {
                roughness,
                metalness,
            } => roughness.is_finite() && metalness.is_finite(),
            Shading::Phong {
                shininess,
                specular,
            } => shininess.is_finite() && specular.iter().all(|v| v.is_finite()),
        }
    }
}

/// Material as declared by a file, or produced by the material sanitizer
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    pub name: Option<String>,
    /// Linear RGB in `[0, 1]`
    pub color: [f32; 3],
    pub shading: Shading,
    pub opacity: f32,
    pub double_sided: bool,
    pub wireframe: bool,
    pub vertex_colors: bool,
}

impl MaterialDescriptor {
    /// Physically-based material with the given base colour
    pub fn physical(color: [f32; 3], roughness: f32, metalness: f32) -> Self {
        Self {
            name: None,
            color,
            shading: Shading::Physical {
                roughness,
                metalness,
            },
            opacity: 1.0,
            double_sided: false,
            wireframe: false,
            vertex_colors: false,
        }
    }

    /// Phong material with the given diffuse colour
    pub fn phong(color: [f32; 3], shininess: f32, specular: [f32; 3]) -> Self {
        Self {
            name: None,
            color,
            shading: Shading::Phong {
                shininess,
                specular,
            },
            opacity: 1.0,
            double_sided: false,
            wireframe: false,
            vertex_colors: false,
        }
    }

    /// Double-sided neutral grey
    pub fn default_grey() -> Self {
        Self {
            double_sided: true,
            ..Self::phong(DEFAULT_COLOR, DEFAULT_SHININESS, DEFAULT_SPECULAR)
        }
    }

    /// Default grey that defers colour to per-vertex colours
    pub fn vertex_colored() -> Self {
        Self {
            vertex_colors: true,
            ..Self::default_grey()
        }
    }

    /// Translucent overlay used when wireframe display is requested
    pub fn wireframe_overlay() -> Self {
        Self {
            name: Some("wireframe".to_string()),
            color: WIREFRAME_COLOR,
            shading: Shading::Phong {
                shininess: 0.0,
                specular: [0.0; 3],
            },
            opacity: WIREFRAME_OPACITY,
            double_sided: true,
            wireframe: true,
            vertex_colors: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self::default_grey()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grey() {
        let material = MaterialDescriptor::default();
        assert_eq!(material.color, DEFAULT_COLOR);
        assert!(material.double_sided);
        assert!(!material.wireframe);
        assert!(!material.is_transparent());
        assert!(matches!(material.shading, Shading::Phong { .. }));
    }

    #[test]
    fn test_wireframe_overlay() {
        let overlay = MaterialDescriptor::wireframe_overlay();
        assert!(overlay.wireframe);
        assert!(overlay.is_transparent());
        assert!(overlay.double_sided);
    }

    #[test]
    fn test_shading_finite() {
        assert!(Shading::default_physical().is_finite());
        let bad = Shading::Physical {
            roughness: f32::NAN,
            metalness: 0.0,
        };
        assert!(!bad.is_finite());
    }
}
