// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use base64::{engine::general_purpose::STANDARD, Engine};
use meshport_processing::{
    AnalysisResult, FormatTag, Framing, LoadedModel, MaterialDescriptor, ModelMetadata, RawGeometry, Shading,
};
use serde::Serialize;

use crate::error::ErrorResponse;

/// Full load response.
#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub metadata: ModelMetadataData,
    /// Never empty.
    pub materials: Vec<MaterialData>,
    pub analysis: AnalysisData,
    pub framing: FramingData,
    /// Present when the request asked for geometry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryData>,
}

impl LoadResponse {
    pub fn from_model(model: &LoadedModel, include_geometry: bool) -> Self {
        Self {
            metadata: model.metadata().into(),
            materials: model.materials().iter().map(MaterialData::from).collect(),
            analysis: model.analysis().into(),
            framing: model.framing().into(),
            geometry: include_geometry.then(|| model.geometry().into()),
        }
    }
}

/// Model metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadataData {
    /// Format tag ("STL", "GLB", ...).
    pub format: &'static str,
    pub name: String,
    pub vertex_count: usize,
    pub face_count: usize,
    pub bounding_box_min: [f32; 3],
    pub bounding_box_max: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx_file_size_bytes: Option<u64>,
    /// Placeholder geometry rather than the real part.
    pub approximate: bool,
    pub load_time_ms: u64,
    pub attempts: u32,
}

impl From<&ModelMetadata> for ModelMetadataData {
    fn from(metadata: &ModelMetadata) -> Self {
        Self {
            format: metadata.format.as_str(),
            name: metadata.name.clone(),
            vertex_count: metadata.vertex_count,
            face_count: metadata.face_count,
            bounding_box_min: metadata.bounding_box_min,
            bounding_box_max: metadata.bounding_box_max,
            approx_file_size_bytes: metadata.approx_file_size_bytes,
            approximate: metadata.approximate,
            load_time_ms: metadata.load_time_ms,
            attempts: metadata.attempts,
        }
    }
}

/// Render-ready material.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// "physical" or "phong".
    pub shading: &'static str,
    pub color: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metalness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shininess: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular: Option<[f32; 3]>,
    pub opacity: f32,
    pub transparent: bool,
    pub double_sided: bool,
    pub wireframe: bool,
    pub vertex_colors: bool,
}

impl From<&MaterialDescriptor> for MaterialData {
    fn from(material: &MaterialDescriptor) -> Self {
        let (shading, roughness, metalness, shininess, specular) = match material.shading {
            Shading::Physical { roughness, metalness } => ("physical", Some(roughness), Some(metalness), None, None),
            Shading::Phong { shininess, specular } => ("phong", None, None, Some(shininess), Some(specular)),
        };
        Self {
            name: material.name.clone(),
            shading,
            color: material.color,
            roughness,
            metalness,
            shininess,
            specular,
            opacity: material.opacity,
            transparent: material.is_transparent(),
            double_sided: material.double_sided,
            wireframe: material.wireframe,
            vertex_colors: material.vertex_colors,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueData {
    pub kind: &'static str,
    pub severity: &'static str,
    pub count: u64,
    pub description: String,
}

/// Geometry metrics and heuristic issues.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisData {
    pub vertex_count: usize,
    pub face_count: usize,
    pub approx_volume: f64,
    pub approx_surface_area: f64,
    pub center: [f32; 3],
    pub extents: [f32; 3],
    pub max_extent: f32,
    pub issues: Vec<IssueData>,
}

impl From<&AnalysisResult> for AnalysisData {
    fn from(analysis: &AnalysisResult) -> Self {
        Self {
            vertex_count: analysis.vertex_count,
            face_count: analysis.face_count,
            approx_volume: analysis.approx_volume,
            approx_surface_area: analysis.approx_surface_area,
            center: analysis.center.coords.into(),
            extents: analysis.extents.into(),
            max_extent: analysis.max_extent(),
            issues: analysis
                .issues
                .iter()
                .map(|issue| IssueData {
                    kind: issue.kind.as_str(),
                    severity: issue.severity.as_str(),
                    count: issue.count,
                    description: issue.description.clone(),
                })
                .collect(),
        }
    }
}

/// Camera placement for the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct FramingData {
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    pub near_plane: f32,
    pub far_plane: f32,
    pub min_orbit_distance: f32,
    pub max_orbit_distance: f32,
}

impl From<Framing> for FramingData {
    fn from(framing: Framing) -> Self {
        Self {
            camera_position: framing.camera_position.coords.into(),
            camera_target: framing.camera_target.coords.into(),
            near_plane: framing.near_plane,
            far_plane: framing.far_plane,
            min_orbit_distance: framing.min_orbit_distance,
            max_orbit_distance: framing.max_orbit_distance,
        }
    }
}

/// Geometry buffers, base64 of little-endian `f32` (`u32` for indices).
#[derive(Debug, Clone, Serialize)]
pub struct GeometryData {
    pub positions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uvs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<String>,
}

impl From<&RawGeometry> for GeometryData {
    fn from(geometry: &RawGeometry) -> Self {
        Self {
            positions: encode_f32(&geometry.positions),
            normals: geometry.normals.as_deref().map(encode_f32),
            indices: geometry.indices.as_deref().map(encode_u32),
            uvs: geometry.uvs.as_deref().map(encode_f32),
            colors: geometry.colors.as_deref().map(encode_f32),
        }
    }
}

fn encode_f32(values: &[f32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

fn encode_u32(values: &[u32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

/// One entry of `GET /api/v1/formats`.
#[derive(Debug, Clone, Serialize)]
pub struct FormatInfo {
    pub format: &'static str,
    pub extension: &'static str,
    /// Loaded as placeholder geometry.
    pub approximate: bool,
}

impl From<FormatTag> for FormatInfo {
    fn from(format: FormatTag) -> Self {
        Self {
            format: format.as_str(),
            extension: format.extension(),
            approximate: format.is_exchange(),
        }
    }
}

/// Server-Sent Event types for streaming loads.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Progress update.
    Progress {
        /// 0 to 100, restarts at 0 on a retry.
        percent: u8,
        stage: String,
        attempt: u32,
    },

    /// Load complete.
    Complete {
        result: Box<LoadResponse>,
    },

    /// Load failed.
    Error {
        #[serde(flatten)]
        error: ErrorResponse,
    },
}
