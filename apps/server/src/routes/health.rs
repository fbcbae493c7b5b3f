// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check and discovery endpoints.

use axum::Json;
use meshport_processing::FormatTag;
use serde::Serialize;

use crate::types::FormatInfo;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "meshport-server",
    })
}

/// GET /api/v1/formats - Supported formats.
pub async fn formats() -> Json<Vec<FormatInfo>> {
    Json(FormatTag::ALL.into_iter().map(FormatInfo::from).collect())
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "meshport-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "CAD and mesh loading with normalization and viewport framing",
        endpoints: vec![
            EndpointInfo {
                method: "GET",
                path: "/api/v1/health",
                description: "Health check endpoint",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/formats",
                description: "Supported file formats",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/load",
                description: "Load a model from a URL",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/load/stream",
                description: "Load a model from a URL with progress (Server-Sent Events)",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/load/upload",
                description: "Load an uploaded model file (multipart)",
            },
        ],
    })
}
