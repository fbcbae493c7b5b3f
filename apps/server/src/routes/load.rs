// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::StreamExt;
use meshport_processing::{LoadRequest, MemoryFetcher};

use crate::error::ApiError;
use crate::services::{decode_upload, load_streaming, run_load, upload_location};
use crate::types::{LoadBody, LoadResponse, StreamEvent};
use crate::AppState;

/// Fields of a multipart upload.
struct Upload {
    data: Vec<u8>,
    name: Option<String>,
    wireframe: bool,
    include_geometry: bool,
}

/// Extract the file and options from a multipart request.
async fn extract_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    let mut data = None;
    let mut name = None;
    let mut wireframe = false;
    let mut include_geometry = false;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        tracing::debug!(field_name = %field_name, "Processing multipart field");

        match field_name.as_str() {
            "file" => {
                if name.is_none() {
                    name = field.file_name().map(str::to_string);
                }
                let bytes = field.bytes().await?;
                tracing::debug!(size = bytes.len(), "Extracted file from multipart");
                data = Some(bytes.to_vec());
            }
            "name" => name = Some(field.text().await?),
            "wireframe" => wireframe = is_truthy(&field.text().await?),
            "include_geometry" => include_geometry = is_truthy(&field.text().await?),
            _ => {}
        }
    }

    let Some(data) = data else {
        tracing::warn!("No 'file' field found in multipart request");
        return Err(ApiError::MissingFile);
    };

    Ok(Upload {
        data,
        name: name.filter(|n| !n.trim().is_empty()),
        wireframe,
        include_geometry,
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// POST /api/v1/load - Load a model and return the full result.
pub async fn load(
    State(state): State<AppState>,
    Json(body): Json<LoadBody>,
) -> Result<Json<LoadResponse>, ApiError> {
    let request = body.to_request()?;
    tracing::info!(url = %request.location, name = %request.name, "load requested");

    let response = run_load(&state.loader, &state.limiter, &request, body.include_geometry).await?;
    Ok(Json(response))
}

/// POST /api/v1/load/stream - Load with Server-Sent Event progress.
pub async fn load_stream(
    State(state): State<AppState>,
    Json(body): Json<LoadBody>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let request = body.to_request()?;
    tracing::info!(url = %request.location, name = %request.name, "streaming load requested");

    let stream = load_streaming(
        state.loader.as_ref().clone(),
        state.limiter.clone(),
        request,
        body.include_geometry,
    )
    .map(|event: StreamEvent| Ok(to_sse_event(&event)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &StreamEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize stream event");
            Event::default()
                .event("error")
                .data(r#"{"type":"error","error":"serialization failed","code":"UNKNOWN"}"#)
        }
    }
}

/// POST /api/v1/load/upload - Load an uploaded file.
pub async fn load_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LoadResponse>, ApiError> {
    let upload = extract_upload(&mut multipart).await?;
    let name = upload
        .name
        .ok_or_else(|| ApiError::BadRequest("upload needs a file name".into()))?;

    let max_bytes = state.config.max_file_size_bytes();
    let max_mb = state.config.max_file_size_mb;
    let data = tokio::task::spawn_blocking(move || decode_upload(upload.data, max_bytes, max_mb)).await??;

    let location = upload_location(&name);
    tracing::info!(name = %name, size = data.len(), "upload load requested");

    let loader = state
        .loader
        .with_fetcher(Arc::new(MemoryFetcher::new().with_file(location.clone(), data)));
    let request = LoadRequest::new(location, name).with_wireframe(upload.wireframe);

    let response = run_load(&loader, &state.limiter, &request, upload.include_geometry).await?;
    Ok(Json(response))
}
