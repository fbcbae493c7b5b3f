// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concurrency-limited loads.

use std::sync::Arc;

use meshport_processing::{LoadRequest, ModelLoader, NoProgress};
use tokio::sync::Semaphore;

use crate::error::ApiError;
use crate::types::LoadResponse;

/// Run one load once a slot is free.
pub async fn run_load(
    loader: &ModelLoader,
    limiter: &Arc<Semaphore>,
    request: &LoadRequest,
    include_geometry: bool,
) -> Result<LoadResponse, ApiError> {
    let _permit = limiter
        .acquire()
        .await
        .map_err(|e| ApiError::Internal(format!("load limiter closed: {}", e)))?;

    let model = loader.load(request, &NoProgress).await?;
    Ok(LoadResponse::from_model(&model, include_geometry))
}
