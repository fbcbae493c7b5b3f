// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming loads with Server-Sent Events.
//!
//! The load runs on its own task and reports into a bounded channel. The
//! stream forwards every update that made it through the channel, then a
//! single `complete` or `error` event.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use meshport_processing::{ChannelProgress, LoadRequest, ModelLoader};
use tokio::sync::Semaphore;

use crate::error::ErrorResponse;
use crate::types::{LoadResponse, StreamEvent};

/// Updates buffered between the load task and the client
const PROGRESS_BUFFER: usize = 64;

pub fn load_streaming(
    loader: ModelLoader,
    limiter: Arc<Semaphore>,
    request: LoadRequest,
    include_geometry: bool,
) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
    Box::pin(stream! {
        let permit = match limiter.acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                yield StreamEvent::Error {
                    error: internal_error(format!("load limiter closed: {}", e)),
                };
                return;
            }
        };

        let (sink, mut updates) = ChannelProgress::channel(PROGRESS_BUFFER);
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let result = loader.load(&request, &sink).await;
            result.map(|model| LoadResponse::from_model(&model, include_geometry))
        });

        // Ends once the task drops its sink
        while let Some(progress) = updates.recv().await {
            yield StreamEvent::Progress {
                percent: progress.percent,
                stage: progress.stage,
                attempt: progress.attempt,
            };
        }

        match handle.await {
            Ok(Ok(response)) => {
                yield StreamEvent::Complete {
                    result: Box::new(response),
                };
            }
            Ok(Err(e)) => {
                yield StreamEvent::Error {
                    error: ErrorResponse::from(&e),
                };
            }
            Err(e) => {
                tracing::error!(error = %e, "load task failed");
                yield StreamEvent::Error {
                    error: internal_error(format!("load task failed: {}", e)),
                };
            }
        }
    })
}

fn internal_error(detail: String) -> ErrorResponse {
    ErrorResponse {
        error: "An unexpected error occurred while loading the 3D model.".to_string(),
        code: "UNKNOWN".to_string(),
        detail: Some(detail),
    }
}
