// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load orchestration
//!
//! One load runs detection, then up to `max_attempts` parse attempts with
//! exponential backoff between them, then material sanitization and
//! analysis. Progress is reported at fixed milestones. Every failure is
//! classified into a [`LoadError`] before it reaches the caller.
//!
//! Loads share nothing mutable: one [`ModelLoader`] can drive any number of
//! concurrent loads.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use meshport_core::{detect_format, FormatTag};
use meshport_geometry::{analyze, GeometrySanitizer, MaterialSanitizer};

use crate::config::LoadConfig;
use crate::error::{FetchError, LoadError};
use crate::fetch::{DefaultFetcher, Fetcher};
use crate::model::{LoadRequest, LoadedModel, ModelMetadata, ParsedModel};
use crate::parsers::{ParseContext, ParserRegistry};
use crate::progress::{LoadProgress, ProgressSink};

const PROGRESS_DETECTED: u8 = 10;
const PROGRESS_PARSING: u8 = 30;
const PROGRESS_MATERIALS: u8 = 80;
const PROGRESS_ANALYZING: u8 = 90;
const PROGRESS_DONE: u8 = 100;

/// Lifecycle of one load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Detecting,
    Parsing { attempt: u32 },
    Sanitizing,
    Analyzing,
    Done,
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Idle => f.write_str("idle"),
            LoadState::Detecting => f.write_str("detecting"),
            LoadState::Parsing { attempt } => write!(f, "parsing (attempt {})", attempt),
            LoadState::Sanitizing => f.write_str("sanitizing"),
            LoadState::Analyzing => f.write_str("analyzing"),
            LoadState::Done => f.write_str("done"),
            LoadState::Failed => f.write_str("failed"),
        }
    }
}

/// Per-load bookkeeping. Lives on the stack of [`ModelLoader::load`].
struct LoadSession<'a> {
    name: &'a str,
    state: LoadState,
    started: Instant,
    attempts: u32,
    progress: &'a dyn ProgressSink,
}

impl<'a> LoadSession<'a> {
    fn new(name: &'a str, progress: &'a dyn ProgressSink) -> Self {
        Self {
            name,
            state: LoadState::Idle,
            started: Instant::now(),
            attempts: 0,
            progress,
        }
    }

    fn transition(&mut self, next: LoadState) {
        tracing::debug!(name = self.name, from = %self.state, to = %next, "load state");
        self.state = next;
    }

    fn report(&self, percent: u8, stage: impl Into<String>) {
        self.progress
            .report(LoadProgress::new(percent, stage, self.attempts.max(1)));
    }

    fn fail(&mut self, error: LoadError) -> LoadError {
        self.transition(LoadState::Failed);
        tracing::warn!(
            name = self.name,
            code = error.code(),
            attempts = self.attempts,
            error = %error,
            "load failed"
        );
        error
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Loads models from locations into canonical [`LoadedModel`]s
#[derive(Clone)]
pub struct ModelLoader {
    registry: Arc<ParserRegistry>,
    fetcher: Arc<dyn Fetcher>,
    config: LoadConfig,
}

impl ModelLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: LoadConfig) -> Self {
        Self {
            registry: Arc::new(ParserRegistry::new()),
            fetcher,
            config,
        }
    }

    /// Loader over HTTP(S) and local files
    pub fn with_default_fetcher(config: LoadConfig) -> Result<Self, FetchError> {
        let fetcher = DefaultFetcher::new(config.fetch_timeout)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Same registry and config, different byte source
    pub fn with_fetcher(&self, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            fetcher,
            config: self.config.clone(),
        }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Run one load to completion
    pub async fn load(
        &self,
        request: &LoadRequest,
        progress: &dyn ProgressSink,
    ) -> Result<LoadedModel, LoadError> {
        let mut session = LoadSession::new(&request.name, progress);

        session.transition(LoadState::Detecting);
        let format = match detect_format(&request.name, request.mime_hint.as_deref()) {
            Ok(format) => format,
            Err(e) => return Err(session.fail(LoadError::from(e))),
        };
        session.report(PROGRESS_DETECTED, format!("Detected {} format", format));
        tracing::info!(name = %request.name, format = %format, "loading model");

        let parsed = match self.parse_with_retry(request, format, &mut session).await {
            Ok(parsed) => parsed,
            Err(e) => return Err(session.fail(e)),
        };

        session.transition(LoadState::Sanitizing);
        session.report(PROGRESS_MATERIALS, "Preparing materials");
        let materials = MaterialSanitizer.sanitize(parsed.materials(), request.wireframe);
        let byte_len = parsed.byte_len();
        let approximate = parsed.is_approximate();
        let geometry = parsed.into_geometry();

        session.transition(LoadState::Analyzing);
        session.report(PROGRESS_ANALYZING, "Analyzing geometry");
        let analysis = analyze(&geometry);

        let bounds = geometry.bounding_box.unwrap_or(analysis.bounding_box);
        let metadata = ModelMetadata {
            format,
            name: request.name.clone(),
            vertex_count: analysis.vertex_count,
            face_count: analysis.face_count,
            bounding_box_min: bounds.min.coords.into(),
            bounding_box_max: bounds.max.coords.into(),
            approx_file_size_bytes: byte_len.map(|len| len as u64),
            approximate,
            load_time_ms: session.elapsed_ms(),
            attempts: session.attempts,
        };

        session.transition(LoadState::Done);
        session.report(PROGRESS_DONE, "Complete");
        tracing::info!(
            name = %request.name,
            format = %format,
            vertices = metadata.vertex_count,
            faces = metadata.face_count,
            attempts = metadata.attempts,
            load_time_ms = metadata.load_time_ms,
            "model loaded"
        );

        Ok(LoadedModel::new(geometry, materials, metadata, analysis))
    }

    async fn parse_with_retry(
        &self,
        request: &LoadRequest,
        format: FormatTag,
        session: &mut LoadSession<'_>,
    ) -> Result<ParsedModel, LoadError> {
        let parser = self.registry.get(format).ok_or_else(|| LoadError::UnsupportedFormat {
            extension: format.extension().to_string(),
        })?;

        let max_attempts = self.config.max_attempts();
        let ctx = ParseContext {
            location: &request.location,
            name: &request.name,
            format,
            fetcher: self.fetcher.as_ref(),
            sanitizer: GeometrySanitizer::new(self.config.sanitize),
        };

        loop {
            session.attempts += 1;
            let attempt = session.attempts;
            session.transition(LoadState::Parsing { attempt });
            if attempt > 1 {
                session.report(0, format!("Retrying (attempt {} of {})", attempt, max_attempts));
            }
            session.report(PROGRESS_PARSING, format!("Parsing {} file", format));

            let raw = match parser.parse(ctx).await {
                Ok(parsed) => return Ok(parsed),
                Err(raw) => raw,
            };

            let error = LoadError::classify(&raw, format);
            if !error.is_retryable() || attempt >= max_attempts {
                return Err(error);
            }

            let backoff = self.config.backoff_for(attempt);
            tracing::warn!(
                name = %request.name,
                attempt,
                max_attempts,
                backoff_ms = backoff.as_millis() as u64,
                error = %raw,
                "parse attempt failed, retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }
}
