// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Meshport Processing
//!
//! Turns a location plus a declared file name into a [`LoadedModel`]:
//! format detection, fetching, format parsing, sanitization and analysis,
//! with retries and progress reporting.
//!
//! ```rust,ignore
//! use meshport_processing::{LoadConfig, LoadRequest, ModelLoader, NoProgress};
//!
//! let loader = ModelLoader::with_default_fetcher(LoadConfig::from_env())?;
//! let model = loader
//!     .load(&LoadRequest::new("https://cdn.example.com/bracket.stl", "bracket.stl"), &NoProgress)
//!     .await?;
//! println!("{} faces", model.metadata().face_count);
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod model;
pub mod parsers;
pub mod progress;

pub use config::LoadConfig;
pub use error::{FetchError, LoadError, ParseError};
pub use fetch::{DefaultFetcher, Fetcher, FileFetcher, HttpFetcher, MemoryFetcher};
pub use loader::{LoadState, ModelLoader};
pub use model::{LoadRequest, LoadedModel, ModelMetadata, ParsedModel};
pub use parsers::{FormatParser, ParseContext, ParserRegistry};
pub use progress::{ChannelProgress, ClosureProgress, LoadProgress, NoProgress, ProgressSink, RecordingProgress};

pub use meshport_core::{FormatTag, MaterialDescriptor, RawGeometry, Shading};
pub use meshport_geometry::{AnalysisResult, Framing, GeometryIssue, IssueKind, Severity};
