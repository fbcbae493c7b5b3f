// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Format parsers
//!
//! Each parser fetches what it needs through the [`Fetcher`] it is handed,
//! decodes on the blocking pool and returns a sanitized [`ParsedModel`].
//! The [`ParserRegistry`] maps format tags to parsers.

mod gltf;
mod obj;
mod placeholder;
mod ply;
mod stl;

pub use self::gltf::GltfParser;
pub use self::obj::ObjParser;
pub use self::placeholder::PlaceholderParser;
pub use self::ply::PlyParser;
pub use self::stl::StlParser;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use meshport_core::{DecodedMesh, FormatTag};
use meshport_geometry::GeometrySanitizer;

use crate::error::ParseError;
use crate::fetch::Fetcher;
use crate::model::ParsedModel;

/// Everything one parse attempt needs
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub location: &'a str,
    pub name: &'a str,
    pub format: FormatTag,
    pub fetcher: &'a dyn Fetcher,
    pub sanitizer: GeometrySanitizer,
}

/// Format parser trait
/// Each parser handles one or more format tags
pub trait FormatParser: Send + Sync {
    /// Fetch, decode and sanitize one model
    fn parse<'a>(&'a self, ctx: ParseContext<'a>) -> BoxFuture<'a, Result<ParsedModel, ParseError>>;

    /// Format tags this parser handles
    fn supported_formats(&self) -> Vec<FormatTag>;
}

/// Routes format tags to parsers
pub struct ParserRegistry {
    parsers: HashMap<FormatTag, Arc<dyn FormatParser>>,
}

impl ParserRegistry {
    /// Registry with a parser for every [`FormatTag`]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(StlParser));
        registry.register(Box::new(ObjParser));
        registry.register(Box::new(GltfParser));
        registry.register(Box::new(PlyParser));
        registry.register(Box::new(PlaceholderParser));
        registry
    }

    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser for all its formats, replacing earlier ones
    pub fn register(&mut self, parser: Box<dyn FormatParser>) {
        let parser: Arc<dyn FormatParser> = Arc::from(parser);
        for format in parser.supported_formats() {
            self.parsers.insert(format, Arc::clone(&parser));
        }
    }

    pub fn get(&self, format: FormatTag) -> Option<Arc<dyn FormatParser>> {
        self.parsers.get(&format).cloned()
    }

    pub fn supports(&self, format: FormatTag) -> bool {
        self.parsers.contains_key(&format)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode, validate and sanitize on the blocking pool
pub(crate) async fn decode_blocking<F>(
    bytes: Vec<u8>,
    sanitizer: GeometrySanitizer,
    decode: F,
) -> Result<ParsedModel, ParseError>
where
    F: FnOnce(&[u8]) -> meshport_core::Result<DecodedMesh> + Send + 'static,
{
    let byte_len = bytes.len();
    tokio::task::spawn_blocking(move || {
        let decoded = decode(&bytes)?;
        Ok(ParsedModel::from_decoded(decoded, &sanitizer, Some(byte_len))?)
    })
    .await?
}
