// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF 2.0 parser, JSON and binary containers
//!
//! External buffers are resolved relative to the asset location and
//! fetched through the same fetcher. Embedded and data-URI buffers need no
//! fetch.

use futures::future::BoxFuture;
use futures::FutureExt;
use meshport_core::{FormatTag, GltfAsset};

use super::{FormatParser, ParseContext};
use crate::error::ParseError;
use crate::fetch::resolve_relative;
use crate::model::ParsedModel;

pub struct GltfParser;

impl GltfParser {
    async fn run(ctx: ParseContext<'_>) -> Result<ParsedModel, ParseError> {
        let bytes = ctx.fetcher.fetch(ctx.location).await?;
        let mut byte_len = bytes.len();

        let asset = tokio::task::spawn_blocking(move || GltfAsset::from_slice(&bytes)).await??;

        let mut external = Vec::new();
        for (index, uri) in asset.external_buffers() {
            let location = resolve_relative(ctx.location, &uri);
            tracing::debug!(buffer = index, location = %location, "fetching external glTF buffer");
            let data = ctx.fetcher.fetch(&location).await?;
            byte_len += data.len();
            external.push((index, data));
        }

        tracing::debug!(
            name = ctx.name,
            format = %ctx.format,
            bytes = byte_len,
            external_buffers = external.len(),
            "decoding glTF"
        );

        let sanitizer = ctx.sanitizer;
        tokio::task::spawn_blocking(move || {
            let decoded = asset.decode(external)?;
            Ok(ParsedModel::from_decoded(decoded, &sanitizer, Some(byte_len))?)
        })
        .await?
    }
}

impl FormatParser for GltfParser {
    fn parse<'a>(&'a self, ctx: ParseContext<'a>) -> BoxFuture<'a, Result<ParsedModel, ParseError>> {
        Self::run(ctx).boxed()
    }

    fn supported_formats(&self) -> Vec<FormatTag> {
        vec![FormatTag::Gltf, FormatTag::Glb]
    }
}
