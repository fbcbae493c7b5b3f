// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use futures::future::BoxFuture;
use futures::FutureExt;
use meshport_core::{decode_ply, FormatTag};

use super::{decode_blocking, FormatParser, ParseContext};
use crate::error::ParseError;
use crate::model::ParsedModel;

/// PLY parser: meshes and point clouds, ASCII or binary
pub struct PlyParser;

impl PlyParser {
    async fn run(ctx: ParseContext<'_>) -> Result<ParsedModel, ParseError> {
        let bytes = ctx.fetcher.fetch(ctx.location).await?;
        tracing::debug!(name = ctx.name, bytes = bytes.len(), "decoding PLY");
        decode_blocking(bytes, ctx.sanitizer, decode_ply).await
    }
}

impl FormatParser for PlyParser {
    fn parse<'a>(&'a self, ctx: ParseContext<'a>) -> BoxFuture<'a, Result<ParsedModel, ParseError>> {
        Self::run(ctx).boxed()
    }

    fn supported_formats(&self) -> Vec<FormatTag> {
        vec![FormatTag::Ply]
    }
}
