// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ parser
//!
//! When the OBJ declares a material library, the companion `.mtl` next to
//! it is fetched as well. A missing or unreadable companion is not an
//! error: the model loads with default materials.

use futures::future::BoxFuture;
use futures::FutureExt;
use meshport_core::obj::references_mtl;
use meshport_core::{decode_obj, FormatTag};

use super::{decode_blocking, FormatParser, ParseContext};
use crate::error::ParseError;
use crate::fetch::companion_location;
use crate::model::ParsedModel;

pub struct ObjParser;

impl ObjParser {
    async fn run(ctx: ParseContext<'_>) -> Result<ParsedModel, ParseError> {
        let bytes = ctx.fetcher.fetch(ctx.location).await?;

        let mtl = if references_mtl(&bytes) {
            Self::fetch_companion(&ctx).await
        } else {
            None
        };

        tracing::debug!(
            name = ctx.name,
            bytes = bytes.len(),
            has_mtl = mtl.is_some(),
            "decoding OBJ"
        );
        decode_blocking(bytes, ctx.sanitizer, move |obj| decode_obj(obj, mtl.as_deref())).await
    }

    async fn fetch_companion(ctx: &ParseContext<'_>) -> Option<Vec<u8>> {
        let Some(location) = companion_location(ctx.location, "mtl") else {
            tracing::warn!(location = ctx.location, "cannot derive MTL location, using default materials");
            return None;
        };
        match ctx.fetcher.fetch(&location).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "MTL companion unavailable, using default materials");
                None
            }
        }
    }
}

impl FormatParser for ObjParser {
    fn parse<'a>(&'a self, ctx: ParseContext<'a>) -> BoxFuture<'a, Result<ParsedModel, ParseError>> {
        Self::run(ctx).boxed()
    }

    fn supported_formats(&self) -> Vec<FormatTag> {
        vec![FormatTag::Obj]
    }
}
