// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP and IGES stand-in
//!
//! There is no boundary-representation kernel behind these formats. The
//! parser skips the fetch and returns a fixed mechanical-part shape,
//! flagged as approximate.

use futures::future::BoxFuture;
use futures::FutureExt;
use meshport_core::FormatTag;

use super::{FormatParser, ParseContext};
use crate::error::ParseError;
use crate::model::ParsedModel;

pub struct PlaceholderParser;

impl FormatParser for PlaceholderParser {
    fn parse<'a>(&'a self, ctx: ParseContext<'a>) -> BoxFuture<'a, Result<ParsedModel, ParseError>> {
        tracing::info!(
            name = ctx.name,
            format = %ctx.format,
            "no B-rep import for exchange formats, using placeholder geometry"
        );
        let model = ParsedModel::placeholder(ctx.format, &ctx.sanitizer);
        futures::future::ready(Ok(model)).boxed()
    }

    fn supported_formats(&self) -> Vec<FormatTag> {
        vec![FormatTag::Step, FormatTag::Iges]
    }
}
