// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Format detection from file names and MIME hints.

use crate::error::{Error, Result};
use std::fmt;

/// Canonical format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatTag {
    Stl,
    Obj,
    Gltf,
    Glb,
    Ply,
    Step,
    Iges,
}

/// MIME substring patterns, tested in order.
/// `gltf-binary` must precede the plain `gltf` pattern.
const MIME_PATTERNS: &[(&str, FormatTag)] = &[
    ("gltf-binary", FormatTag::Glb),
    ("gltf", FormatTag::Gltf),
    ("stl", FormatTag::Stl),
    ("sla", FormatTag::Stl),
    ("obj", FormatTag::Obj),
    ("ply", FormatTag::Ply),
    ("step", FormatTag::Step),
    ("iges", FormatTag::Iges),
];

impl FormatTag {
    /// All tags, in detection-table order
    pub const ALL: [FormatTag; 7] = [
        FormatTag::Stl,
        FormatTag::Obj,
        FormatTag::Gltf,
        FormatTag::Glb,
        FormatTag::Ply,
        FormatTag::Step,
        FormatTag::Iges,
    ];

    /// Match a lower-case extension against the fixed extension table
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "stl" => Some(FormatTag::Stl),
            "obj" => Some(FormatTag::Obj),
            "gltf" => Some(FormatTag::Gltf),
            "glb" => Some(FormatTag::Glb),
            "ply" => Some(FormatTag::Ply),
            "step" | "stp" => Some(FormatTag::Step),
            "iges" | "ige" | "igs" => Some(FormatTag::Iges),
            _ => None,
        }
    }

    /// Match a MIME type against the substring table
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.is_empty() {
            return None;
        }
        MIME_PATTERNS
            .iter()
            .find(|(pattern, _)| mime.contains(pattern))
            .map(|&(_, tag)| tag)
    }

    /// Upper-case tag name ("STL", "GLB", ...)
    pub const fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Stl => "STL",
            FormatTag::Obj => "OBJ",
            FormatTag::Gltf => "GLTF",
            FormatTag::Glb => "GLB",
            FormatTag::Ply => "PLY",
            FormatTag::Step => "STEP",
            FormatTag::Iges => "IGES",
        }
    }

    /// Canonical lower-case extension
    pub const fn extension(&self) -> &'static str {
        match self {
            FormatTag::Stl => "stl",
            FormatTag::Obj => "obj",
            FormatTag::Gltf => "gltf",
            FormatTag::Glb => "glb",
            FormatTag::Ply => "ply",
            FormatTag::Step => "step",
            FormatTag::Iges => "iges",
        }
    }

    /// CAD exchange formats with no boundary-representation import
    #[inline]
    pub const fn is_exchange(&self) -> bool {
        matches!(self, FormatTag::Step | FormatTag::Iges)
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased substring after the last `.`, or empty if there is none.
pub fn extension_of(name: &str) -> String {
    name.rfind('.')
        .map(|pos| name[pos + 1..].to_ascii_lowercase())
        .unwrap_or_default()
}

/// Resolve a format tag from a declared name and an optional MIME hint.
///
/// The MIME hint wins when it matches, covering files whose extension is
/// missing or wrong. Otherwise the extension decides.
pub fn detect_format(name: &str, mime_hint: Option<&str>) -> Result<FormatTag> {
    if let Some(tag) = mime_hint.and_then(FormatTag::from_mime) {
        return Ok(tag);
    }

    let extension = extension_of(name);
    FormatTag::from_extension(&extension).ok_or(Error::UnsupportedFormat { extension })
}
