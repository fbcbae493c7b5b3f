// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Meshport Core
//!
//! Data model and byte-level decoders for the mesh loading pipeline.
//!
//! ## Overview
//!
//! - **Format Detection**: canonical [`FormatTag`] from a declared file name and
//!   an optional MIME hint
//! - **Geometry Model**: [`RawGeometry`] flat buffers (stride 3 positions,
//!   optional triangle-list indices, normals, UVs and vertex colors)
//! - **Materials**: render-agnostic [`MaterialDescriptor`]
//! - **Decoders**: STL (binary + ASCII), Wavefront OBJ/MTL, glTF/GLB and PLY
//!
//! Nothing in this crate performs I/O. Decoders take bytes and return a
//! [`DecodedMesh`]; fetching, retries and sanitization live in the crates
//! above this one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meshport_core::{detect_format, decode_stl, FormatTag};
//!
//! let tag = detect_format("bracket.STL", None)?;
//! assert_eq!(tag, FormatTag::Stl);
//!
//! let decoded = decode_stl(&bytes)?;
//! println!("{} triangles", decoded.geometry.face_count());
//! ```

pub mod error;
pub mod format;
pub mod geometry;
pub mod material;
pub mod obj;
pub mod ply;
pub mod scene;
pub mod stl;

pub use error::{Error, Result};
pub use format::{detect_format, FormatTag};
pub use geometry::{BoundingBox, BoundingSphere, DecodedMesh, RawGeometry};
pub use material::{MaterialDescriptor, Shading};
pub use obj::decode_obj;
pub use ply::decode_ply;
pub use scene::GltfAsset;
pub use stl::decode_stl;
