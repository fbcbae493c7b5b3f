// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STL decoder (binary and ASCII)
//!
//! Binary layout: 80-byte header, little-endian `u32` facet count, then
//! 50 bytes per facet (normal, three vertices, attribute word).
//!
//! A buffer is binary when its length is exactly `84 + 50 * count`. Anything
//! else that opens with `solid` is parsed as ASCII, falling back to binary
//! when the text does not parse and the buffer still holds `count` facets
//! (exporters that pad the file). Output is an unindexed triangle soup;
//! stored facet normals are discarded and recomputed later.

use nom::{
    bytes::complete::tag_no_case,
    character::complete::{multispace0, not_line_ending},
    combinator::{map, opt},
    multi::many0,
    number::complete::float,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::geometry::{DecodedMesh, RawGeometry};

const HEADER_SIZE: usize = 80;
const PREAMBLE_SIZE: usize = HEADER_SIZE + 4;
const FACET_SIZE: usize = 50;

/// Decode an STL buffer into triangle-soup geometry
pub fn decode_stl(bytes: &[u8]) -> Result<DecodedMesh> {
    let positions = if is_binary(bytes) {
        decode_binary(bytes)?
    } else if starts_with_solid(bytes) {
        let ascii = std::str::from_utf8(bytes)
            .map_err(Error::from)
            .and_then(decode_ascii);
        match ascii {
            Ok(positions) if !positions.is_empty() => positions,
            Err(e) if holds_binary_facets(bytes) => {
                tracing::debug!(error = %e, "not ASCII STL, reading as padded binary");
                decode_binary(bytes)?
            }
            Ok(_) if holds_binary_facets(bytes) => decode_binary(bytes)?,
            other => other?,
        }
    } else {
        decode_binary(bytes)?
    };

    if positions.is_empty() {
        return Err(Error::EmptyScene);
    }

    tracing::debug!(triangles = positions.len() / 9, "decoded STL");
    Ok(DecodedMesh::new(RawGeometry::from_positions(positions), Vec::new()))
}

/// Exact size identity for binary STL
pub fn is_binary(bytes: &[u8]) -> bool {
    match facet_count(bytes) {
        Some(count) => PREAMBLE_SIZE
            .checked_add(count.saturating_mul(FACET_SIZE))
            .is_some_and(|expected| expected == bytes.len()),
        None => false,
    }
}

/// At least one facet and room for all of them, trailing bytes allowed
fn holds_binary_facets(bytes: &[u8]) -> bool {
    facet_count(bytes)
        .filter(|&count| count > 0)
        .and_then(|count| count.checked_mul(FACET_SIZE))
        .and_then(|body| body.checked_add(PREAMBLE_SIZE))
        .is_some_and(|expected| expected <= bytes.len())
}

fn facet_count(bytes: &[u8]) -> Option<usize> {
    let word = bytes.get(HEADER_SIZE..PREAMBLE_SIZE)?;
    Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as usize)
}

fn starts_with_solid(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes
        .get(start..start + 5)
        .is_some_and(|word| word.eq_ignore_ascii_case(b"solid"))
}

fn decode_binary(bytes: &[u8]) -> Result<Vec<f32>> {
    let count = facet_count(bytes).ok_or(Error::Truncated {
        expected: PREAMBLE_SIZE,
        got: bytes.len(),
    })?;

    let expected = count
        .checked_mul(FACET_SIZE)
        .and_then(|body| body.checked_add(PREAMBLE_SIZE))
        .ok_or_else(|| Error::invalid_content(format!("facet count {} overflows", count)))?;
    if bytes.len() < expected {
        return Err(Error::Truncated {
            expected,
            got: bytes.len(),
        });
    }

    let mut positions = Vec::with_capacity(count * 9);
    for facet in bytes[PREAMBLE_SIZE..expected].chunks_exact(FACET_SIZE) {
        // Skip the stored normal (12 bytes) and the trailing attribute word.
        for value in facet[12..48].chunks_exact(4) {
            positions.push(f32::from_le_bytes([value[0], value[1], value[2], value[3]]));
        }
    }
    Ok(positions)
}

fn decode_ascii(text: &str) -> Result<Vec<f32>> {
    let (rest, facets) = solid(text)
        .map_err(|e| Error::invalid_content(format!("ASCII STL: {}", e)))?;

    let (rest, _) = end_solid(rest).unwrap_or((rest, ()));
    if !rest.trim().is_empty() {
        tracing::warn!(
            parsed = facets.len(),
            trailing = rest.len(),
            "ignoring unparsed trailing ASCII STL content"
        );
    }

    Ok(facets.into_iter().flatten().flatten().collect())
}

/// Wrap a parser so it tolerates surrounding whitespace
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn vec3(input: &str) -> IResult<&str, [f32; 3]> {
    map(tuple((ws(float), ws(float), ws(float))), |(x, y, z)| [x, y, z])(input)
}

fn vertex(input: &str) -> IResult<&str, [f32; 3]> {
    preceded(ws(tag_no_case("vertex")), vec3)(input)
}

/// `facet [normal nx ny nz] outer loop vertex*3 endloop endfacet`
fn facet(input: &str) -> IResult<&str, [[f32; 3]; 3]> {
    let (input, _) = ws(tag_no_case("facet"))(input)?;
    let (input, _) = opt(preceded(ws(tag_no_case("normal")), vec3))(input)?;
    let (input, _) = tuple((ws(tag_no_case("outer")), ws(tag_no_case("loop"))))(input)?;
    let (input, (a, b, c)) = tuple((vertex, vertex, vertex))(input)?;
    let (input, _) = tuple((ws(tag_no_case("endloop")), ws(tag_no_case("endfacet"))))(input)?;
    Ok((input, [a, b, c]))
}

fn solid(input: &str) -> IResult<&str, Vec<[[f32; 3]; 3]>> {
    let (input, _) = preceded(pair(multispace0, tag_no_case("solid")), not_line_ending)(input)?;
    many0(facet)(input)
}

fn end_solid(input: &str) -> IResult<&str, ()> {
    map(
        preceded(ws(tag_no_case("endsolid")), not_line_ending),
        |_| (),
    )(input)
}
