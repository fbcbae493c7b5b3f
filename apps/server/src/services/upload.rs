// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uploaded files.
//!
//! Uploads may arrive gzip-compressed. Multipart bodies bypass the
//! decompression layer, so the gzip magic is checked here.

use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::ApiError;

/// Location an uploaded file is served under by the in-memory fetcher.
/// Companion lookups resolve beside it and miss.
pub fn upload_location(name: &str) -> String {
    format!("upload://{}", name)
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decompress gzip uploads and enforce the size ceiling on the result.
pub fn decode_upload(data: Vec<u8>, max_bytes: usize, max_mb: usize) -> Result<Vec<u8>, ApiError> {
    if !data.starts_with(&GZIP_MAGIC) {
        if data.len() > max_bytes {
            return Err(ApiError::FileTooLarge { max_mb });
        }
        return Ok(data);
    }

    let mut decoded = Vec::new();
    GzDecoder::new(data.as_slice())
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut decoded)
        .map_err(|e| ApiError::BadRequest(format!("invalid gzip upload: {}", e)))?;
    if decoded.len() > max_bytes {
        return Err(ApiError::FileTooLarge { max_mb });
    }
    tracing::debug!(compressed = data.len(), decompressed = decoded.len(), "decompressed upload");
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_upload_location() {
        assert_eq!(upload_location("part.obj"), "upload://part.obj");
    }

    #[test]
    fn test_plain_upload_passes_through() {
        let data = b"solid part\nendsolid part\n".to_vec();
        assert_eq!(decode_upload(data.clone(), 1024, 1).unwrap(), data);
    }

    #[test]
    fn test_gzip_upload_is_decompressed() {
        let data = b"ply\nformat ascii 1.0\nend_header\n".to_vec();
        assert_eq!(decode_upload(gzip(&data), 1024, 1).unwrap(), data);
    }

    #[test]
    fn test_size_ceiling_applies_after_decompression() {
        let data = vec![b'a'; 4096];
        let compressed = gzip(&data);
        assert!(compressed.len() < 1024);
        assert!(matches!(
            decode_upload(compressed, 1024, 1),
            Err(ApiError::FileTooLarge { max_mb: 1 })
        ));
    }
}
