// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Byte sources for model files
//!
//! A location is an `http(s)://` URL, a `file://` URL, a plain filesystem
//! path, or any key a custom [`Fetcher`] understands (the in-memory fetcher
//! uses arbitrary strings).

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{StatusCode, Url};
use rustc_hash::FxHashMap;

use crate::error::FetchError;

/// Async byte source
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// HTTP(S) fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    async fn get(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::AccessDenied {
                    status: status.as_u16(),
                    location: location.to_string(),
                })
            }
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(location.to_string())),
            s if !s.is_success() => {
                return Err(FetchError::Status {
                    status: s.as_u16(),
                    location: location.to_string(),
                })
            }
            _ => {}
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        tracing::debug!(location, bytes = bytes.len(), "fetched over HTTP");
        Ok(bytes.to_vec())
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        self.get(location).boxed()
    }
}

/// Local filesystem fetcher, accepts plain paths and `file://` URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    async fn read(location: &str) -> Result<Vec<u8>, FetchError> {
        let path = file_path(location);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!(path = %path, bytes = bytes.len(), "read local file");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(location.to_string()))
            }
            Err(e) => Err(FetchError::Io(format!("{}: {}", path, e))),
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Self::read(location).boxed()
    }
}

fn file_path(location: &str) -> String {
    Url::parse(location)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| location.to_string())
}

/// Dispatches on the location scheme: HTTP(S) to [`HttpFetcher`],
/// everything else to [`FileFetcher`]
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpFetcher::new(timeout)?,
            file: FileFetcher,
        })
    }
}

impl Fetcher for DefaultFetcher {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        if is_http(location) {
            self.http.fetch(location)
        } else {
            self.file.fetch(location)
        }
    }
}

fn is_http(location: &str) -> bool {
    let lower = location.get(..8).unwrap_or(location).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// In-memory fetcher for uploads and tests.
///
/// Counts every fetch, including misses.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    files: FxHashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(location, bytes);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(location.into(), bytes.into());
    }

    /// Number of fetch calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = self
            .files
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(location.to_string()));
        futures::future::ready(result).boxed()
    }
}

/// Resolve `relative` against the location of the file referencing it
pub fn resolve_relative(base: &str, relative: &str) -> String {
    if Url::parse(relative).is_ok() {
        return relative.to_string();
    }
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(joined) = base_url.join(relative) {
            return joined.to_string();
        }
    }
    Path::new(base)
        .parent()
        .map(|dir| dir.join(relative).to_string_lossy().into_owned())
        .unwrap_or_else(|| relative.to_string())
}

/// Swap the extension of `location` for `extension`, keeping any query
/// string or fragment. Returns `None` when the path has no extension.
pub fn companion_location(location: &str, extension: &str) -> Option<String> {
    let split = location
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(location.len());
    let (path, suffix) = location.split_at(split);
    let dot = path.rfind('.')?;
    if path[dot..].contains('/') {
        return None;
    }
    Some(format!("{}.{}{}", &path[..dot], extension, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_location() {
        assert_eq!(
            companion_location("https://cdn.example.com/models/part.obj", "mtl").as_deref(),
            Some("https://cdn.example.com/models/part.mtl")
        );
        assert_eq!(
            companion_location("https://cdn.example.com/part.OBJ?sig=abc#top", "mtl").as_deref(),
            Some("https://cdn.example.com/part.mtl?sig=abc#top")
        );
        assert_eq!(
            companion_location("/srv/models/part.obj", "mtl").as_deref(),
            Some("/srv/models/part.mtl")
        );
        assert_eq!(companion_location("https://example.com/v1.2/blob", "mtl"), None);
        assert_eq!(companion_location("blob", "mtl"), None);
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative("https://cdn.example.com/models/scene.gltf", "buffers/mesh.bin"),
            "https://cdn.example.com/models/buffers/mesh.bin"
        );
        assert_eq!(
            resolve_relative("https://cdn.example.com/a/scene.gltf", "https://other.example.com/b.bin"),
            "https://other.example.com/b.bin"
        );
        let local = resolve_relative("/srv/models/scene.gltf", "mesh.bin");
        assert_eq!(Path::new(&local), Path::new("/srv/models/mesh.bin"));
    }

    #[test]
    fn test_is_http() {
        assert!(is_http("https://example.com/a.stl"));
        assert!(is_http("HTTP://example.com/a.stl"));
        assert!(!is_http("/tmp/a.stl"));
        assert!(!is_http("file:///tmp/a.stl"));
    }

    #[test]
    fn test_file_path() {
        assert_eq!(file_path("/tmp/a.stl"), "/tmp/a.stl");
        #[cfg(unix)]
        assert_eq!(file_path("file:///tmp/a.stl"), "/tmp/a.stl");
    }

    #[tokio::test]
    async fn test_memory_fetcher_counts_misses() {
        let fetcher = MemoryFetcher::new().with_file("mem://a.stl", vec![1u8, 2, 3]);
        assert_eq!(fetcher.fetch("mem://a.stl").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            fetcher.fetch("mem://b.stl").await,
            Err(FetchError::NotFound("mem://b.stl".into()))
        );
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_file_fetcher_not_found() {
        let result = FileFetcher.fetch("/definitely/not/here.stl").await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }
}
