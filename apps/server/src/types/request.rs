// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use meshport_processing::LoadRequest;
use serde::Deserialize;

use crate::error::ApiError;

/// Body of `POST /api/v1/load` and `POST /api/v1/load/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadBody {
    /// Location of the model file.
    pub url: String,

    /// Declared file name. Defaults to the last path segment of `url`.
    #[serde(default)]
    pub name: Option<String>,

    /// MIME type, consulted when the name has no known extension.
    #[serde(default)]
    pub mime_hint: Option<String>,

    /// Replace materials with a wireframe overlay.
    #[serde(default)]
    pub wireframe: bool,

    /// Include base64 geometry buffers in the response.
    #[serde(default)]
    pub include_geometry: bool,
}

impl LoadBody {
    /// Build the pipeline request. Only `http(s)` URLs are accepted: the
    /// server never reads its own filesystem on behalf of a client.
    pub fn to_request(&self) -> Result<LoadRequest, ApiError> {
        if !is_remote_url(&self.url) {
            return Err(ApiError::BadRequest(format!(
                "url must use http or https: {}",
                self.url
            )));
        }

        let name = self
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| name_from_url(&self.url));
        let mut request = LoadRequest::new(self.url.clone(), name).with_wireframe(self.wireframe);
        if let Some(mime) = &self.mime_hint {
            request = request.with_mime_hint(mime.clone());
        }
        Ok(request)
    }
}

fn is_remote_url(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")) && !rest.is_empty()
}

/// Last path segment, without query string or fragment.
fn name_from_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = url[..end].trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path).to_string()
}
