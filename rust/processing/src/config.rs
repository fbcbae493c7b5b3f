// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loader configuration.

use std::time::Duration;

use meshport_geometry::SanitizeConfig;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`ModelLoader`](crate::ModelLoader)
#[derive(Debug, Clone, PartialEq)]
pub struct LoadConfig {
    /// Parse attempts before giving up, at least one is always made
    pub max_retries: u32,
    /// Delay after the first failed attempt, doubled after each later one
    pub initial_backoff: Duration,
    /// Per-request timeout for network fetches
    pub fetch_timeout: Duration,
    pub sanitize: SanitizeConfig,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            sanitize: SanitizeConfig::default(),
        }
    }
}

impl LoadConfig {
    /// Defaults overridden by `MESHPORT_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_parse("MESHPORT_MAX_RETRIES").unwrap_or(defaults.max_retries),
            initial_backoff: env_parse("MESHPORT_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            fetch_timeout: env_parse("MESHPORT_FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            sanitize: SanitizeConfig {
                max_dimension: env_parse("MESHPORT_MAX_DIMENSION")
                    .unwrap_or(defaults.sanitize.max_dimension),
                target_dimension: env_parse("MESHPORT_TARGET_DIMENSION")
                    .unwrap_or(defaults.sanitize.target_dimension),
                center: defaults.sanitize.center,
            },
        }
    }

    /// Number of attempts actually made
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay after failed attempt `attempt` (1-based): 2s, 4s, 8s by default
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
