// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted gateway settings plus environment overrides.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Config key the gateway settings live under.
pub const SETTINGS_KEY: &str = "gateway";
/// Backend base URL override.
pub const ENV_BACKEND_URL: &str = "NOCODB_URL";
/// Backend API token override.
pub const ENV_API_TOKEN: &str = "NOCODB_API_TOKEN";
/// Listen address override.
pub const ENV_LISTEN: &str = "TABULA_LISTEN";

/// Settings for the Tabula gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// NocoDB base URL.
    pub backend_url: String,
    /// NocoDB API token, sent as `xc-token`.
    pub api_token: Option<String>,
    /// HTTP listener.
    pub listen: SocketAddr,
    /// Per-call timeout for backend requests.
    pub request_timeout_ms: u64,
    /// Extra attempts for backend reads.
    pub max_retries: u32,
    /// Linear backoff step between read retries.
    pub retry_backoff_ms: u64,
    /// Page size used when a list request carries no `limit`.
    pub default_page_limit: u32,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".into(),
            api_token: None,
            listen: SocketAddr::from(([127, 0, 0, 1], 8787)),
            request_timeout_ms: 10_000,
            max_retries: 2,
            retry_backoff_ms: 200,
            default_page_limit: 25,
        }
    }
}

impl GatewaySettings {
    /// Per-call timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Retry backoff step as a `Duration`.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend_url = url;
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(listen) = get(ENV_LISTEN) {
            self.listen = listen.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    key: ENV_LISTEN.into(),
                    message: e.to_string(),
                }
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: GatewaySettings =
            serde_json::from_str(r#"{"backend_url":"http://noco:8080"}"#).unwrap();
        assert_eq!(settings.backend_url, "http://noco:8080");
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn environment_overrides_win() {
        let vars = env(&[
            (ENV_BACKEND_URL, "https://db.example.test"),
            (ENV_API_TOKEN, "tok"),
            (ENV_LISTEN, "0.0.0.0:9000"),
        ]);
        let mut settings = GatewaySettings::default();
        settings.apply_overrides(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(settings.backend_url, "https://db.example.test");
        assert_eq!(settings.api_token.as_deref(), Some("tok"));
        assert_eq!(settings.listen.port(), 9000);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let vars = env(&[(ENV_API_TOKEN, "  ")]);
        let mut settings = GatewaySettings::default();
        settings.apply_overrides(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(settings.api_token, None);
    }

    #[test]
    fn bad_listen_override_is_reported() {
        let vars = env(&[(ENV_LISTEN, "not-an-addr")]);
        let mut settings = GatewaySettings::default();
        let err = settings.apply_overrides(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == ENV_LISTEN));
    }
}
