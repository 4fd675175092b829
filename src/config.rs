//! Client configuration.
//!
//! A [`ClientConfig`] is handed to [`ConductorClient::new`](crate::ConductorClient::new)
//! and is the only place default headers, the base URL and transport
//! settings live. Nothing is configured process-wide.
//!
//! # Example Configuration File
//!
//! ```toml
//! base_url = "http://localhost:8080/api"
//! timeout_ms = 30000
//!
//! [headers]
//! "X-Authorization" = "token123"
//! ```

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the server base URL.
pub const ENV_SERVER_URL: &str = "CONDUCTOR_SERVER_URL";

/// Environment variable holding an optional request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "CONDUCTOR_TIMEOUT_MS";

/// Configuration for a [`ConductorClient`](crate::ConductorClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Conductor REST API, e.g. `http://localhost:8080/api`.
    ///
    /// Operation paths are appended verbatim, so any path prefix is kept.
    pub base_url: String,

    /// Value of the `Content-Type` header sent with every request.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Extra headers sent with every request.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,

    /// Request timeout in milliseconds. `None` leaves the transport default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Encode `includeTasks`/`includeClosed` the way existing servers
    /// expect them: `"boolean"` for true, `"false"` for false.
    #[serde(default = "default_legacy_boolean_flags")]
    pub legacy_boolean_flags: bool,
}

fn default_content_type() -> String {
    "application/json".to_string()
}

fn default_user_agent() -> String {
    format!("conductor-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_legacy_boolean_flags() -> bool {
    true
}

impl ClientConfig {
    /// Create a configuration for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            content_type: default_content_type(),
            headers: IndexMap::new(),
            timeout_ms: None,
            user_agent: default_user_agent(),
            legacy_boolean_flags: default_legacy_boolean_flags(),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = ClientConfig::from_file("conductor.toml")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Build configuration from `CONDUCTOR_SERVER_URL` and
    /// `CONDUCTOR_TIMEOUT_MS`.
    ///
    /// ```bash
    /// export CONDUCTOR_SERVER_URL="http://localhost:8080/api"
    /// export CONDUCTOR_TIMEOUT_MS=10000
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_SERVER_URL)
            .ok_or_else(|| Error::Configuration(format!("{} is not set", ENV_SERVER_URL)))?;
        let mut config = Self::new(base_url);

        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            let ms = timeout.parse::<u64>().map_err(|e| {
                Error::Configuration(format!("{} must be milliseconds: {}", ENV_TIMEOUT_MS, e))
            })?;
            config.timeout_ms = Some(ms);
        }

        Ok(config)
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the `User-Agent` header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Choose between the legacy (`"boolean"`) and standard (`"true"`)
    /// encoding of boolean query flags.
    pub fn with_legacy_boolean_flags(mut self, legacy: bool) -> Self {
        self.legacy_boolean_flags = legacy;
        self
    }

    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// All headers applied to every request, `Content-Type` first.
    ///
    /// An explicit `Content-Type` entry in [`headers`](Self::headers) wins.
    pub fn default_headers(&self) -> IndexMap<String, String> {
        let mut headers = IndexMap::with_capacity(self.headers.len() + 1);
        headers.insert("Content-Type".to_string(), self.content_type.clone());
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-type") {
                headers.shift_remove("Content-Type");
            }
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /// Query value for a boolean flag under the configured encoding.
    pub fn flag_value(&self, flag: bool) -> &'static str {
        match (flag, self.legacy_boolean_flags) {
            (true, true) => "boolean",
            (true, false) => "true",
            (false, _) => "false",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_new_config_defaults() {
        let config = ClientConfig::new("http://localhost:8080/api");
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.content_type, "application/json");
        assert!(config.headers.is_empty());
        assert_eq!(config.timeout(), None);
        assert!(config.user_agent.starts_with("conductor-client/"));
        assert!(config.legacy_boolean_flags);
    }

    #[test]
    fn test_default_headers_carry_content_type() {
        let config = ClientConfig::new("http://localhost:8080").with_header("X-Authorization", "t");
        let headers: Vec<_> = config.default_headers().into_iter().collect();
        assert_eq!(
            headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Authorization".to_string(), "t".to_string()),
            ]
        );
    }

    #[test]
    fn test_explicit_content_type_header_overrides() {
        let config =
            ClientConfig::new("http://localhost:8080").with_header("content-type", "text/plain");
        let headers = config.default_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("content-type"), Some(&"text/plain".to_string()));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            base_url = "http://conductor:8080/api"
            timeout_ms = 30000
            legacy_boolean_flags = false

            [headers]
            "X-Authorization" = "secret"
        "#;

        let config = ClientConfig::from_toml(toml).unwrap();
        assert_eq!(config.base_url, "http://conductor:8080/api");
        assert_eq!(config.timeout(), Some(Duration::from_millis(30_000)));
        assert!(!config.legacy_boolean_flags);
        assert_eq!(config.content_type, "application/json");
        assert_eq!(
            config.headers.get("X-Authorization"),
            Some(&"secret".to_string())
        );
    }

    #[test]
    fn test_parse_toml_requires_base_url() {
        let err = ClientConfig::from_toml("timeout_ms = 5").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conductor.toml");
        std::fs::write(&path, "base_url = \"http://localhost:9090\"\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config, ClientConfig::new("http://localhost:9090"));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_SERVER_URL, "http://localhost:8080/api"),
            (ENV_TIMEOUT_MS, "2500"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.timeout_ms, Some(2500));
    }

    #[test]
    fn test_from_lookup_missing_url() {
        let err = ClientConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains(ENV_SERVER_URL));
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let err = ClientConfig::from_lookup(|k| match k {
            ENV_SERVER_URL => Some("http://localhost".to_string()),
            _ => Some("soon".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_flag_value_encodings() {
        let legacy = ClientConfig::new("http://localhost");
        assert_eq!(legacy.flag_value(true), "boolean");
        assert_eq!(legacy.flag_value(false), "false");

        let standard = legacy.with_legacy_boolean_flags(false);
        assert_eq!(standard.flag_value(true), "true");
        assert_eq!(standard.flag_value(false), "false");
    }
}
