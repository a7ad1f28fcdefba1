//! Configuration for the client module.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{ClientError, ClientResult};

/// Environment variable overriding the service base URL.
const API_URL_ENV: &str = "MINDFUL_API_URL";
/// Environment variable overriding the default conversation mode.
const MODE_ENV: &str = "MINDFUL_MODE";
/// Environment variable overriding the request deadline (milliseconds).
const TIMEOUT_ENV: &str = "MINDFUL_TIMEOUT_MS";
/// Environment variable overriding the synthesized-response latency (milliseconds).
const MOCK_DELAY_ENV: &str = "MINDFUL_MOCK_DELAY_MS";
/// Environment variable forcing synthesized responses.
const MOCK_ENV: &str = "MINDFUL_MOCK";
/// Environment variable toggling the synthesized fallback on error.
const FALLBACK_ENV: &str = "MINDFUL_FALLBACK";

/// Configuration for the chat client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the analysis service.
    pub api_base_url: String,
    /// Per-endpoint paths appended to the base URL.
    pub endpoints: EndpointPaths,
    /// Conversation mode used when the user has not picked one.
    pub default_mode: String,
    /// Hard deadline applied to every request.
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
    /// Skip the network and always synthesize responses.
    pub mock_responses: bool,
    /// Synthesize a response when a real call fails (chat and stats only).
    pub fallback_to_mock_on_error: bool,
    /// Simulated latency of a synthesized response.
    #[serde(with = "duration_ms")]
    pub mock_delay: Duration,
    /// How long a failure notice stays visible.
    #[serde(with = "duration_ms")]
    pub toast_duration: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8003".to_string(),
            endpoints: EndpointPaths::default(),
            default_mode: "chat".to_string(),
            request_timeout: Duration::from_millis(60_000),
            mock_responses: false,
            fallback_to_mock_on_error: true,
            mock_delay: Duration::from_millis(320),
            toast_duration: Duration::from_millis(4200),
        }
    }
}

impl ClientConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the defaults overlaid with `MINDFUL_*` environment variables.
    ///
    /// Unparseable numeric or boolean values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from the defaults overlaid with values returned by `lookup`.
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV) {
            config = config.with_base_url(url);
        }
        if let Some(mode) = lookup(MODE_ENV).filter(|m| !m.trim().is_empty()) {
            config = config.with_default_mode(mode.trim());
        }
        if let Some(timeout) = env_millis(&lookup, TIMEOUT_ENV) {
            config = config.with_timeout(timeout);
        }
        if let Some(delay) = env_millis(&lookup, MOCK_DELAY_ENV) {
            config = config.with_mock_delay(delay);
        }
        if let Some(flag) = env_flag(&lookup, MOCK_ENV) {
            config = config.with_mock_responses(flag);
        }
        if let Some(flag) = env_flag(&lookup, FALLBACK_ENV) {
            config = config.with_fallback(flag);
        }

        config
    }

    /// Set the service base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Force synthesized responses on or off.
    #[must_use]
    pub const fn with_mock_responses(mut self, enabled: bool) -> Self {
        self.mock_responses = enabled;
        self
    }

    /// Enable or disable the synthesized fallback on error.
    #[must_use]
    pub const fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_mock_on_error = enabled;
        self
    }

    /// Set the simulated latency of synthesized responses.
    #[must_use]
    pub const fn with_mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = delay;
        self
    }

    /// Set the default conversation mode.
    #[must_use]
    pub fn with_default_mode(mut self, mode: impl Into<String>) -> Self {
        self.default_mode = mode.into();
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse or the deadline is zero.
    pub fn validate(&self) -> ClientResult<()> {
        Url::parse(&self.api_base_url)?;

        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request_timeout must be > 0".to_string(),
            ));
        }

        if self.default_mode.trim().is_empty() {
            return Err(ClientError::Config(
                "default_mode must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute URL for a path relative to the base URL.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }
}

/// Paths of the three service endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    /// Chat endpoint (`POST`).
    pub chat: String,
    /// History endpoint (`GET`).
    pub history: String,
    /// Stats endpoint (`GET`).
    pub stats: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            chat: "/chat".to_string(),
            history: "/history".to_string(),
            stats: "/stats".to_string(),
        }
    }
}

/// Read a millisecond count.
fn env_millis<F>(lookup: &F, name: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .inspect_err(|_| tracing::warn!("ignoring {name}={raw}: not a number"))
        .ok()
}

/// Read a boolean-ish value (`1/0`, `true/false`, `yes/no`, `on/off`).
fn env_flag<F>(lookup: &F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("ignoring {name}={raw}: not a boolean");
            None
        }
    }
}

/// Serde module for Duration serialization as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_environment_overlay() {
        let config = ClientConfig::from_lookup(lookup_in(&[
            ("MINDFUL_API_URL", "http://10.0.0.2:8003"),
            ("MINDFUL_MODE", "  focus "),
            ("MINDFUL_TIMEOUT_MS", "1500"),
            ("MINDFUL_MOCK_DELAY_MS", "0"),
            ("MINDFUL_MOCK", "yes"),
            ("MINDFUL_FALLBACK", "off"),
        ]));

        assert_eq!(config.api_base_url, "http://10.0.0.2:8003");
        assert_eq!(config.default_mode, "focus");
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.mock_delay, Duration::ZERO);
        assert!(config.mock_responses);
        assert!(!config.fallback_to_mock_on_error);
    }

    #[test]
    fn test_environment_ignores_bad_values() {
        let config = ClientConfig::from_lookup(lookup_in(&[
            ("MINDFUL_MODE", "   "),
            ("MINDFUL_TIMEOUT_MS", "soon"),
            ("MINDFUL_MOCK", "maybe"),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8003");
        assert_eq!(config.request_timeout, Duration::from_millis(60_000));
        assert_eq!(config.default_mode, "chat");
        assert!(!config.mock_responses);
        assert!(config.fallback_to_mock_on_error);
        assert_eq!(config.mock_delay, Duration::from_millis(320));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_base_url("http://localhost:9000/")
            .with_timeout(Duration::from_secs(5))
            .with_mock_responses(true)
            .with_fallback(false)
            .with_mock_delay(Duration::from_millis(10))
            .with_default_mode("focus");

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.mock_delay, Duration::from_millis(10));
        assert_eq!(config.default_mode, "focus");
        assert!(config.mock_responses);
        assert!(!config.fallback_to_mock_on_error);
        assert_eq!(config.url_for("/chat"), "http://localhost:9000/chat");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = ClientConfig::new().with_base_url("not a url");
        assert!(matches!(bad_url.validate(), Err(ClientError::InvalidUrl(_))));

        let zero = ClientConfig::new().with_timeout(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"request_timeout": 1500, "mock_responses": true}"#)
                .unwrap_or_default();
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert!(config.mock_responses);
        assert_eq!(config.endpoints.history, "/history");
    }
}
