//! Client configuration.
//!
//! Defaults, environment overrides and a serde-deserializable override set
//! for whatever outer layer reads config files. Secrets are never printed:
//! `Debug` masks them and validation errors never echo them.

use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderValue;
use serde::{Deserialize, Deserializer};
use staticship_protocol::ShipError;
use staticship_protocol::constants::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT};

pub const ENV_API_URL: &str = "SHIP_API_URL";
pub const ENV_API_KEY: &str = "SHIP_API_KEY";
pub const ENV_DEPLOY_TOKEN: &str = "SHIP_DEPLOY_TOKEN";
pub const ENV_TIMEOUT_MS: &str = "SHIP_TIMEOUT_MS";

/// Resolved configuration used to build an [`HttpTransport`].
///
/// [`HttpTransport`]: crate::HttpTransport
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Takes precedence over `api_key` when both are set.
    pub deploy_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            deploy_token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("deploy_token", &self.deploy_token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Partial configuration. Set fields win over the base they are applied to.
#[derive(Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub deploy_token: Option<String>,
    #[serde(rename = "timeoutMs", deserialize_with = "millis")]
    pub timeout: Option<Duration>,
}

fn millis<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(de)?.map(Duration::from_millis))
}

impl ConfigOverrides {
    /// Reads `SHIP_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ShipError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through an arbitrary lookup (the environment, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ShipError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match non_empty(ENV_TIMEOUT_MS) {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|_| {
                    ShipError::Config(format!("{ENV_TIMEOUT_MS} must be a whole number of milliseconds"))
                })?;
                Some(Duration::from_millis(ms))
            }
            None => None,
        };

        Ok(Self {
            api_url: non_empty(ENV_API_URL),
            api_key: non_empty(ENV_API_KEY),
            deploy_token: non_empty(ENV_DEPLOY_TOKEN),
            timeout,
        })
    }
}

impl ClientConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ShipError> {
        let config = Self::default().apply(ConfigOverrides::from_env()?);
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with every set field of `overrides` applied.
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.api_url {
            self.api_url = url;
        }
        if overrides.api_key.is_some() {
            self.api_key = overrides.api_key;
        }
        if overrides.deploy_token.is_some() {
            self.deploy_token = overrides.deploy_token;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        self
    }

    /// Checks the URL, the timeout and that credentials fit in a header.
    pub fn validate(&self) -> Result<(), ShipError> {
        let url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| ShipError::Config(format!("invalid API URL '{}': {e}", self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ShipError::Config(format!(
                "API URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(ShipError::Config("timeout must be greater than zero".into()));
        }
        self.auth_header()?;
        Ok(())
    }

    /// API URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// `Authorization` header for the configured credential, if any.
    pub(crate) fn auth_header(&self) -> Result<Option<HeaderValue>, ShipError> {
        let (secret, what) = match (&self.deploy_token, &self.api_key) {
            (Some(token), _) => (token, "deploy token"),
            (None, Some(key)) => (key, "API key"),
            (None, None) => return Ok(None),
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {secret}"))
            .map_err(|_| ShipError::Config(format!("{what} contains invalid characters")))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}
