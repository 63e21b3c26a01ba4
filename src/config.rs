//! Client configuration.
//!
//! [`ApiConfig`] is injected into every [`crate::Session`]; nothing in the
//! crate reads ambient global state. It can be built in code, deserialized
//! with serde, or loaded from the environment.

use crate::defaults;
use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Service endpoints and the default account used to qualify short ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for authorization operations (roles, resources).
    pub core_url: String,
    /// Base URL of the authentication service; falls back to `core_url`.
    #[serde(default)]
    pub authn_url: Option<String>,
    /// Account substituted when an id omits its account segment.
    pub account: String,
    #[serde(default)]
    pub http: HttpConfig,
}

impl ApiConfig {
    pub fn new(core_url: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            core_url: core_url.into(),
            authn_url: None,
            account: account.into(),
            http: HttpConfig::default(),
        }
    }

    pub fn with_authn_url(mut self, url: impl Into<String>) -> Self {
        self.authn_url = Some(url.into());
        self
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Load from `RBAC_CORE_URL`, `RBAC_ACCOUNT` and optionally `RBAC_AUTHN_URL`.
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    ApiError::ConfigurationError(format!("{name} must be set"))
                })
        };
        let mut config = Self::new(
            required(defaults::env::CORE_URL)?,
            required(defaults::env::ACCOUNT)?,
        );
        if let Ok(url) = std::env::var(defaults::env::AUTHN_URL)
            && !url.trim().is_empty()
        {
            config.authn_url = Some(url);
        }
        config.validate()?;
        Ok(config)
    }

    /// Authentication base URL without a trailing slash.
    pub fn authn_base(&self) -> &str {
        self.authn_url
            .as_deref()
            .unwrap_or(&self.core_url)
            .trim_end_matches('/')
    }

    /// Core base URL without a trailing slash.
    pub fn core_base(&self) -> &str {
        self.core_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.core_url).map_err(|e| {
            ApiError::ConfigurationError(format!("Invalid core_url '{}': {e}", self.core_url))
        })?;
        if let Some(url) = &self.authn_url {
            reqwest::Url::parse(url).map_err(|e| {
                ApiError::ConfigurationError(format!("Invalid authn_url '{url}': {e}"))
            })?;
        }
        if self.account.trim().is_empty() {
            return Err(ApiError::ConfigurationError(
                "account must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP client settings handed to [`crate::http::ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Headers sent with every request
    pub headers: HashMap<String, String>,
    /// Proxy URL
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

// Durations travel as whole seconds
mod duration_option_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(defaults::http::REQUEST_TIMEOUT),
            connect_timeout: Some(defaults::http::CONNECT_TIMEOUT),
            headers: HashMap::new(),
            proxy: None,
            user_agent: Some(defaults::http::USER_AGENT.to_string()),
        }
    }
}
