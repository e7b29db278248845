//! Construction-time configuration for `RestApiClient`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::media_type::MediaType;

/// Explicit proxy for the transport handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Settings a client is built from.
///
/// `accept_type` is optional: when it is set the `Accept` header is
/// installed at construction, otherwise no `Accept` header is sent until
/// `set_accept_type` is called. Without `proxy` the system proxy applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestClientConfig {
    pub base_address: String,
    #[serde(default)]
    pub content_type: MediaType,
    #[serde(default)]
    pub accept_type: Option<MediaType>,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    /// Per-request timeout passed through to the transport.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl RestClientConfig {
    pub fn new(base_address: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            content_type: MediaType::default(),
            accept_type: None,
            proxy: None,
            timeout_ms: None,
        }
    }

    /// Set both body formats at once.
    pub fn with_media_types(mut self, content_type: MediaType, accept_type: MediaType) -> Self {
        self.content_type = content_type;
        self.accept_type = Some(accept_type);
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
