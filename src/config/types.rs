//! Client configuration types
//!
//! `ClientConfig` is loaded from YAML or environment variables and shared by
//! the REST client, the WebSocket client and the facade.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants::WS_TIMEOUT_SECS;
use super::environment::Environment;
use super::logging::SanitizedValue;
use crate::error::{ParadexError, ParadexResult};

// ============================================================================
// Credentials
// ============================================================================

/// Optional account credentials.
///
/// A main account needs `l1_address` plus one of the private keys; a subkey
/// needs `l2_private_key` and `l2_address` and no L1 material.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default)]
    pub l1_address: Option<String>,
    #[serde(default)]
    pub l1_private_key: Option<String>,
    #[serde(default)]
    pub l2_private_key: Option<String>,
    #[serde(default)]
    pub l2_address: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.l1_address.is_none()
            && self.l1_private_key.is_none()
            && self.l2_private_key.is_none()
            && self.l2_address.is_none()
    }

    /// L2-only credentials with an explicit address
    pub fn is_subkey(&self) -> bool {
        self.l1_address.is_none()
            && self.l1_private_key.is_none()
            && self.l2_private_key.is_some()
            && self.l2_address.is_some()
    }

    pub fn validate(&self) -> ParadexResult<()> {
        if self.is_empty() {
            return Ok(());
        }

        for (name, value) in [
            ("l1_address", &self.l1_address),
            ("l1_private_key", &self.l1_private_key),
            ("l2_private_key", &self.l2_private_key),
            ("l2_address", &self.l2_address),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ParadexError::Config(format!(
                    "Credentials: {} cannot be empty",
                    name
                )));
            }
        }

        if self.is_subkey() {
            return Ok(());
        }

        if self.l2_address.is_some() && (self.l1_address.is_some() || self.l1_private_key.is_some()) {
            return Err(ParadexError::Config(
                "Credentials: l2_address is only used by subkeys and cannot be combined with l1_address or l1_private_key"
                    .to_string(),
            ));
        }

        if self.l1_address.is_none() {
            return Err(ParadexError::Config(
                "Credentials: l1_address is required unless l2_private_key and l2_address describe a subkey"
                    .to_string(),
            ));
        }

        if self.l1_private_key.is_none() && self.l2_private_key.is_none() {
            return Err(ParadexError::Config(
                "Credentials: one of l1_private_key or l2_private_key is required".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_deref().map(|s| SanitizedValue::new(s).to_string());
        f.debug_struct("Credentials")
            .field("l1_address", &self.l1_address)
            .field("l1_private_key", &redact(&self.l1_private_key))
            .field("l2_private_key", &redact(&self.l2_private_key))
            .field("l2_address", &self.l2_address)
            .finish()
    }
}

// ============================================================================
// Client Configuration
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_ws_timeout_secs() -> u64 {
    WS_TIMEOUT_SECS
}

/// Top-level SDK configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default)]
    pub env: Environment,
    /// Overrides the environment's REST URL (tests, proxies)
    #[serde(default)]
    pub api_url: Option<String>,
    /// Overrides the environment's WebSocket URL
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default = "default_ws_timeout_secs")]
    pub ws_timeout_secs: u64,
    /// Authenticate and refresh the JWT automatically
    #[serde(default = "default_true")]
    pub auto_auth: bool,
    /// Reconnect and resubscribe when the WebSocket drops
    #[serde(default = "default_true")]
    pub ws_reconnect: bool,
    /// Run the background reader; when false the caller pumps frames
    #[serde(default = "default_true")]
    pub ws_auto_start_reader: bool,
    /// Send a WebSocket ping at this interval
    #[serde(default)]
    pub ws_ping_interval_ms: Option<u64>,
    /// Retries for REST calls failing with 429, 5xx or a transport error
    #[serde(default)]
    pub http_max_retries: u32,
    #[serde(default)]
    pub credentials: Credentials,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_env(Environment::default())
    }
}

impl ClientConfig {
    pub fn for_env(env: Environment) -> Self {
        Self {
            env,
            api_url: None,
            ws_url: None,
            ws_timeout_secs: WS_TIMEOUT_SECS,
            auto_auth: true,
            ws_reconnect: true,
            ws_auto_start_reader: true,
            ws_ping_interval_ms: None,
            http_max_retries: 0,
            credentials: Credentials::default(),
        }
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.env.api_url())
    }

    pub fn ws_url(&self) -> String {
        self.ws_url.clone().unwrap_or_else(|| self.env.ws_url())
    }

    pub fn ws_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_timeout_secs)
    }

    pub fn ws_ping_interval(&self) -> Option<Duration> {
        self.ws_ping_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn validate(&self) -> ParadexResult<()> {
        if let Some(url) = &self.api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ParadexError::Config(format!(
                    "api_url must start with http:// or https:// (got '{}')",
                    url
                )));
            }
        }

        if let Some(url) = &self.ws_url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(ParadexError::Config(format!(
                    "ws_url must start with ws:// or wss:// (got '{}')",
                    url
                )));
            }
        }

        if self.ws_timeout_secs == 0 {
            return Err(ParadexError::Config(
                "ws_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.ws_ping_interval_ms == Some(0) {
            return Err(ParadexError::Config(
                "ws_ping_interval_ms must be > 0 when set".to_string(),
            ));
        }

        self.credentials.validate()
    }
}
