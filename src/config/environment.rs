//! Paradex deployment environments
//!
//! Each environment maps to an immutable set of base URLs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParadexError;

/// Paradex deployment the SDK talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    #[default]
    Testnet,
    Nightly,
}

impl Environment {
    /// Lowercase name used in hostnames (`api.{name}.paradex.trade`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Testnet => "testnet",
            Environment::Nightly => "nightly",
        }
    }

    /// REST API base URL, without trailing slash
    pub fn api_url(&self) -> String {
        format!("https://api.{}.paradex.trade/v1", self.as_str())
    }

    /// WebSocket JSON-RPC endpoint
    pub fn ws_url(&self) -> String {
        format!("wss://ws.api.{}.paradex.trade/v1", self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ParadexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prod" => Ok(Environment::Prod),
            "testnet" => Ok(Environment::Testnet),
            "nightly" => Ok(Environment::Nightly),
            other => Err(ParadexError::Config(format!(
                "Unknown environment '{}' (expected prod, testnet or nightly)",
                other
            ))),
        }
    }
}
