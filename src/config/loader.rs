//! Configuration loading from YAML files and environment variables

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::{ParadexError, ParadexResult};

use super::types::{ClientConfig, Credentials};

/// Load configuration from a YAML file
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use paradex_sdk::config::load_config;
///
/// let config = load_config(Path::new("paradex.yaml"))?;
/// ```
pub fn load_config(path: &Path) -> ParadexResult<ClientConfig> {
    if !path.exists() {
        return Err(ParadexError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config: ClientConfig = serde_yaml::from_reader(reader).map_err(|e| {
        ParadexError::Config(format!("YAML parse error in '{}': {}", path.display(), e))
    })?;

    config.validate()?;

    Ok(config)
}

/// Load configuration from a YAML string
pub fn load_config_from_str(yaml_content: &str) -> ParadexResult<ClientConfig> {
    let config: ClientConfig = serde_yaml::from_str(yaml_content)
        .map_err(|e| ParadexError::Config(format!("YAML parse error: {}", e)))?;

    config.validate()?;

    Ok(config)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str, default: bool) -> ParadexResult<bool> {
    match env_opt(name) {
        None => Ok(default),
        Some(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ParadexError::Config(format!(
                "{} must be a boolean (got '{}')",
                name, other
            ))),
        },
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> ParadexResult<Option<T>> {
    match env_opt(name) {
        None => Ok(None),
        Some(v) => v.trim().parse().map(Some).map_err(|_| {
            ParadexError::Config(format!("{} must be an integer (got '{}')", name, v))
        }),
    }
}

impl ClientConfig {
    /// Build configuration from `PARADEX_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> ParadexResult<Self> {
        if dotenvy::dotenv().is_ok() {
            debug!("Loaded .env file");
        }

        let mut config = match env_opt("PARADEX_ENV") {
            Some(name) => ClientConfig::for_env(name.parse()?),
            None => ClientConfig::default(),
        };

        config.api_url = env_opt("PARADEX_API_URL");
        config.ws_url = env_opt("PARADEX_WS_URL");

        if let Some(secs) = env_number("PARADEX_WS_TIMEOUT_SECS")? {
            config.ws_timeout_secs = secs;
        }

        config.auto_auth = env_bool("PARADEX_AUTO_AUTH", true)?;
        config.ws_reconnect = !env_bool("PARADEX_DISABLE_RECONNECT", false)?;
        config.ws_ping_interval_ms = env_number("PARADEX_WS_PING_INTERVAL_MS")?;
        if let Some(retries) = env_number("PARADEX_HTTP_MAX_RETRIES")? {
            config.http_max_retries = retries;
        }

        config.credentials = Credentials {
            l1_address: env_opt("PARADEX_L1_ADDRESS"),
            l1_private_key: env_opt("PARADEX_L1_PRIVATE_KEY"),
            l2_private_key: env_opt("PARADEX_L2_PRIVATE_KEY"),
            l2_address: env_opt("PARADEX_L2_ADDRESS"),
        };

        config.validate()?;

        debug!(
            env = %config.env,
            api_url = %config.api_url(),
            auto_auth = config.auto_auth,
            "Loaded configuration from environment"
        );

        Ok(config)
    }
}
