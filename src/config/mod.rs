//! SDK configuration
//!
//! This module provides:
//! - Deployment environments and their URLs (`Environment`)
//! - Client configuration types (`ClientConfig`, `Credentials`)
//! - YAML and environment-variable loading (`load_config`, `ClientConfig::from_env`)
//! - Protocol constants
//! - Logging setup with secret redaction

pub mod constants;
pub mod environment;
mod loader;
pub mod logging;
mod types;

pub use environment::Environment;
pub use types::{ClientConfig, Credentials};

pub use loader::{load_config, load_config_from_str};
