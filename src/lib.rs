//! Paradex SDK
//!
//! Client for the Paradex derivatives venue:
//! - L1 -> L2 key derivation and Starknet account addresses (`account`)
//! - SNIP-12 typed messages for auth, onboarding, orders and block trades (`message`)
//! - REST client with JWT refresh (`api::ParadexApiClient`)
//! - WebSocket client with subscriptions and reconnect (`api::ParadexWebsocketClient`)
//! - `Paradex` / `ParadexSubkey` facades wiring it all together

pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod message;
pub mod paradex;
pub mod types;
pub mod utils;

pub use account::{AccountKind, ParadexAccount};
pub use api::{ParadexApiClient, ParadexWebsocketChannel, ParadexWebsocketClient};
pub use config::{ClientConfig, Credentials, Environment};
pub use error::{ParadexError, ParadexResult};
pub use paradex::{Paradex, ParadexSubkey};
