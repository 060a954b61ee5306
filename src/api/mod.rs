//! Paradex REST and WebSocket clients

pub mod auth;
mod block_trades;
pub mod http_client;
mod rest;
pub mod ws;

pub use auth::{AuthProvider, SessionToken, StaticToken};
pub use http_client::{redact_headers, HttpClient, QueryParams, RequestHook, RetryPolicy};
pub use rest::ParadexApiClient;
pub use ws::{
    callback, channel_params, ChannelParams, ParadexWebsocketChannel, ParadexWebsocketClient,
    ReconnectConfig, TlsConnector, WsCallback, WsConnection, WsConnector,
};
