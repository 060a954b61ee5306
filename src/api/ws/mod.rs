//! WebSocket API: channel names, connection and the subscription client

pub mod channel;
mod client;
pub mod connect;
pub mod reconnect;

pub use channel::{channel_params, ChannelParams, ParadexWebsocketChannel};
pub use client::{callback, ParadexWebsocketClient, WsCallback};
pub use connect::{TlsConnector, WsConnection, WsConnector};
pub use reconnect::ReconnectConfig;
