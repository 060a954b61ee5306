//! WebSocket transport: the default TLS connector and the connector seam
//!
//! The client only sees a boxed sink and stream of tungstenite messages, so a
//! simulator or test can hand it any transport through [`WsConnector`].

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Sink, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, USER_AGENT};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, WebSocketStream};

use crate::api::http_client::user_agent;
use crate::error::{ParadexError, ParadexResult};

pub type WsError = tokio_tungstenite::tungstenite::Error;
pub type WsSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;
pub type WsSource = Pin<Box<dyn Stream<Item = Result<Message, WsError>> + Send>>;

/// Both halves of an open connection
pub struct WsConnection {
    pub sink: WsSink,
    pub source: WsSource,
}

impl WsConnection {
    /// Split a tungstenite stream over any transport.
    pub fn new<S>(stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, source) = stream.split();
        Self {
            sink: Box::pin(sink),
            source: Box::pin(source),
        }
    }
}

/// Opens connections for the WebSocket client
#[async_trait]
pub trait WsConnector: Send + Sync {
    /// `bearer` is set when an account is attached.
    async fn connect(&self, url: &str, bearer: Option<&str>) -> ParadexResult<WsConnection>;
}

/// Default connector: TLSv1.2 minimum, SDK user agent, optional bearer header
#[derive(Debug, Default, Clone, Copy)]
pub struct TlsConnector;

#[async_trait]
impl WsConnector for TlsConnector {
    async fn connect(&self, url: &str, bearer: Option<&str>) -> ParadexResult<WsConnection> {
        let mut request = url.into_client_request()?;

        if let Ok(ua) = HeaderValue::from_str(&user_agent()) {
            request.headers_mut().insert(USER_AGENT, ua);
        }
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ParadexError::AuthenticationFailed(format!("Invalid bearer token: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let tls = native_tls::TlsConnector::builder()
            .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
            .build()
            .map_err(|e| ParadexError::ConnectionFailed(format!("TLS error: {}", e)))?;

        let (stream, _response) =
            connect_async_tls_with_config(request, None, false, Some(Connector::NativeTls(tls))).await?;

        Ok(WsConnection::new(stream))
    }
}
