use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::errors::ChannelError;

/// One inbound transport frame. Close frames end the stream instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    /// Binary, ping and pong frames; the channel ignores them.
    Other,
}

pub type FrameStream = BoxStream<'static, Result<Frame, ChannelError>>;
pub type FrameSink = Pin<Box<dyn Sink<String, Error = ChannelError> + Send>>;

/// An open transport split into its outbound and inbound halves.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Abstraction over opening the realtime transport, for testability.
/// Real implementation: `WsConnector`.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Connection, ChannelError>;
}

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Connection, ChannelError> {
        match reqwest::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "ws" | "wss") => {}
            _ => return Err(ChannelError::InvalidEndpoint(url.to_string())),
        }
        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::Handshake(e.to_string()))?;
        let (sink, stream) = socket.split();

        let sink = sink
            .sink_map_err(|e| ChannelError::Transport(e.to_string()))
            .with(|text: String| futures::future::ready(Ok::<_, ChannelError>(Message::text(text))));

        let stream = stream.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Close(_)) => None,
                Ok(_) => Some(Ok(Frame::Other)),
                Err(e) => Some(Err(ChannelError::Transport(e.to_string()))),
            }
        });

        Ok(Connection {
            sink: Box::pin(sink),
            stream: stream.boxed(),
        })
    }
}
