//! WebSocket socket halves backed by `tokio-tungstenite`.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use nemrpc_core::{BoxedSink, BoxedSource, FrameSink, FrameSource, StreamError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a WebSocket.
pub struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

/// Read half of a WebSocket.
pub struct WsSource {
    inner: SplitStream<WsStream>,
}

/// Open a WebSocket to `url` and split it into boxed halves.
pub async fn open(url: &Url) -> Result<(BoxedSink, BoxedSource), StreamError> {
    tracing::info!(url = %url, "connecting via WebSocket");
    let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| StreamError::handshake(format!("cannot open {url}: {e}")))?;
    let (sink, stream) = ws.split();
    Ok((
        Box::new(WsSink { inner: sink }),
        Box::new(WsSource { inner: stream }),
    ))
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        self.inner
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| StreamError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.inner
            .close()
            .await
            .map_err(|e| StreamError::Socket(e.to_string()))
    }
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_message(&mut self) -> Option<Result<Vec<u8>, StreamError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_bytes().to_vec())),
                Ok(Message::Binary(data)) => return Some(Ok(data.to_vec())),
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "WebSocket closed by node");
                    return None;
                }
                // ping/pong are answered by tungstenite itself
                Ok(_) => continue,
                Err(e) => return Some(Err(StreamError::Socket(e.to_string()))),
            }
        }
    }
}
