//! A handshaken streaming connection shared by many subscriptions.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use nemrpc_core::codec::{decode_frame, encode_command};
use nemrpc_core::frame::header;
use nemrpc_core::{BoxedSink, BoxedSource, Command, Headers, StreamError};

use crate::config::StreamConfig;
use crate::demux::{self, ConnectionStats, LoopExit, StatsSnapshot};
use crate::socket;
use crate::subscriptions::{Subscription, SubscriptionRegistry};
use crate::topics::Topic;

const STOMP_VERSION: &str = "1.2";

/// A connection to the node's streaming endpoint.
///
/// Only obtainable through the CONNECT/CONNECTED handshake. A background
/// task owns the read half; writes go through a lock shared by every caller.
pub struct StreamConnection {
    writer: Arc<Mutex<BoxedSink>>,
    registry: SubscriptionRegistry,
    stats: Arc<ConnectionStats>,
    shutdown: watch::Sender<bool>,
    reader: std::sync::Mutex<Option<JoinHandle<LoopExit>>>,
}

impl StreamConnection {
    /// Open a WebSocket to the node behind `base_url` and handshake.
    ///
    /// `base_url` is the node's REST URL; it is rewritten to the streaming
    /// port and path from `config`.
    pub async fn connect(base_url: &str, config: &StreamConfig) -> Result<Self, StreamError> {
        let endpoint = config.stream_endpoint(base_url)?;
        let (sink, source) = socket::open(&endpoint.url).await?;
        Self::handshake(sink, source, &endpoint.host, config).await
    }

    /// Run the handshake over already-open socket halves and start the
    /// demultiplexing loop.
    pub async fn handshake(
        mut sink: BoxedSink,
        mut source: BoxedSource,
        host: &str,
        config: &StreamConfig,
    ) -> Result<Self, StreamError> {
        let connect = encode_command(
            &Command::Connect,
            &Headers::new()
                .with(header::ACCEPT_VERSION, STOMP_VERSION)
                .with(header::HOST, host),
        );
        sink.send_text(connect)
            .await
            .map_err(|e| StreamError::handshake(format!("cannot send CONNECT: {e}")))?;

        let reply = tokio::time::timeout(config.handshake_timeout(), source.next_message())
            .await
            .map_err(|_| {
                StreamError::handshake(format!(
                    "no reply to CONNECT within {}ms",
                    config.handshake_timeout_ms
                ))
            })?;
        let bytes = match reply {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => return Err(StreamError::handshake(e.to_string())),
            None => return Err(StreamError::handshake("socket closed before CONNECTED")),
        };
        let frame = decode_frame(&bytes)
            .map_err(|e| StreamError::handshake(format!("undecodable reply: {e}")))?
            .frame;

        match frame.command {
            Command::Connected => {}
            Command::Error => {
                let reason = frame.headers.get(header::MESSAGE).unwrap_or("no message");
                return Err(StreamError::handshake(format!("node sent ERROR: {reason}")));
            }
            other => {
                return Err(StreamError::handshake(format!(
                    "expected CONNECTED, got {other}"
                )))
            }
        }
        tracing::info!(
            host,
            version = frame.headers.version().unwrap_or(STOMP_VERSION),
            "stream connected"
        );

        let registry = SubscriptionRegistry::new();
        let stats = Arc::new(ConnectionStats::default());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let reader = tokio::spawn(demux::run(
            source,
            registry.clone(),
            Arc::clone(&stats),
            shutdown_rx,
            config.strict_frames,
        ));

        Ok(Self {
            writer: Arc::new(Mutex::new(sink)),
            registry,
            stats,
            shutdown,
            reader: std::sync::Mutex::new(Some(reader)),
        })
    }

    /// Subscribe to a topic path.
    ///
    /// The id is registered before SUBSCRIBE is written, so no frame for it
    /// can arrive unrouted. On a write failure the id is released and the
    /// connection stays usable for other callers.
    pub async fn subscribe(&self, destination: &str) -> Result<Subscription, StreamError> {
        let subscription = self.registry.register(destination)?;
        let frame = encode_command(
            &Command::Subscribe,
            &Headers::new()
                .with(header::ID, subscription.id())
                .with(header::DESTINATION, destination)
                .with(header::ACK, "auto"),
        );

        let sent = self.writer.lock().await.send_text(frame).await;
        if let Err(e) = sent {
            tracing::warn!(destination, error = %e, "SUBSCRIBE failed");
            // dropping the subscription releases its id
            return Err(match e {
                StreamError::SendFailed(_) => e,
                other => StreamError::SendFailed(other.to_string()),
            });
        }

        tracing::debug!(destination, id = subscription.id(), "subscribed");
        Ok(subscription)
    }

    /// Subscribe to one of the node's well-known topics.
    pub async fn subscribe_topic(&self, topic: &Topic) -> Result<Subscription, StreamError> {
        self.subscribe(&topic.path()).await
    }

    /// `true` once the reader has stopped and every queue is closed.
    pub fn is_closed(&self) -> bool {
        self.registry.is_closed()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// `(id, topic)` of every live subscription.
    pub fn subscriptions(&self) -> Vec<(u64, String)> {
        self.registry.active()
    }

    /// Tear the connection down: stop the reader, close every subscription
    /// queue and close the socket.
    pub async fn close(&self) -> Option<LoopExit> {
        let _ = self.shutdown.send(true);
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        let exit = match reader {
            Some(handle) => handle.await.ok(),
            None => None,
        };
        self.registry.close_all();
        if let Err(e) = self.writer.lock().await.close().await {
            tracing::debug!(error = %e, "error closing stream socket");
        }
        exit
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
