//! The demultiplexing loop: sole reader of a streaming socket.
//!
//! Every frame is decoded once and routed by its `subscription` header.
//! Frames without a matching live subscription are dropped. Decode failures
//! are counted and skipped; only end-of-stream, a socket error or a shutdown
//! request ends the loop, after which every subscription queue is closed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use nemrpc_core::codec::{decode_frame, is_heartbeat};
use nemrpc_core::{BoxedSource, FrameError};

use crate::subscriptions::{Delivery, SubscriptionRegistry};

/// Counters updated by the reader task.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    received: AtomicU64,
    delivered: AtomicU64,
    unrouted: AtomicU64,
    malformed: AtomicU64,
    heartbeats: AtomicU64,
}

impl ConnectionStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            heartbeats: self.heartbeats.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`ConnectionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Socket messages read, heart-beats excluded.
    pub received: u64,
    pub delivered: u64,
    /// Frames with no `subscription` header or an unknown id.
    pub unrouted: u64,
    pub malformed: u64,
    pub heartbeats: u64,
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    EndOfStream,
    SocketError(String),
    Shutdown,
}

/// Run the loop until the socket ends or `shutdown` flips to `true`.
pub async fn run(
    mut source: BoxedSource,
    registry: SubscriptionRegistry,
    stats: Arc<ConnectionStats>,
    mut shutdown: watch::Receiver<bool>,
    strict_frames: bool,
) -> LoopExit {
    let exit = loop {
        if *shutdown.borrow() {
            break LoopExit::Shutdown;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                // A dropped sender also means nobody can use this connection.
                if changed.is_err() || *shutdown.borrow() {
                    break LoopExit::Shutdown;
                }
            }
            msg = source.next_message() => match msg {
                None => break LoopExit::EndOfStream,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "stream socket error");
                    break LoopExit::SocketError(e.to_string());
                }
                Some(Ok(bytes)) => route(&bytes, &registry, &stats, strict_frames),
            }
        }
    };

    registry.close_all();
    tracing::info!(reason = ?exit, "demultiplexing loop ended");
    exit
}

fn route(bytes: &[u8], registry: &SubscriptionRegistry, stats: &ConnectionStats, strict: bool) {
    if is_heartbeat(bytes) {
        ConnectionStats::bump(&stats.heartbeats);
        return;
    }
    ConnectionStats::bump(&stats.received);

    let decoded = match decode_frame(bytes) {
        Ok(d) if strict && !d.complete => Err(FrameError::Truncated),
        other => other,
    };
    let frame = match decoded {
        Ok(d) => d.frame,
        Err(e) => {
            ConnectionStats::bump(&stats.malformed);
            tracing::warn!(error = %e, len = bytes.len(), "dropping malformed frame");
            return;
        }
    };

    let Some(id) = frame.subscription_id() else {
        ConnectionStats::bump(&stats.unrouted);
        tracing::trace!(command = %frame.command, "frame without subscription id");
        return;
    };

    match registry.dispatch(id, frame) {
        Delivery::Delivered => ConnectionStats::bump(&stats.delivered),
        Delivery::Unrouted => {
            ConnectionStats::bump(&stats.unrouted);
            tracing::trace!(subscription = id, "no live subscription for frame");
        }
        Delivery::ConsumerGone => {
            ConnectionStats::bump(&stats.unrouted);
            tracing::debug!(subscription = id, "consumer dropped, subscription removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_all(registry: &SubscriptionRegistry, stats: &ConnectionStats, msgs: &[&[u8]]) {
        for m in msgs {
            route(m, registry, stats, false);
        }
    }

    #[test]
    fn routes_by_subscription_header() {
        let registry = SubscriptionRegistry::new();
        let stats = ConnectionStats::default();
        let mut sub = registry.register("/blocks/new").unwrap();
        let hit = format!("MESSAGE\nsubscription:{}\n\n{{\"height\":1}}\0", sub.id());

        route_all(
            &registry,
            &stats,
            &[
                hit.as_bytes(),
                b"MESSAGE\ndestination:/blocks/new\n\n{}\0",
                b"MESSAGE\nsubscription:not-a-number\n\n{}\0",
                b"\n",
                b"MESSAGE\nbroken header\n\n\0",
            ],
        );

        assert!(sub.try_recv().is_some());
        assert!(sub.try_recv().is_none());
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                received: 4,
                delivered: 1,
                unrouted: 2,
                malformed: 1,
                heartbeats: 1,
            }
        );
    }

    #[test]
    fn strict_mode_rejects_truncated_frames() {
        let registry = SubscriptionRegistry::new();
        let stats = ConnectionStats::default();
        let mut sub = registry.register("/errors").unwrap();
        let truncated = format!("MESSAGE\nsubscription:{}\n\n{{}}", sub.id());

        route(truncated.as_bytes(), &registry, &stats, true);
        assert!(sub.try_recv().is_none());
        assert_eq!(stats.snapshot().malformed, 1);

        route(truncated.as_bytes(), &registry, &stats, false);
        assert!(sub.try_recv().is_some());
    }

    #[test]
    fn strict_mode_accepts_nul_on_command_line() {
        let registry = SubscriptionRegistry::new();
        let stats = ConnectionStats::default();

        route(b"RECEIPT\0", &registry, &stats, true);
        let snap = stats.snapshot();
        assert_eq!(snap.malformed, 0);
        assert_eq!(snap.unrouted, 1);
    }
}
