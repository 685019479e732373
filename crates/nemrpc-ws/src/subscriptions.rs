//! Subscription registry: subscription id → delivery queue.
//!
//! The registry is shared between the callers that subscribe and the single
//! reader task that routes frames. Once closed it rejects new registrations
//! and has dropped every queue sender, so all subscription streams end.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use nemrpc_core::{Frame, StreamError};

/// Ids are drawn from `[0, 2^63)`.
const ID_MASK: u64 = u64::MAX >> 1;

struct SubscriptionEntry {
    topic: String,
    sender: mpsc::UnboundedSender<Frame>,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<u64, SubscriptionEntry>,
    closed: bool,
}

/// Outcome of routing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No live subscription has this id; the frame was dropped.
    Unrouted,
    /// The consumer had dropped its queue; the entry was removed.
    ConsumerGone,
}

/// Shared table of live subscriptions.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscription under a fresh random id.
    ///
    /// The id is re-drawn until it does not collide with a live one.
    pub fn register(&self, topic: &str) -> Result<Subscription, StreamError> {
        self.register_with(topic, || rand::random::<u64>() & ID_MASK)
    }

    pub(crate) fn register_with(
        &self,
        topic: &str,
        mut next_id: impl FnMut() -> u64,
    ) -> Result<Subscription, StreamError> {
        let mut state = self.state();
        if state.closed {
            return Err(StreamError::ConnectionClosed);
        }
        let id = loop {
            let candidate = next_id();
            if !state.entries.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(id = candidate, "subscription id collision, redrawing");
        };
        let (tx, rx) = mpsc::unbounded_channel();
        state.entries.insert(
            id,
            SubscriptionEntry {
                topic: topic.to_string(),
                sender: tx,
            },
        );
        Ok(Subscription {
            id,
            topic: topic.to_string(),
            rx,
            registry: self.clone(),
        })
    }

    /// Route a frame to the subscription with the given id.
    pub fn dispatch(&self, id: u64, frame: Frame) -> Delivery {
        let mut state = self.state();
        let Some(entry) = state.entries.get(&id) else {
            return Delivery::Unrouted;
        };
        if entry.sender.send(frame).is_ok() {
            return Delivery::Delivered;
        }
        state.entries.remove(&id);
        Delivery::ConsumerGone
    }

    /// Remove a subscription. Its queue ends once drained.
    pub fn remove(&self, id: u64) -> bool {
        self.state().entries.remove(&id).is_some()
    }

    /// Close the registry: every queue ends and new registrations fail.
    pub fn close_all(&self) {
        let mut state = self.state();
        state.closed = true;
        let dropped = state.entries.len();
        state.entries.clear();
        if dropped > 0 {
            tracing::debug!(subscriptions = dropped, "closed all subscription queues");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn contains(&self, id: u64) -> bool {
        self.state().entries.contains_key(&id)
    }

    /// `(id, topic)` of every live subscription.
    pub fn active(&self) -> Vec<(u64, String)> {
        self.state()
            .entries
            .iter()
            .map(|(id, e)| (*id, e.topic.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live topic subscription: a lazy, not-restartable sequence of frames.
///
/// The sequence ends when the connection terminates. Dropping the
/// subscription deregisters it without touching the shared socket.
pub struct Subscription {
    id: u64,
    topic: String,
    rx: mpsc::UnboundedReceiver<Frame>,
    registry: SubscriptionRegistry,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next frame, or `None` once the connection has closed.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nemrpc_core::Command;

    fn message(n: u64) -> Frame {
        Frame::new(Command::Message).with_body(serde_json::json!({ "n": n }))
    }

    #[test]
    fn register_and_dispatch() {
        let registry = SubscriptionRegistry::new();
        let mut sub = registry.register("/blocks/new").unwrap();
        assert!(sub.id() <= ID_MASK);

        assert_eq!(registry.dispatch(sub.id(), message(1)), Delivery::Delivered);
        let frame = sub.try_recv().unwrap();
        assert_eq!(frame.body_as::<serde_json::Value>().unwrap()["n"], 1);
    }

    #[test]
    fn unknown_id_is_unrouted() {
        let registry = SubscriptionRegistry::new();
        let sub = registry.register("/errors").unwrap();
        assert_eq!(
            registry.dispatch(sub.id().wrapping_add(1), message(1)),
            Delivery::Unrouted
        );
    }

    #[test]
    fn collision_redraws_id() {
        let registry = SubscriptionRegistry::new();
        let first = registry.register_with("/a", || 7).unwrap();
        let mut draws = vec![8, 7].into_iter().rev();
        let second = registry
            .register_with("/b", || draws.next().unwrap())
            .unwrap();
        assert_eq!(first.id(), 7);
        assert_eq!(second.id(), 8);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn drop_deregisters() {
        let registry = SubscriptionRegistry::new();
        let sub = registry.register("/errors").unwrap();
        let id = sub.id();
        assert!(registry.contains(id));
        drop(sub);
        assert!(!registry.contains(id));
        assert_eq!(registry.dispatch(id, message(1)), Delivery::Unrouted);
    }

    #[test]
    fn close_all_ends_queues_and_rejects_new() {
        let registry = SubscriptionRegistry::new();
        let mut sub = registry.register("/blocks/new").unwrap();
        registry.dispatch(sub.id(), message(1));
        registry.close_all();

        assert!(sub.try_recv().is_some());
        assert!(sub.try_recv().is_none());
        assert!(registry.is_closed());
        assert!(matches!(
            registry.register("/errors"),
            Err(StreamError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn recv_returns_none_after_close() {
        let registry = SubscriptionRegistry::new();
        let mut sub = registry.register("/blocks/new").unwrap();
        registry.close_all();
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn active_lists_topics() {
        let registry = SubscriptionRegistry::new();
        let _a = registry.register("/blocks/new").unwrap();
        let _b = registry.register("/errors").unwrap();
        let mut topics: Vec<_> = registry.active().into_iter().map(|(_, t)| t).collect();
        topics.sort();
        assert_eq!(topics, vec!["/blocks/new", "/errors"]);
    }
}
