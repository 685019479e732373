//! Topic API: one subscription call per notification channel of the node.

use std::sync::Arc;

use tokio::sync::Mutex;

use nemrpc_core::{Network, StreamError};

use crate::config::StreamConfig;
use crate::connection::StreamConnection;
use crate::subscriptions::Subscription;

/// A notification channel published by the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// New blocks (chain height).
    NewBlocks,
    /// Errors raised by the node for this client.
    Errors,
    UnconfirmedTransactions(String),
    ConfirmedTransactions(String),
    RecentTransactions(String),
    /// Account data changes.
    Account(String),
    OwnedMosaicDefinitions(String),
    OwnedMosaics(String),
    OwnedNamespaces(String),
}

impl Topic {
    /// Destination path sent in SUBSCRIBE.
    pub fn path(&self) -> String {
        match self {
            Self::NewBlocks => "/blocks/new".to_string(),
            Self::Errors => "/errors".to_string(),
            Self::UnconfirmedTransactions(a) => format!("/unconfirmed/{a}"),
            Self::ConfirmedTransactions(a) => format!("/transactions/{a}"),
            Self::RecentTransactions(a) => format!("/recenttransactions/{a}"),
            Self::Account(a) => format!("/account/{a}"),
            Self::OwnedMosaicDefinitions(a) => format!("/account/mosaic/owned/definition/{a}"),
            Self::OwnedMosaics(a) => format!("/account/mosaic/owned/{a}"),
            Self::OwnedNamespaces(a) => format!("/account/namespace/owned/{a}"),
        }
    }

    /// Parse a short topic name (as used by the CLI), taking the address for
    /// account-scoped topics.
    pub fn from_name(name: &str, address: Option<&str>) -> Result<Self, String> {
        let addr = || {
            address
                .map(str::to_string)
                .ok_or_else(|| format!("topic {name:?} needs an address"))
        };
        Ok(match name {
            "blocks" | "height" => Self::NewBlocks,
            "errors" => Self::Errors,
            "unconfirmed" => Self::UnconfirmedTransactions(addr()?),
            "transactions" | "confirmed" => Self::ConfirmedTransactions(addr()?),
            "recent" => Self::RecentTransactions(addr()?),
            "account" => Self::Account(addr()?),
            "mosaic-definitions" => Self::OwnedMosaicDefinitions(addr()?),
            "mosaics" => Self::OwnedMosaics(addr()?),
            "namespaces" => Self::OwnedNamespaces(addr()?),
            other => return Err(format!("unknown topic: {other}")),
        })
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Streaming client for one node.
///
/// The first subscription opens and handshakes the connection; later ones
/// share it. The client never reconnects on its own: once the connection
/// has closed, subscriptions fail with [`StreamError::ConnectionClosed`]
/// until [`reset`](Self::reset) is called.
pub struct StreamClient {
    base_url: String,
    config: StreamConfig,
    connection: Mutex<Option<Arc<StreamConnection>>>,
}

impl StreamClient {
    pub fn new(base_url: impl Into<String>, config: StreamConfig) -> Self {
        Self {
            base_url: base_url.into(),
            config,
            connection: Mutex::new(None),
        }
    }

    /// Client for the default public node of `network`.
    pub fn for_network(network: Network) -> Self {
        Self::new(network.default_url(), StreamConfig::default())
    }

    /// Wrap an already handshaken connection.
    pub fn with_connection(base_url: impl Into<String>, connection: StreamConnection) -> Self {
        Self {
            base_url: base_url.into(),
            config: StreamConfig::default(),
            connection: Mutex::new(Some(Arc::new(connection))),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared connection, handshaking on first use.
    pub async fn connection(&self) -> Result<Arc<StreamConnection>, StreamError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }
        let conn = Arc::new(StreamConnection::connect(&self.base_url, &self.config).await?);
        *slot = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Drop the current connection, closing it. The next subscription
    /// handshakes again.
    pub async fn reset(&self) {
        let old = self.connection.lock().await.take();
        if let Some(conn) = old {
            conn.close().await;
        }
    }

    pub async fn subscribe_topic(&self, topic: Topic) -> Result<Subscription, StreamError> {
        self.connection().await?.subscribe_topic(&topic).await
    }

    /// New blocks, i.e. chain height updates.
    pub async fn subscribe_height(&self) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::NewBlocks).await
    }

    pub async fn subscribe_errors(&self) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::Errors).await
    }

    pub async fn subscribe_unconfirmed_tx(&self, address: &str) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::UnconfirmedTransactions(address.to_string()))
            .await
    }

    pub async fn subscribe_confirmed_tx(&self, address: &str) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::ConfirmedTransactions(address.to_string()))
            .await
    }

    pub async fn subscribe_recent_tx(&self, address: &str) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::RecentTransactions(address.to_string()))
            .await
    }

    /// Account data changes for `address`.
    pub async fn subscribe_account(&self, address: &str) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::Account(address.to_string())).await
    }

    pub async fn subscribe_mosaic_definitions(
        &self,
        address: &str,
    ) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::OwnedMosaicDefinitions(address.to_string()))
            .await
    }

    pub async fn subscribe_mosaics(&self, address: &str) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::OwnedMosaics(address.to_string()))
            .await
    }

    pub async fn subscribe_namespaces(&self, address: &str) -> Result<Subscription, StreamError> {
        self.subscribe_topic(Topic::OwnedNamespaces(address.to_string()))
            .await
    }
}
