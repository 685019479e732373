//! nemrpc-ws: push notifications from a NEM node over STOMP/WebSocket.
//!
//! # Features
//! - CONNECT/CONNECTED handshake against the node's streaming port
//! - Many topic subscriptions multiplexed over one socket
//! - A single reader task routes frames by subscription id
//! - Subscriptions are `futures::Stream`s that end when the connection closes
//!
//! ```no_run
//! use futures::StreamExt;
//! use nemrpc_ws::{StreamClient, StreamConfig};
//!
//! # async fn run() -> Result<(), nemrpc_core::StreamError> {
//! let client = StreamClient::new("http://209.126.98.204:7890", StreamConfig::default());
//! let mut blocks = client.subscribe_height().await?;
//! while let Some(frame) = blocks.next().await {
//!     println!("{:?}", frame.body);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod demux;
pub mod socket;
pub mod subscriptions;
pub mod topics;

pub use config::{StreamConfig, StreamEndpoint};
pub use connection::StreamConnection;
pub use demux::{LoopExit, StatsSnapshot};
pub use subscriptions::{Subscription, SubscriptionRegistry};
pub use topics::{StreamClient, Topic};
