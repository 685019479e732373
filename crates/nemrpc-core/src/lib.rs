//! nemrpc-core: frame model, codec and shared types for nemrpc.
//!
//! # Overview
//!
//! nemrpc talks to a NEM NIS node over two channels: plain REST calls and a
//! push channel that carries a small subset of STOMP over a WebSocket. This
//! crate holds what both sides share:
//!
//! - [`Frame`] / [`Headers`] / [`FrameBody`]: the streaming frame model
//! - [`codec`]: frame decoding and encoding
//! - [`FrameSink`] / [`FrameSource`]: the socket halves a stream runs on
//! - [`StreamError`], [`FrameError`], [`TransportError`]: error taxonomy
//! - [`Network`]: mainnet/testnet presets
//! - [`policy`]: retry policy for REST calls

pub mod codec;
pub mod error;
pub mod frame;
pub mod network;
pub mod policy;
pub mod transport;

pub use codec::{decode_frame, encode_command, encode_frame, DecodedFrame};
pub use error::{FrameError, StreamError, TransportError};
pub use frame::{Command, Frame, FrameBody, Headers, ScalarValue};
pub use network::Network;
pub use transport::{BoxedSink, BoxedSource, FrameSink, FrameSource};
