//! Socket half traits used by the streaming subsystem.
//!
//! A streaming connection is split into a write half ([`FrameSink`]) shared
//! by every caller behind a lock, and a read half ([`FrameSource`]) owned by
//! a single reader task.

use async_trait::async_trait;

use crate::error::StreamError;

/// Write half of a streaming socket.
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Send one encoded frame as a single socket message.
    async fn send_text(&mut self, text: String) -> Result<(), StreamError>;

    /// Close the write half. Errors are ignored by callers.
    async fn close(&mut self) -> Result<(), StreamError>;
}

/// Read half of a streaming socket.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Raw bytes of the next socket message.
    ///
    /// `None` means end-of-stream; an `Err` means the socket failed and no
    /// further messages will arrive.
    async fn next_message(&mut self) -> Option<Result<Vec<u8>, StreamError>>;
}

pub type BoxedSink = Box<dyn FrameSink>;
pub type BoxedSource = Box<dyn FrameSource>;
