//! Reliability policies for REST requests.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy};
