//! Streaming connection configuration and endpoint rewriting.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use nemrpc_core::network::{DEFAULT_STREAM_PATH, DEFAULT_STREAM_PORT};
use nemrpc_core::StreamError;

/// Configuration for a streaming connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Port of the streaming endpoint (differs from the REST port).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path of the streaming endpoint.
    #[serde(default = "default_path")]
    pub path: String,
    /// How long to wait for the CONNECTED reply, in milliseconds.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Treat frames that end before their terminating NUL as malformed.
    #[serde(default)]
    pub strict_frames: bool,
}

fn default_port() -> u16 { DEFAULT_STREAM_PORT }
fn default_path() -> String { DEFAULT_STREAM_PATH.to_string() }
fn default_handshake_timeout_ms() -> u64 { 10_000 }

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_path(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            strict_frames: false,
        }
    }
}

impl StreamConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Rewrite a node's REST URL into its streaming endpoint.
    ///
    /// `http://node:7890` becomes `ws://node:7778/w/messages/websocket`;
    /// `https` maps to `wss`. A bare `host[:port]` is read as `http`.
    pub fn stream_endpoint(&self, base_url: &str) -> Result<StreamEndpoint, StreamError> {
        let with_scheme = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };
        let mut url =
            Url::parse(&with_scheme).map_err(|e| StreamError::InvalidUrl(format!("{base_url}: {e}")))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(StreamError::InvalidUrl(format!(
                    "unsupported scheme {other:?} in {base_url}"
                )))
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| StreamError::InvalidUrl(format!("{base_url}: missing host")))?
            .to_string();

        url.set_scheme(scheme)
            .map_err(|()| StreamError::InvalidUrl(format!("cannot use scheme {scheme}")))?;
        url.set_port(Some(self.port))
            .map_err(|()| StreamError::InvalidUrl(format!("cannot set port on {base_url}")))?;
        url.set_path(&self.path);
        url.set_query(None);
        url.set_fragment(None);

        Ok(StreamEndpoint { url, host })
    }
}

/// Where to open the streaming socket, and the bare host for `CONNECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    pub url: Url,
    pub host: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_rest_url_to_stream_port() {
        let cfg = StreamConfig::default();
        let ep = cfg.stream_endpoint("http://209.126.98.204:7890").unwrap();
        assert_eq!(ep.url.as_str(), "ws://209.126.98.204:7778/w/messages/websocket");
        assert_eq!(ep.host, "209.126.98.204");
    }

    #[test]
    fn bare_host_and_tls() {
        let cfg = StreamConfig::default();
        let ep = cfg.stream_endpoint("node.example:7890").unwrap();
        assert_eq!(ep.url.as_str(), "ws://node.example:7778/w/messages/websocket");

        let ep = cfg.stream_endpoint("https://node.example/some/path?x=1").unwrap();
        assert_eq!(ep.url.as_str(), "wss://node.example:7778/w/messages/websocket");
        assert_eq!(ep.host, "node.example");
    }

    #[test]
    fn custom_port_and_path() {
        let cfg = StreamConfig {
            port: 9000,
            path: "/stomp".into(),
            ..StreamConfig::default()
        };
        let ep = cfg.stream_endpoint("http://127.0.0.1:7890").unwrap();
        assert_eq!(ep.url.as_str(), "ws://127.0.0.1:9000/stomp");
    }

    #[test]
    fn rejects_unknown_scheme() {
        let cfg = StreamConfig::default();
        assert!(matches!(
            cfg.stream_endpoint("ftp://node:21"),
            Err(StreamError::InvalidUrl(_))
        ));
    }

    #[test]
    fn config_defaults_from_empty_json() {
        let cfg: StreamConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.port, 7778);
        assert_eq!(cfg.path, "/w/messages/websocket");
        assert!(!cfg.strict_frames);
    }
}
