//! STOMP frame model: command, ordered headers and a JSON-shaped body.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::FrameError;

/// Frame command (first line of every frame).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Message,
    Receipt,
    Error,
    Disconnect,
    /// Any command outside the set above; passed through header-only.
    Other(String),
}

impl Command {
    pub fn parse(s: &str) -> Self {
        match s {
            "CONNECT" => Self::Connect,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            "DISCONNECT" => Self::Disconnect,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Disconnect => "DISCONNECT",
            Self::Other(s) => s,
        }
    }

    /// Only these commands carry a JSON body from the node.
    pub fn carries_body(&self) -> bool {
        matches!(self, Self::Send | Self::Message | Self::Error)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header names with a known meaning.
pub mod header {
    pub const CONTENT_LENGTH: &str = "content-length";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const DESTINATION: &str = "destination";
    pub const RECEIPT: &str = "receipt";
    pub const SUBSCRIPTION: &str = "subscription";
    pub const MESSAGE_ID: &str = "message-id";
    pub const VERSION: &str = "version";
    pub const HEART_BEAT: &str = "heart-beat";
    pub const MESSAGE: &str = "message";
    pub const ID: &str = "id";
    pub const ACK: &str = "ack";
    pub const ACCEPT_VERSION: &str = "accept-version";
    pub const HOST: &str = "host";
}

/// Frame headers in wire order.
///
/// Unknown headers are kept verbatim. A repeated header overwrites the
/// earlier value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, validating known headers against their schema.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), FrameError> {
        let name = name.into();
        let value = value.into();
        if name == header::CONTENT_LENGTH && value.trim().parse::<usize>().is_err() {
            return Err(FrameError::InvalidHeader { name, value });
        }
        self.entries.insert(name, value);
        Ok(())
    }

    /// Builder-style insert for outgoing frames with trusted values.
    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.entries.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subscription(&self) -> Option<&str> {
        self.get(header::SUBSCRIPTION)
    }

    /// The `subscription` header parsed as a numeric subscription id.
    pub fn subscription_id(&self) -> Option<u64> {
        self.subscription().and_then(|s| s.trim().parse().ok())
    }

    pub fn destination(&self) -> Option<&str> {
        self.get(header::DESTINATION)
    }

    pub fn content_length(&self) -> Option<usize> {
        self.get(header::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(header::CONTENT_TYPE)
    }

    pub fn receipt(&self) -> Option<&str> {
        self.get(header::RECEIPT)
    }

    pub fn message_id(&self) -> Option<&str> {
        self.get(header::MESSAGE_ID)
    }

    pub fn version(&self) -> Option<&str> {
        self.get(header::VERSION)
    }

    pub fn heart_beat(&self) -> Option<&str> {
        self.get(header::HEART_BEAT)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Decoded frame body.
///
/// An absent body is modelled as `Option::None` on [`Frame::body`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Scalar(ScalarValue),
}

/// A JSON string, number, boolean or null.
///
/// Objects and arrays always decode to [`FrameBody::Object`] and
/// [`FrameBody::Array`], so they cannot be wrapped here.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarValue(Value);

impl ScalarValue {
    /// `None` for objects and arrays.
    pub fn new(value: Value) -> Option<Self> {
        match value {
            Value::Object(_) | Value::Array(_) => None,
            other => Some(Self(other)),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl FrameBody {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Object(m) => Value::Object(m.clone()),
            Self::Array(a) => Value::Array(a.clone()),
            Self::Scalar(v) => v.0.clone(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Object(m) => Value::Object(m),
            Self::Array(a) => Value::Array(a),
            Self::Scalar(v) => v.0,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Value> for FrameBody {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(m) => Self::Object(m),
            Value::Array(a) => Self::Array(a),
            other => Self::Scalar(ScalarValue(other)),
        }
    }
}

/// One frame of the streaming protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub command: Command,
    pub headers: Headers,
    pub body: Option<FrameBody>,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<FrameBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn subscription_id(&self) -> Option<u64> {
        self.headers.subscription_id()
    }

    /// Deserialize the body into a typed entity. An absent body is read as `null`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, FrameError> {
        let value = self
            .body
            .as_ref()
            .map(FrameBody::to_value)
            .unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(FrameError::InvalidBody)
    }
}
