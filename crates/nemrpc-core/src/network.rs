//! Network presets for public NIS nodes.

use serde::{Deserialize, Serialize};

/// Port of the node's REST API.
pub const DEFAULT_REST_PORT: u16 = 7890;
/// Port of the node's streaming (STOMP over WebSocket) endpoint.
pub const DEFAULT_STREAM_PORT: u16 = 7778;
/// Path of the streaming endpoint.
pub const DEFAULT_STREAM_PATH: &str = "/w/messages/websocket";

/// The NEM network a node belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Network byte used as the address version prefix.
    pub fn id(self) -> u8 {
        match self {
            Self::Mainnet => 0x68,
            Self::Testnet => 0x98,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x68 => Some(Self::Mainnet),
            0x98 => Some(Self::Testnet),
            _ => None,
        }
    }

    /// `host:port` of a default public node.
    pub fn default_host(self) -> &'static str {
        match self {
            Self::Mainnet => "209.126.98.204:7890",
            Self::Testnet => "23.228.67.85:7890",
        }
    }

    /// REST base URL of a default public node.
    pub fn default_url(self) -> String {
        format!("http://{}", self.default_host())
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
