//! nemrpc-http: REST access to a NEM node.
//!
//! A thin request layer ([`NodeClient::request`]) with retry for transient
//! failures, plus typed helpers for the chain, block, node, account,
//! transfer, mosaic and namespace endpoints.

pub mod client;
pub mod entities;

pub use client::{HttpClientConfig, NodeClient};
pub use entities::{
    AccountInfo, AccountMetaData, AccountMetaDataPair, Block, BlockHeight, ChainScore, HarvestInfo,
    Mosaic, MosaicId, NamespaceInfo, NamespaceMetaDataPair, NodeInfo, Transaction,
    TransactionMetaDataPair,
};
pub use reqwest::Method;
