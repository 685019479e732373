//! JSON entities returned by the node's REST endpoints.

use serde::{Deserialize, Serialize};

/// List endpoints wrap their records in `{"data": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DataList<T> {
    pub data: Vec<T>,
}

/// `/chain/height`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeight {
    pub height: u64,
}

/// `/chain/score`; the score is a hex string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainScore {
    pub score: String,
}

/// `{"data": "<hex>"}` as used for block and transaction hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashData {
    pub data: String,
}

/// `/chain/last-block`, `/block/at/public`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub time_stamp: u64,
    pub signature: String,
    pub prev_block_hash: HashData,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub version: i32,
    pub signer: String,
    pub height: u64,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Durable account state. Balances are in micro NEM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: String,
    pub balance: u64,
    pub vested_balance: u64,
    pub importance: f64,
    /// `None` until the account has published a transaction.
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub harvested_blocks: u64,
}

/// `/account/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetaData {
    /// `UNKNOWN`, `LOCKED` or `UNLOCKED`.
    pub status: String,
    /// `REMOTE`, `ACTIVATING`, `ACTIVE`, `DEACTIVATING` or `INACTIVE`.
    pub remote_status: String,
    #[serde(default)]
    pub cosignatory_of: Vec<AccountInfo>,
    #[serde(default)]
    pub cosignatories: Vec<AccountInfo>,
}

/// `/account/get`, `/account/get/from-public-key`, `/account/get/forwarded`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetaDataPair {
    pub account: AccountInfo,
    pub meta: AccountMetaData,
}

/// One block harvested by an account (`/account/harvests`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestInfo {
    pub time_stamp: u64,
    pub difficulty: u64,
    pub total_fee: u64,
    pub id: u64,
    pub height: u64,
}

// ---------------------------------------------------------------------------
// Mosaics and namespaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicId {
    pub namespace_id: String,
    pub name: String,
}

/// `/account/mosaic/owned`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mosaic {
    pub mosaic_id: MosaicId,
    pub quantity: u64,
}

/// `/namespace`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    /// Fully qualified name, e.g. `makoto.metal.coins`.
    pub fqn: String,
    pub owner: String,
    pub height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMetaData {
    /// Paging cursor for `/namespace/root/page`.
    pub id: u64,
}

/// `/namespace/root/page`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMetaDataPair {
    pub meta: NamespaceMetaData,
    pub namespace: NamespaceInfo,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMessage {
    /// Hex payload.
    pub payload: String,
    /// 1 = plain, 2 = encrypted.
    #[serde(rename = "type")]
    pub kind: u8,
}

/// A transaction as returned by the node.
///
/// The fields common to transfers are typed. Anything specific to other
/// transaction types stays in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub time_stamp: u64,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub signature: Option<String>,
    pub fee: u64,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(rename = "type")]
    pub kind: u32,
    pub deadline: u64,
    #[serde(default)]
    pub message: Option<TransactionMessage>,
    pub version: i32,
    pub signer: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMetaData {
    pub id: u64,
    pub height: u64,
    pub hash: HashData,
}

/// `/account/transfers/{incoming,outgoing,all}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetaDataPair {
    pub meta: TransactionMetaData,
    pub transaction: Transaction,
}

/// `/node/extended-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub node: Node,
    pub nis_info: NisInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub meta_data: NodeMetaData,
    pub endpoint: NodeEndpoint,
    pub identity: NodeIdentity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetaData {
    pub features: u32,
    #[serde(default)]
    pub application: Option<String>,
    pub network_id: i32,
    pub version: String,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEndpoint {
    pub protocol: String,
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdentity {
    pub name: String,
    #[serde(alias = "public-key")]
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NisInfo {
    pub current_time: u64,
    pub application: String,
    pub start_time: u64,
    pub version: String,
    pub signer: String,
}
