//! REST client for a NIS node backed by `reqwest`.
//!
//! Every call goes through [`NodeClient::request`], which retries transient
//! failures (connection errors, timeouts, 429 and 5xx) with exponential
//! backoff.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use nemrpc_core::policy::{RetryConfig, RetryPolicy};
use nemrpc_core::{Network, TransportError};

use crate::entities::{
    AccountMetaData, AccountMetaDataPair, Block, BlockHeight, ChainScore, DataList, HarvestInfo,
    Mosaic, NamespaceInfo, NamespaceMetaDataPair, NodeInfo, TransactionMetaDataPair,
};

/// Configuration for [`NodeClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    /// Per-request timeout, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 { 10_000 }

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// REST client for one node.
pub struct NodeClient {
    base: Url,
    http: reqwest::Client,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl NodeClient {
    /// Create a client for the node at `base_url` (e.g. `http://host:7890`).
    pub fn new(base_url: &str, config: HttpClientConfig) -> Result<Self, TransportError> {
        let base = Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        let request_timeout = Duration::from_millis(config.request_timeout_ms);
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            base,
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout,
        })
    }

    /// Client for the default public node of `network`.
    pub fn for_network(network: Network) -> Result<Self, TransportError> {
        Self::new(&network.default_url(), HttpClientConfig::default())
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TransportError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send a request and return the raw response body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, TransportError> {
        let url = self.endpoint(path, query)?;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.request_once(method.clone(), url.clone(), body.clone()).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            url = %url,
                            "retrying request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(attempt, error = %e, url = %url, "giving up on request");
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, TransportError> {
        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        let resp = req.send().await.map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.bytes().await.map_err(|e| self.map_reqwest(e))
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }

    /// GET `path` and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        let body = self.request(Method::GET, path, query, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST `payload` as JSON to `path` and decode the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
    ) -> Result<T, TransportError> {
        let body = serde_json::to_vec(payload)?;
        let resp = self.request(Method::POST, path, &[], Some(body)).await?;
        Ok(serde_json::from_slice(&resp)?)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TransportError> {
        let list: DataList<T> = self.get_json(path, query).await?;
        Ok(list.data)
    }

    // -- chain ---------------------------------------------------------------

    /// Current chain height (`/chain/height`).
    pub async fn chain_height(&self) -> Result<BlockHeight, TransportError> {
        self.get_json("/chain/height", &[]).await
    }

    /// Current chain score (`/chain/score`).
    pub async fn chain_score(&self) -> Result<ChainScore, TransportError> {
        self.get_json("/chain/score", &[]).await
    }

    /// Most recent block (`/chain/last-block`).
    pub async fn last_block(&self) -> Result<Block, TransportError> {
        self.get_json("/chain/last-block", &[]).await
    }

    /// Block at `height` (`/block/at/public`).
    pub async fn block_at(&self, height: u64) -> Result<Block, TransportError> {
        self.post_json("/block/at/public", &serde_json::json!({ "height": height }))
            .await
    }

    // -- node ----------------------------------------------------------------

    /// Node and NIS details (`/node/extended-info`).
    pub async fn node_info(&self) -> Result<NodeInfo, TransportError> {
        self.get_json("/node/extended-info", &[]).await
    }

    // -- accounts ------------------------------------------------------------

    /// Account state and metadata by address (`/account/get`).
    pub async fn account(&self, address: &str) -> Result<AccountMetaDataPair, TransportError> {
        self.get_json("/account/get", &[("address", address)]).await
    }

    /// Account state and metadata by public key (`/account/get/from-public-key`).
    pub async fn account_by_public_key(
        &self,
        public_key: &str,
    ) -> Result<AccountMetaDataPair, TransportError> {
        self.get_json("/account/get/from-public-key", &[("publicKey", public_key)])
            .await
    }

    /// Several accounts in one call (`/account/get/batch`).
    pub async fn accounts(&self, addresses: &[&str]) -> Result<Vec<AccountMetaDataPair>, TransportError> {
        let data: Vec<_> = addresses
            .iter()
            .map(|a| serde_json::json!({ "account": a }))
            .collect();
        let list: DataList<AccountMetaDataPair> = self
            .post_json("/account/get/batch", &serde_json::json!({ "data": data }))
            .await?;
        Ok(list.data)
    }

    /// The account that `address` is the delegated harvesting account of
    /// (`/account/get/forwarded`).
    pub async fn delegated_account(&self, address: &str) -> Result<AccountMetaDataPair, TransportError> {
        self.get_json("/account/get/forwarded", &[("address", address)])
            .await
    }

    /// Harvesting and cosignatory status (`/account/status`).
    pub async fn account_status(&self, address: &str) -> Result<AccountMetaData, TransportError> {
        self.get_json("/account/status", &[("address", address)]).await
    }

    /// Blocks harvested by `address`, paged backwards from block `hash`
    /// (`/account/harvests`).
    pub async fn harvested_blocks(
        &self,
        address: &str,
        hash: &str,
    ) -> Result<Vec<HarvestInfo>, TransportError> {
        self.get_list("/account/harvests", &[("address", address), ("hash", hash)])
            .await
    }

    /// Mosaics held by `address` (`/account/mosaic/owned`).
    pub async fn owned_mosaics(&self, address: &str) -> Result<Vec<Mosaic>, TransportError> {
        self.get_list("/account/mosaic/owned", &[("address", address)])
            .await
    }

    // -- transfers -----------------------------------------------------------

    /// Incoming transactions of `address` (`/account/transfers/incoming`).
    pub async fn incoming_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<TransactionMetaDataPair>, TransportError> {
        self.get_list("/account/transfers/incoming", &[("address", address)])
            .await
    }

    /// Outgoing transactions of `address` (`/account/transfers/outgoing`).
    pub async fn outgoing_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<TransactionMetaDataPair>, TransportError> {
        self.get_list("/account/transfers/outgoing", &[("address", address)])
            .await
    }

    /// Incoming and outgoing transactions of `address` (`/account/transfers/all`).
    pub async fn all_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<TransactionMetaDataPair>, TransportError> {
        self.get_list("/account/transfers/all", &[("address", address)])
            .await
    }

    // -- namespaces ----------------------------------------------------------

    /// One page of root namespaces (`/namespace/root/page`). Pass the last
    /// `meta.id` of the previous page as `after` to continue.
    pub async fn root_namespaces(
        &self,
        after: Option<u64>,
        page_size: u32,
    ) -> Result<Vec<NamespaceMetaDataPair>, TransportError> {
        let page_size = page_size.to_string();
        let id = after.map(|id| id.to_string());
        let mut query = vec![("pageSize", page_size.as_str())];
        if let Some(id) = id.as_deref() {
            query.push(("id", id));
        }
        self.get_list("/namespace/root/page", &query).await
    }

    /// Namespace by fully qualified name (`/namespace`).
    pub async fn namespace(&self, name: &str) -> Result<NamespaceInfo, TransportError> {
        self.get_json("/namespace", &[("namespace", name)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_path_and_query() {
        let client = NodeClient::new("http://node.example:7890", HttpClientConfig::default()).unwrap();
        let url = client
            .endpoint("/account/get", &[("address", "TBCI2A67")])
            .unwrap();
        assert_eq!(url.as_str(), "http://node.example:7890/account/get?address=TBCI2A67");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            NodeClient::new("not a url", HttpClientConfig::default()),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
