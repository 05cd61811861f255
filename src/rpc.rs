//! JSON-RPC client for `eth_getCode` and `eth_getStorageAt`, backed by a
//! bounded LRU cache per operation.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::cache::{SharedCache, MIN_CAPACITY};
use crate::error::RpcError;

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// A cached JSON-RPC client for the subset of calls the analysis engine needs.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    code_cache: SharedCache<(String, String), String>,
    storage_cache: SharedCache<(String, String, String), String>,
}

impl RpcClient {
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client builds with static config"),
            code_cache: SharedCache::new(capacity),
            storage_cache: SharedCache::new(capacity),
        }
    }

    pub async fn clear_caches(&self) {
        self.code_cache.clear().await;
        self.storage_cache.clear().await;
    }

    /// Fetch contract bytecode via `eth_getCode`. Returns `"0x"` for EOAs.
    pub async fn get_code(&self, address: &str, rpc_url: &str) -> Result<String, RpcError> {
        let key = (address.to_lowercase(), rpc_url.to_string());
        if let Some(cached) = self.code_cache.get(&key).await {
            return Ok(cached);
        }

        let result = self
            .call(rpc_url, "eth_getCode", json!([address, "latest"]))
            .await?;
        self.code_cache.put(key, result.clone()).await;
        Ok(result)
    }

    /// Fetch a single 32-byte storage word via `eth_getStorageAt`.
    pub async fn get_storage_at(
        &self,
        address: &str,
        slot: &str,
        rpc_url: &str,
    ) -> Result<String, RpcError> {
        let key = (address.to_lowercase(), slot.to_string(), rpc_url.to_string());
        if let Some(cached) = self.storage_cache.get(&key).await {
            return Ok(cached);
        }

        let result = self
            .call(rpc_url, "eth_getStorageAt", json!([address, slot, "latest"]))
            .await?;
        self.storage_cache.put(key, result.clone()).await;
        Ok(result)
    }

    async fn call(
        &self,
        rpc_url: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<String, RpcError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let resp = self.http.post(rpc_url).json(&payload).send().await?;
        let text = resp.text().await?;
        let parsed: JsonRpcResponse =
            serde_json::from_str(&text).map_err(RpcError::InvalidJson)?;

        if let Some(err) = parsed.error {
            debug!(method, code = ?err.code, "RPC call returned an error object");
            return Err(RpcError::JsonRpc {
                code: err.code,
                message: err.message,
            });
        }

        parsed.result.ok_or(RpcError::NullResult)
    }
}

impl Default for RpcClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_code_returns_result_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x6080",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RpcClient::new();
        let first = client.get_code("0xabc", &server.uri()).await.unwrap();
        let second = client.get_code("0xABC", &server.uri()).await.unwrap();
        assert_eq!(first, "0x6080");
        assert_eq!(second, "0x6080");
    }

    #[tokio::test]
    async fn jsonrpc_error_object_maps_to_jsonrpc_variant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "execution reverted"},
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new();
        let err = client.get_code("0xabc", &server.uri()).await.unwrap_err();
        match err {
            RpcError::JsonRpc { code, message } => {
                assert_eq!(code, Some(-32000));
                assert_eq!(message, "execution reverted");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_result_maps_to_null_result_variant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": null,
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new();
        let err = client.get_code("0xabc", &server.uri()).await.unwrap_err();
        assert!(matches!(err, RpcError::NullResult));
    }

    #[tokio::test]
    async fn clear_caches_forces_a_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x00",
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = RpcClient::new();
        client.get_code("0xabc", &server.uri()).await.unwrap();
        client.clear_caches().await;
        client.get_code("0xabc", &server.uri()).await.unwrap();
    }
}
