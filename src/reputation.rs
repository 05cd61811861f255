//! Deployer wallet reputation via an explorer's Basescan-compatible REST API.
//!
//! Checks deployer wallet age and transaction count. Fresh, low-activity
//! deployers are a risk signal. Degrades gracefully: any explorer failure
//! or missing API key simply yields fewer findings, never an error.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{SharedCache, MIN_CAPACITY};
use crate::detectors::{Finding, Severity};
use crate::error::ExplorerError;

const EXPLORER_API: &str = "https://api.basescan.org/api";
pub const YOUNG_WALLET_DAYS: i64 = 7;
pub const LOW_TX_COUNT: u64 = 5;

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Clone)]
pub struct ReputationClient {
    http: reqwest::Client,
    api_base: String,
    creator_cache: SharedCache<(String, String), (String, String)>,
    first_tx_cache: SharedCache<(String, String), i64>,
    tx_count_cache: SharedCache<(String, String), u64>,
}

impl ReputationClient {
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(EXPLORER_API, capacity)
    }

    /// Point the client at a different explorer base URL, for tests.
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self::build(api_base, MIN_CAPACITY)
    }

    fn build(api_base: impl Into<String>, capacity: usize) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("reqwest client builds with static config"),
            api_base: api_base.into(),
            creator_cache: SharedCache::new(capacity),
            first_tx_cache: SharedCache::new(capacity),
            tx_count_cache: SharedCache::new(capacity),
        }
    }

    pub async fn clear_caches(&self) {
        self.creator_cache.clear().await;
        self.first_tx_cache.clear().await;
        self.tx_count_cache.clear().await;
    }

    /// `(deployer_address, creation_tx_hash)`, or `None` if not found / the
    /// call failed.
    async fn get_contract_creator(
        &self,
        address: &str,
        api_key: &str,
    ) -> Option<(String, String)> {
        let key = (address.to_lowercase(), api_key.to_string());
        if let Some(cached) = self.creator_cache.get(&key).await {
            return Some(cached);
        }

        let params = [
            ("module", "contract"),
            ("action", "getcontractcreation"),
            ("contractaddresses", address),
            ("apikey", api_key),
        ];
        let data = self.fetch(&params).await.ok()?;
        if data.status.as_deref() != Some("1") {
            return None;
        }
        let entry = data.result?.as_array()?.first()?.clone();
        let creator = entry.get("contractCreator")?.as_str()?.to_string();
        let tx_hash = entry.get("txHash")?.as_str()?.to_string();
        let pair = (creator, tx_hash);
        self.creator_cache.put(key, pair.clone()).await;
        Some(pair)
    }

    /// Unix timestamp of the deployer's first transaction.
    async fn get_first_tx_timestamp(&self, deployer: &str, api_key: &str) -> Option<i64> {
        let key = (deployer.to_lowercase(), api_key.to_string());
        if let Some(cached) = self.first_tx_cache.get(&key).await {
            return Some(cached);
        }

        let params = [
            ("module", "account"),
            ("action", "txlist"),
            ("address", deployer),
            ("startblock", "0"),
            ("endblock", "99999999"),
            ("page", "1"),
            ("offset", "1"),
            ("sort", "asc"),
            ("apikey", api_key),
        ];
        let data = self.fetch(&params).await.ok()?;
        if data.status.as_deref() != Some("1") {
            return None;
        }
        let entry = data.result?.as_array()?.first()?.clone();
        let timestamp: i64 = entry.get("timeStamp")?.as_str()?.parse().ok()?;
        self.first_tx_cache.put(key, timestamp).await;
        Some(timestamp)
    }

    /// Total transaction count for the deployer via `eth_getTransactionCount`.
    async fn get_tx_count(&self, deployer: &str, api_key: &str) -> Option<u64> {
        let key = (deployer.to_lowercase(), api_key.to_string());
        if let Some(cached) = self.tx_count_cache.get(&key).await {
            return Some(cached);
        }

        let params = [
            ("module", "proxy"),
            ("action", "eth_getTransactionCount"),
            ("address", deployer),
            ("tag", "latest"),
            ("apikey", api_key),
        ];
        // eth_getTransactionCount responses carry no `status` field, only `result`.
        let data = self.fetch(&params).await.ok()?;
        let result = data.result?;
        let hex_str = result.as_str()?.trim_start_matches("0x");
        let count = u64::from_str_radix(hex_str, 16).ok()?;
        self.tx_count_cache.put(key, count).await;
        Some(count)
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<ExplorerResponse, ExplorerError> {
        let resp = self.http.get(&self.api_base).query(params).send().await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(ExplorerError::InvalidJson)
    }

    /// Findings about deployer age and activity. Empty if `api_key` is
    /// blank or every explorer call fails.
    pub async fn detect(&self, address: &str, api_key: &str, now_unix: i64) -> Vec<Finding> {
        if api_key.is_empty() {
            return Vec::new();
        }

        let Some((deployer, _tx_hash)) = self.get_contract_creator(address, api_key).await else {
            debug!(address, "contract creator not found on explorer");
            return vec![Finding {
                detector: "deployer_reputation".to_string(),
                severity: Severity::Info,
                title: "Contract creator not found on Basescan",
                description: "Could not determine the deployer of this contract. \
                    It may be very new or deployed via an unusual method."
                    .to_string(),
                points: 3,
                offset: None,
            }];
        };

        let mut findings = Vec::new();

        if let Some(first_ts) = self.get_first_tx_timestamp(&deployer, api_key).await {
            let age_days = (now_unix - first_ts) / 86_400;
            if age_days < YOUNG_WALLET_DAYS {
                findings.push(Finding {
                    detector: "deployer_reputation".to_string(),
                    severity: Severity::Info,
                    title: "Deployer wallet is very new",
                    description: format!(
                        "Deployer {}... is only {age_days} days old. Fresh wallets \
                        deploying contracts can be a scam signal.",
                        &deployer[..deployer.len().min(10)]
                    ),
                    points: 5,
                    offset: None,
                });
            }
        }

        if let Some(tx_count) = self.get_tx_count(&deployer, api_key).await {
            if tx_count < LOW_TX_COUNT {
                findings.push(Finding {
                    detector: "deployer_reputation".to_string(),
                    severity: Severity::Info,
                    title: "Deployer wallet has very few transactions",
                    description: format!(
                        "Deployer {}... has only {tx_count} transactions. Low-activity \
                        wallets deploying contracts can indicate disposable scam wallets.",
                        &deployer[..deployer.len().min(10)]
                    ),
                    points: 5,
                    offset: None,
                });
            }
        }

        findings
    }
}

impl Default for ReputationClient {
    fn default() -> Self {
        Self::new()
    }
}
