//! Orchestrates the full pipeline: fetch → disassemble → detect → score,
//! with a one-hop proxy branch and a whole-result cache.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::cache::{SharedCache, MIN_CAPACITY};
use crate::detectors::{self, Finding};
use crate::disassembler::{self, Instruction};
use crate::error::EngineError;
use crate::reputation::ReputationClient;
use crate::rpc::RpcClient;
use crate::scoring::{self, RiskLevel, ScoreResult};

/// Storage slots tried in priority order when resolving a proxy's
/// implementation address. Admin slots are deliberately excluded because they
/// identify the upgrade authority, not the logic contract.
const IMPL_SLOTS: [(&str, [u8; 32]); 3] = [
    ("EIP-1967", detectors_slot(0)),
    ("EIP-1822", detectors_slot(1)),
    ("OpenZeppelin", detectors_slot(2)),
];

/// Re-export the three implementation slots from `detectors` by index,
/// keeping the single source of truth for the byte constants there.
const fn detectors_slot(index: usize) -> [u8; 32] {
    match index {
        0 => crate::detectors::EIP_1967_IMPL_SLOT,
        1 => crate::detectors::EIP_1822_SLOT,
        2 => crate::detectors::OZ_IMPL_SLOT,
        _ => panic!("invalid slot index"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationResult {
    pub address: String,
    pub bytecode_size: usize,
    pub findings: Vec<Finding>,
    pub category_scores: std::collections::BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub address: String,
    pub score: u32,
    pub level: RiskLevel,
    pub findings: Vec<Finding>,
    pub category_scores: std::collections::BTreeMap<String, u32>,
    pub bytecode_size: usize,
    pub implementation: Option<ImplementationResult>,
}

#[derive(Clone)]
pub struct Engine {
    rpc: RpcClient,
    reputation: ReputationClient,
    analysis_cache: SharedCache<(String, String, String), AnalysisResult>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rpc: RpcClient::with_capacity(capacity),
            reputation: ReputationClient::with_capacity(capacity),
            analysis_cache: SharedCache::new(capacity),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_clients(rpc: RpcClient, reputation: ReputationClient) -> Self {
        Self {
            rpc,
            reputation,
            analysis_cache: SharedCache::new(MIN_CAPACITY),
        }
    }

    pub async fn clear_all_caches(&self) {
        self.rpc.clear_caches().await;
        self.reputation.clear_caches().await;
        self.analysis_cache.clear().await;
    }

    /// Full analysis pipeline. Fails only if the primary bytecode fetch or
    /// its disassembly fails; every other I/O failure narrows the result
    /// instead.
    pub async fn analyze(
        &self,
        address: &str,
        rpc_url: &str,
        explorer_key: &str,
    ) -> Result<AnalysisResult, EngineError> {
        let address = address.to_lowercase();
        let cache_key = (address.clone(), rpc_url.to_string(), explorer_key.to_string());
        if let Some(cached) = self.analysis_cache.get(&cache_key).await {
            return Ok(cached);
        }

        let bytecode_hex = self.rpc.get_code(&address, rpc_url).await?;
        let bytecode_size = disassembler::bytecode_size(&bytecode_hex);
        let instructions = disassembler::disassemble(&bytecode_hex)?;

        let mut findings = detectors::run_all(&instructions);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        findings.extend(self.reputation.detect(&address, explorer_key, now).await);

        let score_result: ScoreResult = scoring::compute_score(&findings, &instructions, &bytecode_hex);

        let is_proxy = findings.iter().any(|f| f.detector == "proxy");
        let mut implementation = None;
        if is_proxy {
            if let Some(impl_address) = self.resolve_implementation(&address, rpc_url).await {
                implementation = self.analyze_implementation(&impl_address, rpc_url).await;
            }
        }

        let mut final_score = score_result.score;
        let mut final_category_scores = score_result.category_scores.clone();
        let mut final_findings = findings;

        if let Some(impl_result) = &implementation {
            let impl_total: u32 = impl_result.category_scores.values().sum();
            final_score = (final_score + impl_total).min(100);
            for (cat, points) in &impl_result.category_scores {
                final_category_scores.insert(format!("impl_{cat}"), *points);
            }
            final_findings.extend(impl_result.findings.clone());
        }

        let final_level = scoring::score_to_level(final_score);

        let result = AnalysisResult {
            address,
            score: final_score,
            level: final_level,
            findings: final_findings,
            category_scores: final_category_scores,
            bytecode_size,
            implementation,
        };

        self.analysis_cache.put(cache_key, result.clone()).await;
        Ok(result)
    }

    /// Analyze raw bytecode directly, with no RPC fetch and no proxy
    /// resolution (there is no `rpc_url` to resolve an implementation
    /// through). Used by the CLI's `--bytecode` flag for offline analysis.
    pub fn analyze_bytecode(&self, bytecode_hex: &str) -> Result<AnalysisResult, EngineError> {
        let bytecode_size = disassembler::bytecode_size(bytecode_hex);
        let instructions = disassembler::disassemble(bytecode_hex)?;

        let findings = detectors::run_all(&instructions);
        let score_result = scoring::compute_score(&findings, &instructions, bytecode_hex);
        let level = scoring::score_to_level(score_result.score);

        Ok(AnalysisResult {
            address: String::new(),
            score: score_result.score,
            level,
            findings,
            category_scores: score_result.category_scores,
            bytecode_size,
            implementation: None,
        })
    }

    /// Try each known proxy slot, in priority order, and return the first
    /// non-zero resolved implementation address.
    async fn resolve_implementation(&self, address: &str, rpc_url: &str) -> Option<String> {
        for (slot_name, slot_bytes) in IMPL_SLOTS {
            let slot_hex = format!("0x{}", hex::encode(slot_bytes));
            let raw = match self.rpc.get_storage_at(address, &slot_hex, rpc_url).await {
                Ok(raw) => raw,
                Err(_) => {
                    debug!(slot = slot_name, address, "failed to read proxy slot");
                    continue;
                }
            };

            let value = raw.trim_start_matches("0x");
            if value.is_empty() || value.chars().all(|c| c == '0') {
                continue;
            }

            let addr_hex = if value.len() >= 40 {
                &value[value.len() - 40..]
            } else {
                value
            };
            if addr_hex.chars().all(|c| c == '0') {
                continue;
            }

            return Some(format!("0x{addr_hex}"));
        }
        None
    }

    /// Fetch and analyze the implementation behind a resolved proxy slot.
    /// Returns `None` if the fetch fails or the code is empty.
    async fn analyze_implementation(
        &self,
        impl_address: &str,
        rpc_url: &str,
    ) -> Option<ImplementationResult> {
        let bytecode_hex = self.rpc.get_code(impl_address, rpc_url).await.ok()?;
        let bytecode_size = disassembler::bytecode_size(&bytecode_hex);
        if bytecode_size == 0 {
            return None;
        }

        let instructions: Vec<Instruction> = disassembler::disassemble(&bytecode_hex).ok()?;
        let findings: Vec<Finding> = detectors::run_all(&instructions)
            .into_iter()
            .filter(|f| f.detector != "proxy")
            .collect();

        let mut category_scores = std::collections::BTreeMap::new();
        for finding in &findings {
            let cap = scoring::category_cap(&finding.detector);
            let entry = category_scores.entry(finding.detector.clone()).or_insert(0u32);
            *entry = cap.min(*entry + finding.points);
        }

        let prefixed_findings = findings
            .into_iter()
            .map(|f| Finding {
                detector: format!("impl_{}", f.detector),
                ..f
            })
            .collect();

        Some(ImplementationResult {
            address: impl_address.to_string(),
            bytecode_size,
            findings: prefixed_findings,
            category_scores,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(server: &MockServer) -> Engine {
        Engine::with_clients(RpcClient::new(), ReputationClient::with_api_base(server.uri()))
    }

    async fn mock_get_code(server: &MockServer, result_hex: &str) {
        Mock::given(method("POST"))
            .and(body_string_contains("eth_getCode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": result_hex,
            })))
            .mount(server)
            .await;
    }

    async fn mock_get_storage_at_zero(server: &MockServer) {
        Mock::given(method("POST"))
            .and(body_string_contains("eth_getStorageAt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": format!("0x{}", "0".repeat(64)),
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn clean_padded_contract_scores_zero_safe() {
        let server = MockServer::start().await;
        let padded = format!("0x6080604052{}", "00".repeat(200));
        mock_get_code(&server, &padded).await;

        let engine = engine_for(&server);
        let result = engine.analyze("0xabc", &server.uri(), "").await.unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Safe);
        assert!(result.findings.is_empty());
        assert_eq!(result.bytecode_size, 205);
    }

    #[tokio::test]
    async fn selfdestruct_first_byte_scores_thirty_low() {
        let server = MockServer::start().await;
        let bytecode = format!("0xff{}", "00".repeat(200));
        mock_get_code(&server, &bytecode).await;

        let engine = engine_for(&server);
        let result = engine.analyze("0xabc", &server.uri(), "").await.unwrap();
        assert_eq!(result.score, 30);
        assert_eq!(result.level, RiskLevel::Low);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].detector, "selfdestruct");
        assert_eq!(result.category_scores.get("selfdestruct"), Some(&30));
    }

    #[tokio::test]
    async fn eip1967_proxy_without_resolved_implementation() {
        let server = MockServer::start().await;
        let bytecode = format!(
            "0x7f360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbcf4{}",
            "00".repeat(200)
        );
        mock_get_code(&server, &bytecode).await;
        mock_get_storage_at_zero(&server).await;

        let engine = engine_for(&server);
        let result = engine.analyze("0xabc", &server.uri(), "").await.unwrap();
        assert_eq!(result.score, 20);
        assert_eq!(result.level, RiskLevel::Low);
        assert!(result.implementation.is_none());
        let detectors: Vec<&str> = result.findings.iter().map(|f| f.detector.as_str()).collect();
        assert!(detectors.contains(&"proxy"));
        assert!(detectors.contains(&"delegatecall"));
    }

    #[tokio::test]
    async fn proxy_with_risky_implementation_merges_scores() {
        let server = MockServer::start().await;
        let impl_addr = "0x1111111111111111111111111111111111111111";
        let proxy_bytecode = format!(
            "0x7f360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbcf4{}",
            "00".repeat(200)
        );
        let impl_bytecode = format!("0xff{}", "00".repeat(200));

        Mock::given(method("POST"))
            .and(body_string_contains("eth_getCode"))
            .and(body_string_contains("0xabc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": proxy_bytecode,
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("eth_getCode"))
            .and(body_string_contains(impl_addr))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": impl_bytecode,
            })))
            .mount(&server)
            .await;
        let word = format!("0x{}{}", "0".repeat(24), &impl_addr[2..]);
        Mock::given(method("POST"))
            .and(body_string_contains("eth_getStorageAt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": word,
            })))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let result = engine.analyze("0xabc", &server.uri(), "").await.unwrap();

        assert_eq!(result.score, 50);
        assert_eq!(result.level, RiskLevel::Medium);
        let impl_result = result.implementation.expect("implementation resolved");
        assert_eq!(impl_result.address, impl_addr);
        assert_eq!(result.category_scores.get("proxy"), Some(&10));
        assert_eq!(result.category_scores.get("delegatecall"), Some(&10));
        assert_eq!(result.category_scores.get("impl_selfdestruct"), Some(&30));
        let detectors: Vec<&str> = result.findings.iter().map(|f| f.detector.as_str()).collect();
        assert!(detectors.contains(&"impl_selfdestruct"));
        assert!(!detectors.contains(&"impl_proxy"));
    }

    #[tokio::test]
    async fn eoa_scores_zero_with_no_findings() {
        let server = MockServer::start().await;
        mock_get_code(&server, "0x").await;

        let engine = engine_for(&server);
        let result = engine.analyze("0xabc", &server.uri(), "").await.unwrap();
        assert_eq!(result.bytecode_size, 0);
        assert!(result.findings.is_empty());
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Safe);
        assert!(result.implementation.is_none());
    }

    #[tokio::test]
    async fn analysis_cache_hits_skip_a_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("eth_getCode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x00",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let first = engine.analyze("0xabc", &server.uri(), "").await.unwrap();
        let second = engine.analyze("0xABC", &server.uri(), "").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_bytecode_hex_is_a_fatal_parse_error() {
        let server = MockServer::start().await;
        // Odd hex-digit count: not a valid byte string.
        mock_get_code(&server, "0xabc").await;

        let engine = engine_for(&server);
        let err = engine
            .analyze("0xabc", &server.uri(), "")
            .await
            .expect_err("malformed hex must propagate, not score as empty");
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn analyze_bytecode_surfaces_malformed_hex_too() {
        let engine = Engine::new();
        let err = engine
            .analyze_bytecode("0xabc")
            .expect_err("malformed hex must propagate");
        assert!(matches!(err, EngineError::Parse(_)));
    }
}
