//! Weighted composite risk scoring: findings → 0-100 score + risk level.

use std::collections::BTreeMap;

use crate::detectors::Finding;
use crate::disassembler::{self, Instruction};
use crate::selectors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: u32,
    pub level: RiskLevel,
    pub category_scores: BTreeMap<String, u32>,
}

/// Per-category point caps. Categories absent here fall back to a cap of 100.
pub fn category_cap(category: &str) -> u32 {
    match category {
        "selfdestruct" => 30,
        "hidden_mint" => 25,
        "honeypot" => 25,
        "fee_manipulation" => 15,
        "delegatecall" => 15,
        "proxy" => 10,
        "reentrancy" => 10,
        "suspicious_selector" => 15,
        "tiny_bytecode" => 10,
        "deployer_reputation" => 10,
        _ => 100,
    }
}

pub const SUSPICIOUS_SELECTOR_POINTS: u32 = 5;

/// Accumulate finding points per category, capped, then add the
/// suspicious-selector and tiny-bytecode heuristics before saturating at 100.
pub fn compute_score(
    findings: &[Finding],
    instructions: &[Instruction],
    bytecode_hex: &str,
) -> ScoreResult {
    let mut category_points: BTreeMap<String, u32> = BTreeMap::new();

    for finding in findings {
        let cap = category_cap(&finding.detector);
        let entry = category_points.entry(finding.detector.clone()).or_insert(0);
        *entry = cap.min(*entry + finding.points);
    }

    let found = selectors::extract_selectors(instructions);
    let suspicious = selectors::find_suspicious(&found);
    if !suspicious.is_empty() {
        let points = (suspicious.len() as u32 * SUSPICIOUS_SELECTOR_POINTS)
            .min(category_cap("suspicious_selector"));
        category_points.insert("suspicious_selector".to_string(), points);
    }

    let bytecode_len = disassembler::bytecode_size(bytecode_hex);
    let is_proxy = category_points.contains_key("proxy");
    if bytecode_len > 0 && bytecode_len < 200 && !is_proxy {
        category_points.insert("tiny_bytecode".to_string(), category_cap("tiny_bytecode"));
    }

    let total: u32 = category_points.values().sum::<u32>().min(100);
    let level = score_to_level(total);

    ScoreResult {
        score: total,
        level,
        category_scores: category_points,
    }
}

pub fn score_to_level(score: u32) -> RiskLevel {
    if score <= 15 {
        RiskLevel::Safe
    } else if score <= 35 {
        RiskLevel::Low
    } else if score <= 55 {
        RiskLevel::Medium
    } else if score <= 75 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::Severity;

    fn finding(detector: &'static str, points: u32) -> Finding {
        Finding {
            detector: detector.to_string(),
            severity: Severity::Info,
            title: "t",
            description: String::new(),
            points,
            offset: None,
        }
    }

    #[test]
    fn empty_findings_score_zero_safe() {
        let result = compute_score(&[], &[], "0x");
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Safe);
    }

    #[test]
    fn selfdestruct_alone_scores_thirty_low() {
        let result = compute_score(&[finding("selfdestruct", 30)], &[], "0xff");
        assert_eq!(result.score, 30);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn category_cap_enforced_across_repeated_findings() {
        let findings = vec![finding("selfdestruct", 30), finding("selfdestruct", 30)];
        let result = compute_score(&findings, &[], "0xff");
        assert_eq!(result.category_scores["selfdestruct"], 30);
    }

    #[test]
    fn score_saturates_at_hundred() {
        let findings = vec![
            finding("selfdestruct", 30),
            finding("hidden_mint", 25),
            finding("honeypot", 25),
            finding("fee_manipulation", 15),
            finding("delegatecall", 15),
        ];
        let result = compute_score(&findings, &[], "0xff");
        assert_eq!(result.score, 100);
        assert_eq!(result.level, RiskLevel::Critical);
    }

    #[test]
    fn tiny_bytecode_heuristic_applies_below_200_bytes() {
        let tiny_hex = format!("0x{}", "00".repeat(50));
        let result = compute_score(&[], &[], &tiny_hex);
        assert_eq!(result.category_scores.get("tiny_bytecode"), Some(&10));
    }

    #[test]
    fn tiny_bytecode_heuristic_skipped_when_proxy_present() {
        let tiny_hex = format!("0x{}", "00".repeat(50));
        let result = compute_score(&[finding("proxy", 10)], &[], &tiny_hex);
        assert!(!result.category_scores.contains_key("tiny_bytecode"));
    }

    #[test]
    fn tiny_bytecode_heuristic_skipped_for_empty_bytecode() {
        let result = compute_score(&[], &[], "0x");
        assert!(!result.category_scores.contains_key("tiny_bytecode"));
    }

    #[test]
    fn level_boundaries_match_piecewise_map() {
        assert_eq!(score_to_level(15), RiskLevel::Safe);
        assert_eq!(score_to_level(16), RiskLevel::Low);
        assert_eq!(score_to_level(35), RiskLevel::Low);
        assert_eq!(score_to_level(36), RiskLevel::Medium);
        assert_eq!(score_to_level(55), RiskLevel::Medium);
        assert_eq!(score_to_level(56), RiskLevel::High);
        assert_eq!(score_to_level(75), RiskLevel::High);
        assert_eq!(score_to_level(76), RiskLevel::Critical);
    }

    #[test]
    fn suspicious_selectors_capped_at_three() {
        let raw: Vec<u8> = [
            [0x63u8, 0x71, 0x50, 0x18, 0xa6].as_slice(), // renounceOwnership
            &[0x63, 0xf2, 0xfd, 0xe3, 0x8b],             // transferOwnership
            &[0x63, 0x3c, 0xcf, 0xd6, 0x0b],             // withdraw
            &[0x63, 0xa2, 0x2c, 0xb4, 0x65],             // setApprovalForAll
        ]
        .concat();
        let instrs = disassembler::disassemble_bytes(&raw);
        let result = compute_score(&[], &instrs, "0x00");
        assert_eq!(result.category_scores["suspicious_selector"], 15);
    }
}
