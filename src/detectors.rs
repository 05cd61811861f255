//! Pattern detectors: each takes a disassembled instruction stream and
//! returns zero or more `Finding`s. `run_all` executes them in a fixed
//! order so report output is stable across runs.

use std::collections::HashSet;

use crate::disassembler::Instruction;
use crate::selectors::{self, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub detector: String,
    pub severity: Severity,
    pub title: &'static str,
    pub description: String,
    pub points: u32,
    pub offset: Option<usize>,
}

/// keccak256("eip1967.proxy.implementation") - 1
pub(crate) const EIP_1967_IMPL_SLOT: [u8; 32] = hex_slot("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");
/// keccak256("eip1967.proxy.admin") - 1
const EIP_1967_ADMIN_SLOT: [u8; 32] = hex_slot("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");
/// keccak256("PROXIABLE")
pub(crate) const EIP_1822_SLOT: [u8; 32] = hex_slot("c5f16f0fcc639fa48a6947836d9850f504798523bf8c9a3a87d5876cf622bcf7");
/// keccak256("org.zeppelinos.proxy.implementation")
pub(crate) const OZ_IMPL_SLOT: [u8; 32] = hex_slot("7050c9e0f4ca769c69bd3a8ef740bc37934f8e2c036e5a723fd8ee048ed3f8c3");
/// keccak256("org.zeppelinos.proxy.admin")
const OZ_ADMIN_SLOT: [u8; 32] = hex_slot("10d6a54a4754c8869d6886b5f5d7fbfa5b4522237ea5c60d11bc4e7a1ff9390b");

const PROXY_SLOTS: [[u8; 32]; 5] = [
    EIP_1967_IMPL_SLOT,
    EIP_1967_ADMIN_SLOT,
    EIP_1822_SLOT,
    OZ_IMPL_SLOT,
    OZ_ADMIN_SLOT,
];

/// Parse a 64-hex-digit literal into a 32-byte array at compile time.
const fn hex_slot(s: &str) -> [u8; 32] {
    let bytes = s.as_bytes();
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        out[i] = hex_val(bytes[i * 2]) * 16 + hex_val(bytes[i * 2 + 1]);
        i += 1;
    }
    out
}

const fn hex_val(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit in slot constant"),
    }
}

/// Whether any `PUSH32` operand in the stream matches a known proxy
/// storage slot (EIP-1967, EIP-1822, or legacy OpenZeppelin).
pub fn has_proxy_slots(instructions: &[Instruction]) -> bool {
    instructions.iter().any(|instr| {
        instr.mnemonic == "PUSH32"
            && instr.operand.len() == 32
            && PROXY_SLOTS.iter().any(|slot| slot.as_slice() == instr.operand.as_slice())
    })
}

/// SELFDESTRUCT (0xFF). Critical: can destroy the contract and drain funds.
pub fn detect_selfdestruct(instructions: &[Instruction]) -> Vec<Finding> {
    for instr in instructions {
        if instr.opcode == 0xFF {
            return vec![Finding {
                detector: "selfdestruct".to_string(),
                severity: Severity::Critical,
                title: "SELFDESTRUCT opcode found",
                description: "Contract contains SELFDESTRUCT which allows the owner \
                    to destroy the contract and drain all funds."
                    .to_string(),
                points: 30,
                offset: Some(instr.offset),
            }];
        }
    }
    Vec::new()
}

/// DELEGATECALL (0xF4). Severity is downgraded to informational when
/// recognized proxy storage slots are also present.
pub fn detect_delegatecall(instructions: &[Instruction]) -> Vec<Finding> {
    let is_proxy = has_proxy_slots(instructions);
    for instr in instructions {
        if instr.opcode == 0xF4 {
            return if is_proxy {
                vec![Finding {
                    detector: "delegatecall".to_string(),
                    severity: Severity::Info,
                    title: "DELEGATECALL in proxy pattern",
                    description: "Contract uses DELEGATECALL with standard proxy storage \
                        slots (EIP-1967/1822). This is expected proxy behavior."
                        .to_string(),
                    points: 10,
                    offset: Some(instr.offset),
                }]
            } else {
                vec![Finding {
                    detector: "delegatecall".to_string(),
                    severity: Severity::High,
                    title: "Raw DELEGATECALL without proxy pattern",
                    description: "Contract uses DELEGATECALL without recognized proxy \
                        storage slots. This could allow arbitrary code execution."
                        .to_string(),
                    points: 15,
                    offset: Some(instr.offset),
                }]
            };
        }
    }
    Vec::new()
}

/// CALL (0xF1) followed by SSTORE (0x55) within a 20-instruction lookahead
/// window, a classic checks-effects-interactions violation shape.
pub fn detect_reentrancy_risk(instructions: &[Instruction]) -> Vec<Finding> {
    for (i, instr) in instructions.iter().enumerate() {
        if instr.opcode == 0xF1 {
            let window_end = (i + 21).min(instructions.len());
            for later in &instructions[i + 1..window_end] {
                if later.opcode == 0x55 {
                    return vec![Finding {
                        detector: "reentrancy".to_string(),
                        severity: Severity::Medium,
                        title: "Potential reentrancy: CALL before SSTORE",
                        description: format!(
                            "External CALL at offset {} is followed by SSTORE at offset {}. \
                            State changes after external calls can enable reentrancy attacks.",
                            instr.offset, later.offset
                        ),
                        points: 10,
                        offset: Some(instr.offset),
                    }];
                }
            }
        }
    }
    Vec::new()
}

/// Recognized proxy storage slots anywhere in the bytecode.
pub fn detect_proxy_patterns(instructions: &[Instruction]) -> Vec<Finding> {
    if has_proxy_slots(instructions) {
        vec![Finding {
            detector: "proxy".to_string(),
            severity: Severity::Info,
            title: "Proxy contract detected",
            description: "Contract uses standard proxy storage slots (EIP-1967 or \
                EIP-1822). The implementation contract should also be analyzed."
                .to_string(),
            points: 10,
            offset: None,
        }]
    } else {
        Vec::new()
    }
}

/// Comparison → JUMPI → REVERT within a short lookahead window, only
/// considered when `transfer`/`transferFrom` selectors are present.
pub fn detect_honeypot_patterns(instructions: &[Instruction]) -> Vec<Finding> {
    let found = selectors::extract_selectors(instructions);
    let transfer_sels: HashSet<Selector> =
        [selectors::TRANSFER_SELECTOR, selectors::TRANSFER_FROM_SELECTOR]
            .into_iter()
            .collect();
    if found.is_disjoint(&transfer_sels) {
        return Vec::new();
    }

    const COMPARISON_OPS: [u8; 5] = [0x10, 0x11, 0x12, 0x13, 0x14]; // LT GT SLT SGT EQ
    for (i, instr) in instructions.iter().enumerate() {
        if COMPARISON_OPS.contains(&instr.opcode) && i + 2 < instructions.len() {
            if instructions[i + 1].opcode == 0x57 {
                let window_end = (i + 6).min(instructions.len());
                for later in &instructions[i + 2..window_end] {
                    if later.opcode == 0xFD {
                        return vec![Finding {
                            detector: "honeypot".to_string(),
                            severity: Severity::High,
                            title: "Potential honeypot: conditional REVERT in transfer path",
                            description: "Contract has transfer functions with conditional \
                                REVERT patterns that could selectively block token transfers \
                                for certain addresses."
                                .to_string(),
                            points: 25,
                            offset: Some(instr.offset),
                        }];
                    }
                }
            }
        }
    }
    Vec::new()
}

/// Malicious selectors whose signature mentions `mint`.
pub fn detect_hidden_mint(instructions: &[Instruction]) -> Vec<Finding> {
    let found = selectors::extract_selectors(instructions);
    let malicious = selectors::find_malicious(&found);
    let mint_sigs: Vec<&str> = malicious
        .iter()
        .filter(|(_, sig)| sig.to_lowercase().contains("mint"))
        .map(|(_, sig)| *sig)
        .collect();

    if mint_sigs.is_empty() {
        return Vec::new();
    }
    vec![Finding {
        detector: "hidden_mint".to_string(),
        severity: Severity::Critical,
        title: "Hidden mint capability detected",
        description: format!(
            "Contract contains mint function selectors ({}) that could allow unlimited token minting.",
            mint_sigs.join(", ")
        ),
        points: 25,
        offset: None,
    }]
}

/// Malicious selectors whose signature mentions fee/tax/limit controls.
pub fn detect_fee_manipulation(instructions: &[Instruction]) -> Vec<Finding> {
    let found = selectors::extract_selectors(instructions);
    let malicious = selectors::find_malicious(&found);
    const TERMS: [&str; 4] = ["fee", "tax", "maxtx", "maxwallet"];
    let fee_sigs: Vec<&str> = malicious
        .iter()
        .filter(|(_, sig)| {
            let lower = sig.to_lowercase();
            TERMS.iter().any(|term| lower.contains(term))
        })
        .map(|(_, sig)| *sig)
        .collect();

    if fee_sigs.is_empty() {
        return Vec::new();
    }
    vec![Finding {
        detector: "fee_manipulation".to_string(),
        severity: Severity::High,
        title: "Fee/limit manipulation functions detected",
        description: format!(
            "Contract contains functions ({}) that allow the owner to change fees, taxes, or transaction limits.",
            fee_sigs.join(", ")
        ),
        points: 15,
        offset: None,
    }]
}

/// Run all seven detectors in a fixed order and concatenate their findings.
pub fn run_all(instructions: &[Instruction]) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(detect_selfdestruct(instructions));
    findings.extend(detect_delegatecall(instructions));
    findings.extend(detect_reentrancy_risk(instructions));
    findings.extend(detect_proxy_patterns(instructions));
    findings.extend(detect_honeypot_patterns(instructions));
    findings.extend(detect_hidden_mint(instructions));
    findings.extend(detect_fee_manipulation(instructions));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disassembler::disassemble_bytes;

    fn push32(slot: [u8; 32]) -> Vec<u8> {
        let mut v = vec![0x7F]; // PUSH32
        v.extend_from_slice(&slot);
        v
    }

    #[test]
    fn selfdestruct_detected_once() {
        let raw = vec![0x00, 0xFF, 0xFF];
        let instrs = disassemble_bytes(&raw);
        let findings = detect_selfdestruct(&instrs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].offset, Some(1));
    }

    #[test]
    fn delegatecall_without_proxy_is_high() {
        let raw = vec![0xF4];
        let instrs = disassemble_bytes(&raw);
        let findings = detect_delegatecall(&instrs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn delegatecall_with_proxy_slot_is_info() {
        let mut raw = push32(EIP_1967_IMPL_SLOT);
        raw.push(0xF4);
        let instrs = disassemble_bytes(&raw);
        let findings = detect_delegatecall(&instrs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn reentrancy_requires_call_then_sstore_within_window() {
        let mut raw = vec![0xF1]; // CALL
        raw.extend(std::iter::repeat(0x01).take(5)); // filler ADDs
        raw.push(0x55); // SSTORE
        let instrs = disassemble_bytes(&raw);
        let findings = detect_reentrancy_risk(&instrs);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn reentrancy_absent_when_sstore_out_of_window() {
        let mut raw = vec![0xF1];
        raw.extend(std::iter::repeat(0x01).take(25));
        raw.push(0x55);
        let instrs = disassemble_bytes(&raw);
        assert!(detect_reentrancy_risk(&instrs).is_empty());
    }

    #[test]
    fn proxy_patterns_detected_from_push32() {
        let raw = push32(OZ_ADMIN_SLOT);
        let instrs = disassemble_bytes(&raw);
        assert_eq!(detect_proxy_patterns(&instrs).len(), 1);
    }

    #[test]
    fn proxy_patterns_absent_without_slot() {
        let raw = push32([0u8; 32]);
        let instrs = disassemble_bytes(&raw);
        assert!(detect_proxy_patterns(&instrs).is_empty());
    }

    #[test]
    fn honeypot_requires_transfer_selector_present() {
        // EQ, JUMPI, POP, POP, REVERT with no transfer selector anywhere
        let raw = vec![0x14, 0x57, 0x50, 0x50, 0xFD];
        let instrs = disassemble_bytes(&raw);
        assert!(detect_honeypot_patterns(&instrs).is_empty());
    }

    #[test]
    fn honeypot_detected_with_transfer_selector_and_pattern() {
        let mut raw = vec![0x63, 0xa9, 0x05, 0x9c, 0xbb]; // PUSH4 transfer(address,uint256)
        raw.extend([0x14, 0x57, 0x50, 0x50, 0xFD]); // EQ JUMPI POP POP REVERT
        let instrs = disassemble_bytes(&raw);
        let findings = detect_honeypot_patterns(&instrs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn hidden_mint_detected() {
        let raw = vec![0x63, 0x40, 0xc1, 0x0f, 0x19]; // PUSH4 mint(address,uint256)
        let instrs = disassemble_bytes(&raw);
        let findings = detect_hidden_mint(&instrs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn fee_manipulation_detected() {
        let raw = vec![0x63, 0x69, 0xfe, 0x0e, 0x2d]; // PUSH4 setFee(uint256)
        let instrs = disassemble_bytes(&raw);
        let findings = detect_fee_manipulation(&instrs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn run_all_preserves_detector_order() {
        let mut raw = push32(EIP_1967_IMPL_SLOT);
        raw.push(0xFF); // SELFDESTRUCT
        raw.push(0xF4); // DELEGATECALL (proxy present -> info)
        let instrs = disassemble_bytes(&raw);
        let findings = run_all(&instrs);
        let detectors: Vec<&str> = findings.iter().map(|f| f.detector.as_str()).collect();
        assert_eq!(detectors, vec!["selfdestruct", "delegatecall", "proxy"]);
    }
}
