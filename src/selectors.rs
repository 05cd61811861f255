//! Function selector extraction and the malicious/suspicious/standard
//! selector databases.
//!
//! Selector values are the first 4 bytes of `keccak256(signature)`; all
//! values here are hardcoded reference constants, not recomputed.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::disassembler::Instruction;

/// 4-byte function selector.
pub type Selector = [u8; 4];

/// Selectors that are a strong standalone negative signal.
pub static MALICIOUS_SELECTORS: LazyLock<HashMap<Selector, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (sel(0x40, 0xc1, 0x0f, 0x19), "mint(address,uint256)"),
        (sel(0xa0, 0x71, 0x2d, 0x68), "mint(uint256)"),
        (sel(0x44, 0x33, 0x7e, 0xa1), "blacklist(address)"),
        (sel(0x44, 0xd7, 0x5f, 0xa5), "addToBlacklist(address)"),
        (sel(0x69, 0xfe, 0x0e, 0x2d), "setFee(uint256)"),
        (sel(0xc0, 0xb0, 0xfd, 0xa2), "setTaxFee(uint256)"),
        (sel(0xec, 0x28, 0x43, 0x8a), "setMaxTxAmount(uint256)"),
        (sel(0xb6, 0xc5, 0x23, 0x24), "setMaxWalletSize(uint256)"),
        (sel(0x84, 0x56, 0xcb, 0x59), "pause()"),
    ])
});

/// Selectors that are risky but context-dependent.
pub static SUSPICIOUS_SELECTORS: LazyLock<HashMap<Selector, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (sel(0xa2, 0x2c, 0xb4, 0x65), "setApprovalForAll(address,bool)"),
        (sel(0x71, 0x50, 0x18, 0xa6), "renounceOwnership()"),
        (sel(0xf2, 0xfd, 0xe3, 0x8b), "transferOwnership(address)"),
        (sel(0x3c, 0xcf, 0xd6, 0x0b), "withdraw()"),
        (sel(0xe0, 0x1a, 0xf9, 0x2c), "setSwapEnabled(bool)"),
        (sel(0x43, 0x78, 0x23, 0xec), "excludeFromFee(address)"),
    ])
});

/// Standard ERC-20 selectors, kept for documentation and false-positive
/// reasoning, not consulted by any detector.
pub static ERC20_SELECTORS: LazyLock<HashMap<Selector, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (sel(0x18, 0x16, 0x0d, 0xdd), "totalSupply()"),
        (sel(0x70, 0xa0, 0x82, 0x31), "balanceOf(address)"),
        (sel(0xa9, 0x05, 0x9c, 0xbb), "transfer(address,uint256)"),
        (sel(0xdd, 0x62, 0xed, 0x3e), "allowance(address,address)"),
        (sel(0x09, 0x5e, 0xa7, 0xb3), "approve(address,uint256)"),
        (sel(0x23, 0xb8, 0x72, 0xdd), "transferFrom(address,address,uint256)"),
    ])
});

pub const TRANSFER_SELECTOR: Selector = sel(0xa9, 0x05, 0x9c, 0xbb);
pub const TRANSFER_FROM_SELECTOR: Selector = sel(0x23, 0xb8, 0x72, 0xdd);

const fn sel(a: u8, b: u8, c: u8, d: u8) -> Selector {
    [a, b, c, d]
}

/// Collect every distinct 4-byte `PUSH4` operand from the instruction
/// stream. Truncated `PUSH4`s (operand shorter than 4 bytes) are skipped.
pub fn extract_selectors(instructions: &[Instruction]) -> HashSet<Selector> {
    let mut selectors = HashSet::new();
    for instr in instructions {
        if instr.mnemonic == "PUSH4" && instr.operand.len() == 4 {
            let mut s = [0u8; 4];
            s.copy_from_slice(&instr.operand);
            selectors.insert(s);
        }
    }
    selectors
}

/// Selectors from `set` that are present in the malicious table, with
/// their human-readable signatures.
pub fn find_malicious(set: &HashSet<Selector>) -> Vec<(Selector, &'static str)> {
    set.iter()
        .filter_map(|s| MALICIOUS_SELECTORS.get(s).map(|sig| (*s, *sig)))
        .collect()
}

/// Selectors from `set` that are present in the suspicious table, with
/// their human-readable signatures.
pub fn find_suspicious(set: &HashSet<Selector>) -> Vec<(Selector, &'static str)> {
    set.iter()
        .filter_map(|s| SUSPICIOUS_SELECTORS.get(s).map(|sig| (*s, *sig)))
        .collect()
}
