//! Static EVM opcode table: byte value → (mnemonic, operand size in bytes).
//!
//! Operand size is non-zero only for `PUSH1..PUSH32`; every other opcode
//! reads zero bytes of immediate data from the instruction stream.

/// Look up the mnemonic and operand size for a raw opcode byte.
///
/// Unknown bytes resolve to `("UNKNOWN_XX", 0)` rather than failing;
/// the disassembler must remain total over all 256 byte values.
pub fn lookup(opcode: u8) -> (String, usize) {
    match named(opcode) {
        Some((name, size)) => (name.to_string(), size),
        None => (format!("UNKNOWN_{opcode:02X}"), 0),
    }
}

/// Operand size for `PUSHn`, 0 otherwise. Exposed separately from `lookup`
/// for callers that only care about advancing the instruction pointer.
pub fn operand_size(opcode: u8) -> usize {
    named(opcode).map(|(_, size)| size).unwrap_or(0)
}

fn named(opcode: u8) -> Option<(&'static str, usize)> {
    Some(match opcode {
        // Stop & arithmetic
        0x00 => ("STOP", 0),
        0x01 => ("ADD", 0),
        0x02 => ("MUL", 0),
        0x03 => ("SUB", 0),
        0x04 => ("DIV", 0),
        0x05 => ("SDIV", 0),
        0x06 => ("MOD", 0),
        0x07 => ("SMOD", 0),
        0x08 => ("ADDMOD", 0),
        0x09 => ("MULMOD", 0),
        0x0A => ("EXP", 0),
        0x0B => ("SIGNEXTEND", 0),

        // Comparison & bitwise
        0x10 => ("LT", 0),
        0x11 => ("GT", 0),
        0x12 => ("SLT", 0),
        0x13 => ("SGT", 0),
        0x14 => ("EQ", 0),
        0x15 => ("ISZERO", 0),
        0x16 => ("AND", 0),
        0x17 => ("OR", 0),
        0x18 => ("XOR", 0),
        0x19 => ("NOT", 0),
        0x1A => ("BYTE", 0),
        0x1B => ("SHL", 0),
        0x1C => ("SHR", 0),
        0x1D => ("SAR", 0),

        // SHA3
        0x20 => ("SHA3", 0),

        // Environmental
        0x30 => ("ADDRESS", 0),
        0x31 => ("BALANCE", 0),
        0x32 => ("ORIGIN", 0),
        0x33 => ("CALLER", 0),
        0x34 => ("CALLVALUE", 0),
        0x35 => ("CALLDATALOAD", 0),
        0x36 => ("CALLDATASIZE", 0),
        0x37 => ("CALLDATACOPY", 0),
        0x38 => ("CODESIZE", 0),
        0x39 => ("CODECOPY", 0),
        0x3A => ("GASPRICE", 0),
        0x3B => ("EXTCODESIZE", 0),
        0x3C => ("EXTCODECOPY", 0),
        0x3D => ("RETURNDATASIZE", 0),
        0x3E => ("RETURNDATACOPY", 0),
        0x3F => ("EXTCODEHASH", 0),

        // Block info
        0x40 => ("BLOCKHASH", 0),
        0x41 => ("COINBASE", 0),
        0x42 => ("TIMESTAMP", 0),
        0x43 => ("NUMBER", 0),
        0x44 => ("PREVRANDAO", 0),
        0x45 => ("GASLIMIT", 0),
        0x46 => ("CHAINID", 0),
        0x47 => ("SELFBALANCE", 0),
        0x48 => ("BASEFEE", 0),
        0x49 => ("BLOBHASH", 0),
        0x4A => ("BLOBBASEFEE", 0),

        // Stack, memory, storage (incl. transient storage / MCOPY)
        0x50 => ("POP", 0),
        0x51 => ("MLOAD", 0),
        0x52 => ("MSTORE", 0),
        0x53 => ("MSTORE8", 0),
        0x54 => ("SLOAD", 0),
        0x55 => ("SSTORE", 0),
        0x56 => ("JUMP", 0),
        0x57 => ("JUMPI", 0),
        0x58 => ("PC", 0),
        0x59 => ("MSIZE", 0),
        0x5A => ("GAS", 0),
        0x5B => ("JUMPDEST", 0),
        0x5C => ("TLOAD", 0),
        0x5D => ("TSTORE", 0),
        0x5E => ("MCOPY", 0),
        0x5F => ("PUSH0", 0),

        // PUSH1..PUSH32
        0x60..=0x7F => (PUSH_NAMES[(opcode - 0x60) as usize], (opcode - 0x5F) as usize),

        // DUP1..DUP16
        0x80..=0x8F => (DUP_NAMES[(opcode - 0x80) as usize], 0),

        // SWAP1..SWAP16
        0x90..=0x9F => (SWAP_NAMES[(opcode - 0x90) as usize], 0),

        // LOG0..LOG4
        0xA0 => ("LOG0", 0),
        0xA1 => ("LOG1", 0),
        0xA2 => ("LOG2", 0),
        0xA3 => ("LOG3", 0),
        0xA4 => ("LOG4", 0),

        // System
        0xF0 => ("CREATE", 0),
        0xF1 => ("CALL", 0),
        0xF2 => ("CALLCODE", 0),
        0xF3 => ("RETURN", 0),
        0xF4 => ("DELEGATECALL", 0),
        0xF5 => ("CREATE2", 0),
        0xFA => ("STATICCALL", 0),
        0xFD => ("REVERT", 0),
        0xFE => ("INVALID", 0),
        0xFF => ("SELFDESTRUCT", 0),

        _ => return None,
    })
}

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];
