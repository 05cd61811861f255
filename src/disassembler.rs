//! EVM bytecode disassembler: hex string → ordered `Instruction` sequence.

use crate::error::DisassembleError;
use crate::opcodes;

/// A single decoded instruction.
///
/// `operand` is empty for non-PUSH opcodes. For `PUSHn`, it holds up to
/// `n` bytes; fewer if the bytecode ends mid-operand (a truncated PUSH is
/// still emitted, not treated as an error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: u8,
    pub mnemonic: String,
    pub operand: Vec<u8>,
}

impl Instruction {
    /// The operand interpreted as a big-endian unsigned integer, if it fits
    /// in 4 bytes. Used by selector extraction (`PUSH4`) and reporting.
    pub fn operand_as_u32(&self) -> Option<u32> {
        if self.operand.len() > 4 {
            return None;
        }
        let mut buf = [0u8; 4];
        let start = 4 - self.operand.len();
        buf[start..].copy_from_slice(&self.operand);
        Some(u32::from_be_bytes(buf))
    }
}

/// Disassemble a hex-encoded bytecode string into instructions.
///
/// Accepts an optional `0x`/`0X` prefix and is case-insensitive. An empty
/// string or bare `"0x"` yields an empty instruction sequence. An odd
/// number of hex digits is the only failure mode.
pub fn disassemble(bytecode_hex: &str) -> Result<Vec<Instruction>, DisassembleError> {
    let trimmed = bytecode_hex.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if body.is_empty() {
        return Ok(Vec::new());
    }

    let raw = hex::decode(body)?;
    Ok(disassemble_bytes(&raw))
}

/// Disassemble raw bytecode bytes directly, bypassing hex decoding.
pub fn disassemble_bytes(raw: &[u8]) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut i = 0;

    while i < raw.len() {
        let opcode = raw[i];
        let size = opcodes::operand_size(opcode);
        let (mnemonic, _) = opcodes::lookup(opcode);

        let operand = if size > 0 {
            let available = size.min(raw.len() - i - 1);
            raw[i + 1..i + 1 + available].to_vec()
        } else {
            Vec::new()
        };

        instructions.push(Instruction {
            offset: i,
            opcode,
            mnemonic,
            operand,
        });

        i += 1 + size;
    }

    instructions
}

/// Decode the declared size in bytes of a (possibly `0x`-prefixed) hex
/// bytecode string, independent of disassembly.
pub fn bytecode_size(bytecode_hex: &str) -> usize {
    let trimmed = bytecode_hex.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    body.len() / 2
}
