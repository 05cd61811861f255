//! Error kinds for the analysis pipeline.
//!
//! Each concern gets its own `thiserror` enum rather than a single
//! catch-all. `engine::analyze` narrows most of these to partial results,
//! but surfaces a primary bytecode fetch or parse failure as `EngineError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisassembleError {
    #[error("malformed bytecode hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC returned invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("RPC error {code:?}: {message}")]
    JsonRpc { code: Option<i64>, message: String },

    #[error("RPC returned a null result")]
    NullResult,
}

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("explorer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("explorer returned invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("explorer reported status=0 (not found)")]
    NotFound,

    #[error("explorer response missing expected field: {0}")]
    MissingField(&'static str),
}

/// Errors surfaced by `Engine::analyze`/`Engine::analyze_bytecode`. Only the
/// primary bytecode fetch and its disassembly are fatal; every other I/O
/// failure in the pipeline is swallowed and narrows the result instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("bytecode fetch failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("bytecode parse failed: {0}")]
    Parse(#[from] DisassembleError),
}
