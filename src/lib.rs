//! Bytecode risk-scoring engine: fetch → disassemble → detect → score,
//! with a one-hop proxy branch and a deployer-reputation detector.
//!
//! The binary crate (`main.rs`) and the HTTP façade (`server.rs`) both sit
//! on top of [`engine::Engine::analyze`], the single entry point described
//! in the component design.

pub mod cache;
pub mod config;
pub mod detectors;
pub mod disassembler;
pub mod engine;
pub mod error;
pub mod opcodes;
pub mod reputation;
pub mod rpc;
pub mod scoring;
pub mod selectors;
