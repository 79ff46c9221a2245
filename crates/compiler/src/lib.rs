//! # singleton-factory-compiler
//!
//! Compiles the bootstrap Yul contract with solc.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod output;
pub mod solc;

pub use foundry_compilers::solc::Solc;
pub use output::{CompiledContract, ensure_no_errors, extract_contract};
pub use solc::{DEFAULT_SOLC_VERSION, resolve_solc, yul_input};

use eyre::Result;

/// File name the bootstrap source is compiled under.
pub const PROXY_SOURCE_NAME: &str = "deterministic-deployment-proxy.yul";

/// Name of the Yul object holding the proxy.
pub const PROXY_CONTRACT_NAME: &str = "Proxy";

/// Source of the deterministic deployment proxy.
pub const PROXY_SOURCE: &str = include_str!("../source/deterministic-deployment-proxy.yul");

/// Something that turns a Yul source into a compiled contract.
pub trait BytecodeCompiler {
    /// Compiles `source`, registered as `file_name`, and returns the contract named
    /// `contract_name`.
    fn compile(&self, file_name: &str, contract_name: &str, source: &str)
    -> Result<CompiledContract>;
}

/// Compiles the deterministic deployment proxy.
pub fn compile_proxy(compiler: &dyn BytecodeCompiler) -> Result<CompiledContract> {
    compiler.compile(PROXY_SOURCE_NAME, PROXY_CONTRACT_NAME, PROXY_SOURCE)
}
