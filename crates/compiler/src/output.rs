//! Compiler output handling.

use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use eyre::{OptionExt, Result};
use foundry_compilers::artifacts::{CompilerOutput, Severity};
use std::path::Path;

/// Warnings with this fragment are expected for every Yul compilation and ignored.
const YUL_EXPERIMENTAL: &str = "Yul is still experimental";

/// A compiled contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledContract {
    /// Init code.
    pub bytecode: Bytes,
    pub abi: JsonAbi,
}

/// Fails on any diagnostic other than the Yul experimental warning.
///
/// The error lists the formatted message of every remaining diagnostic, one per line.
pub fn ensure_no_errors(output: &CompilerOutput) -> Result<()> {
    let concatenated: String = output
        .errors
        .iter()
        .filter(|err| {
            !(err.severity == Severity::Warning && err.message.contains(YUL_EXPERIMENTAL))
        })
        .map(|err| format!("{}\n", err.formatted_message.as_deref().unwrap_or(&err.message)))
        .collect();
    if !concatenated.is_empty() {
        eyre::bail!("The following errors/warnings were returned by solc:\n\n{concatenated}");
    }
    Ok(())
}

/// Checks diagnostics and extracts the named contract.
pub fn extract_contract(
    mut output: CompilerOutput,
    file_name: &str,
    contract_name: &str,
) -> Result<CompiledContract> {
    ensure_no_errors(&output)?;

    let contract = output
        .contracts
        .get_mut(Path::new(file_name))
        .and_then(|contracts| contracts.remove(contract_name))
        .ok_or_else(|| eyre::eyre!("contract {contract_name} not found in {file_name}"))?;
    let bytecode = contract
        .evm
        .and_then(|evm| evm.bytecode)
        .ok_or_eyre("compiler output has no bytecode")?
        .object
        .into_bytes()
        .ok_or_eyre("compiler returned unlinked bytecode")?;
    if bytecode.is_empty() {
        eyre::bail!("compiler returned empty bytecode for {contract_name}");
    }

    Ok(CompiledContract { bytecode, abi: contract.abi.unwrap_or_default() })
}
