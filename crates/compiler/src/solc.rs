//! Yul compilation through solc's standard JSON interface.

use crate::{BytecodeCompiler, CompiledContract, output::extract_contract};
use eyre::{Result, WrapErr};
use foundry_compilers::{
    artifacts::{
        Optimizer, OptimizerDetails, Settings, SolcInput, Source,
        output_selection::OutputSelection,
    },
    solc::{Solc, SolcLanguage},
};
use semver::Version;
use std::{collections::BTreeMap, path::PathBuf};
use tracing::{debug, trace};

/// Compiler version used when neither a binary nor a version is configured.
pub const DEFAULT_SOLC_VERSION: Version = Version::new(0, 5, 8);

/// Outputs requested for every contract.
pub const OUTPUT_SELECTION: [&str; 2] = ["abi", "evm.bytecode.object"];

/// Standard JSON input compiling a single Yul source with the optimizer and its Yul step
/// enabled.
pub fn yul_input(file_name: &str, content: &str) -> SolcInput {
    let sources = BTreeMap::from([(PathBuf::from(file_name), Source::new(content))]);
    let selection = OUTPUT_SELECTION.iter().map(|output| output.to_string()).collect();
    let output_selection: OutputSelection =
        BTreeMap::from([("*".to_string(), BTreeMap::from([("*".to_string(), selection)]))])
            .into();
    let settings = Settings {
        optimizer: Optimizer {
            enabled: Some(true),
            details: Some(OptimizerDetails { yul: Some(true), ..Default::default() }),
            ..Default::default()
        },
        output_selection,
        // Left to the compiler, old releases reject newer EVM versions.
        evm_version: None,
        ..Default::default()
    };
    SolcInput::new(SolcLanguage::Yul, sources.into(), settings)
}

/// Resolves `--solc`: a path to a binary, or a version to find or install through svm.
///
/// Defaults to [`DEFAULT_SOLC_VERSION`].
pub fn resolve_solc(path_or_version: Option<&str>) -> Result<Solc> {
    let Some(value) = path_or_version else { return install(&DEFAULT_SOLC_VERSION) };
    match Version::parse(value.trim_start_matches('v')) {
        Ok(version) => install(&version),
        Err(_) => Solc::new(value).wrap_err_with(|| format!("invalid solc binary `{value}`")),
    }
}

fn install(version: &Version) -> Result<Solc> {
    debug!(%version, "resolving solc");
    Solc::find_or_install(version).wrap_err_with(|| format!("failed to install solc {version}"))
}

impl BytecodeCompiler for Solc {
    fn compile(
        &self,
        file_name: &str,
        contract_name: &str,
        source: &str,
    ) -> Result<CompiledContract> {
        trace!(solc = %self.solc.display(), version = %self.version, file_name, "compiling");
        let input = yul_input(file_name, source);
        let output = self.compile_exact(&input).wrap_err("solc failed")?;
        extract_contract(output, file_name, contract_name)
    }
}
