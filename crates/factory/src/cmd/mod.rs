//! Subcommands of the `singleton-factory` binary.

use crate::opts::{CompilerOpts, GlobalArgs};
use alloy_primitives::Bytes;
use eyre::Result;
use singleton_factory_common::{DeployerConstants, sh_warn};

pub mod compile;
pub mod estimate;
pub mod info;
pub mod new_chain;
pub mod prepare;
pub mod prepare_zk;
pub mod status;
pub mod submit;
pub mod verify;

/// Compiles the factory and warns if the output differs from the configured init code.
pub(crate) fn factory_bytecode(
    compiler: &CompilerOpts,
    constants: &DeployerConstants,
) -> Result<Bytes> {
    let compiled = compiler.compile()?;
    if compiled.bytecode != constants.factory_bytecode {
        sh_warn!(
            "compiled bytecode differs from the configured factory bytecode, the deployment will \
             not land at {}",
            constants.factory_address
        )?;
    }
    Ok(compiled.bytecode)
}

/// Loads the constants and the artifact store selected by the global arguments.
pub(crate) fn context(global: &GlobalArgs) -> Result<(DeployerConstants, crate::ArtifactStore)> {
    Ok((global.deployer_constants()?, global.store()))
}
