use crate::{
    artifact::ArtifactStore,
    cmd::{
        compile::CompileArgs, estimate::EstimateArgs, info::InfoArgs, new_chain::NewChainArgs,
        prepare::PrepareArgs, prepare_zk::PrepareZkArgs, status::StatusArgs, submit::SubmitArgs,
        verify::VerifyArgs,
    },
};
use clap::{Parser, Subcommand, ValueHint};
use eyre::{Result, WrapErr};
use singleton_factory_common::{
    AlloyRpc, DeployerConstants, DeploymentFailure, io::shell, utils::resolve_rpc_url,
};
use singleton_factory_compiler::{CompiledContract, Solc, compile_proxy, resolve_solc};
use std::{future::Future, path::PathBuf};
use url::Url;

/// Deploy the singleton factory to the same address on every chain.
#[derive(Parser)]
#[command(name = "singleton-factory", version, next_display_order = None)]
pub struct SingletonFactory {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: SingletonFactorySubcommand,
}

#[derive(Subcommand)]
pub enum SingletonFactorySubcommand {
    /// Build, sign and store the deployment transaction without an RPC.
    Compile(CompileArgs),

    /// Estimate the deployment cost on a chain.
    Estimate(EstimateArgs),

    /// Estimate, then build, sign and store the deployment transaction.
    Prepare(PrepareArgs),

    /// Build, sign and store a zkSync EIP-712 deployment through the contract deployer.
    PrepareZk(PrepareZkArgs),

    /// Simulate, broadcast and confirm the stored transaction, then verify the deployment.
    Submit(SubmitArgs),

    /// Verify the code deployed at the stored address.
    Verify(VerifyArgs),

    /// Print the code deployed at the stored address.
    Status(StatusArgs),

    /// Print the stored deployment of a chain.
    Info(InfoArgs),

    /// Check whether a chain can get the factory.
    NewChain(NewChainArgs),
}

/// Global arguments.
#[derive(Clone, Debug, Parser)]
pub struct GlobalArgs {
    /// Directory holding the per-chain deployment artifacts.
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        value_hint = ValueHint::DirPath,
        default_value = "artifacts"
    )]
    pub artifacts: PathBuf,

    /// TOML file with an alternate set of deployer constants.
    #[arg(long, global = true, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub constants: Option<PathBuf>,

    /// Do not print anything to stdout.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Applies the global arguments.
    pub fn init(&self) -> Result<()> {
        shell::set_quiet(self.quiet);
        Ok(())
    }

    /// Runs `fut` to completion on a multi-threaded runtime.
    pub fn block_on<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .wrap_err("failed to start the async runtime")?;
        runtime.block_on(fut)
    }

    pub fn deployer_constants(&self) -> Result<DeployerConstants> {
        match &self.constants {
            Some(path) => DeployerConstants::load(path),
            None => Ok(DeployerConstants::default()),
        }
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.artifacts)
    }
}

/// RPC endpoint selection.
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "RPC options")]
pub struct RpcOpts {
    /// The RPC endpoint.
    #[arg(short = 'r', long = "rpc-url", env = "RPC", value_name = "URL")]
    pub url: Option<String>,

    /// Text to take the RPC URL from when none is given, such as a new chain request.
    #[arg(long, env = "ISSUE_BODY", value_name = "TEXT", hide_env_values = true)]
    pub issue_body: Option<String>,
}

impl RpcOpts {
    pub fn resolve_url(&self) -> Result<Url, DeploymentFailure> {
        resolve_rpc_url(self.url.as_deref(), self.issue_body.as_deref())
    }

    pub fn rpc(&self) -> Result<AlloyRpc> {
        Ok(AlloyRpc::new(self.resolve_url()?))
    }
}

/// Compiler selection.
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Compiler options")]
pub struct CompilerOpts {
    /// Path to a solc binary, or a version to install.
    #[arg(long, env = "SOLC", value_name = "PATH_OR_VERSION")]
    pub solc: Option<String>,
}

impl CompilerOpts {
    pub fn solc(&self) -> Result<Solc> {
        resolve_solc(self.solc.as_deref())
    }

    /// Compiles the deterministic deployment proxy.
    pub fn compile(&self) -> Result<CompiledContract> {
        compile_proxy(&self.solc()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        SingletonFactory::command().debug_assert();
    }

    #[test]
    fn parses_global_args_after_subcommand() {
        let args = SingletonFactory::try_parse_from([
            "singleton-factory",
            "info",
            "100",
            "--artifacts",
            "/tmp/artifacts",
        ])
        .unwrap();
        assert_eq!(args.global.artifacts, PathBuf::from("/tmp/artifacts"));
        assert!(matches!(args.cmd, SingletonFactorySubcommand::Info(InfoArgs { chain_id: 100 })));
    }
}
