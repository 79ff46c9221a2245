use super::context;
use crate::{
    eligibility::{ChainlistRegistry, EligibilityChecker, PrefundBuffer},
    opts::{GlobalArgs, RpcOpts},
};
use clap::{Parser, ValueHint};
use eyre::{Result, WrapErr};
use singleton_factory_common::{AlloyRpc, ChainRpc, sh_println};
use std::path::PathBuf;
use tracing::info;

/// CLI arguments for `singleton-factory new-chain`.
#[derive(Clone, Debug, Parser)]
pub struct NewChainArgs {
    /// Write the JSON summary here instead of stdout.
    #[arg(long, env = "SUMMARY_FILE", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub summary_file: Option<PathBuf>,

    /// Required balance over the estimated deployment cost, in percent.
    #[arg(long, value_name = "PERCENT", default_value_t = PrefundBuffer::default())]
    pub prefund_buffer: PrefundBuffer,

    #[command(flatten)]
    pub rpc: RpcOpts,
}

impl NewChainArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (constants, store) = context(global)?;
        let registry = ChainlistRegistry::default();
        let rpc = self.rpc.resolve_url().map(AlloyRpc::new);

        let report = EligibilityChecker::new(&constants, &store, &registry)
            .with_buffer(self.prefund_buffer)
            .check(rpc.as_ref().map(|rpc| rpc as &dyn ChainRpc).map_err(|failure| failure.clone()))
            .await;
        info!(outcome = %report.outcome, chain_id = ?report.chain_id, "eligibility check done");

        let summary = report.to_json()?;
        match &self.summary_file {
            Some(path) => std::fs::write(path, format!("{summary}\n"))
                .wrap_err_with(|| format!("failed to write {}", path.display()))?,
            None => sh_println!("{summary}")?,
        }

        match report.outcome.failure() {
            Some(failure) => Err(failure.clone().into()),
            None => Ok(()),
        }
    }
}
