use super::context;
use crate::{
    opts::{GlobalArgs, RpcOpts},
    verify::verify_deployment,
};
use clap::Parser;
use eyre::Result;
use singleton_factory_common::sh_println;
use yansi::Paint;

/// CLI arguments for `singleton-factory verify`.
#[derive(Clone, Debug, Parser)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub rpc: RpcOpts,
}

impl VerifyArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (constants, store) = context(global)?;
        let rpc = self.rpc.rpc()?;
        let report = verify_deployment(&rpc, &store, &constants).await?;
        sh_println!("Chain {}: {} at {}", report.chain_id, "verified".green(), report.address)?;
        sh_println!("Codehash: {}", report.codehash)?;
        Ok(())
    }
}
