use super::context;
use crate::{
    opts::{GlobalArgs, RpcOpts},
    verify::deployed_code,
};
use clap::Parser;
use eyre::Result;
use singleton_factory_common::sh_println;

/// CLI arguments for `singleton-factory status`.
#[derive(Clone, Debug, Parser)]
pub struct StatusArgs {
    #[command(flatten)]
    pub rpc: RpcOpts,
}

impl StatusArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (_, store) = context(global)?;
        let rpc = self.rpc.rpc()?;
        let (address, code) = deployed_code(&rpc, &store).await?;
        sh_println!("{address}: {code}")?;
        Ok(())
    }
}
