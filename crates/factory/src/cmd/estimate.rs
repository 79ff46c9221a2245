use super::{context, factory_bytecode};
use crate::{
    gas::{self, GasMultipliers},
    opts::{CompilerOpts, GlobalArgs, RpcOpts},
};
use alloy_primitives::utils::format_ether;
use clap::Parser;
use eyre::Result;
use singleton_factory_common::{CallRequest, ChainRpc, sh_println};

/// CLI arguments for `singleton-factory estimate`.
#[derive(Clone, Debug, Parser)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub rpc: RpcOpts,

    #[command(flatten)]
    pub compiler: CompilerOpts,
}

impl EstimateArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (constants, _) = context(global)?;
        let rpc = self.rpc.rpc()?;
        let bytecode = factory_bytecode(&self.compiler, &constants)?;

        let chain_id = rpc.chain_id().await?;
        let request = CallRequest::create(constants.signer, bytecode);
        let estimate = gas::estimate(&rpc, &request, GasMultipliers::NONE).await?;
        let required = estimate.cost();

        sh_println!("Chain ID:       {chain_id}")?;
        sh_println!("Gas estimate:   {}", estimate.gas_limit)?;
        sh_println!("Gas price:      {}", estimate.gas_price)?;
        sh_println!("Required funds: {} ETH ({required} wei)", format_ether(required))?;
        sh_println!("Fund:           {}", constants.signer)?;
        Ok(())
    }
}
