use super::{context, factory_bytecode};
use crate::{
    builder::{DeploymentScheme, FeeParams},
    gas::{self, GasMultipliers},
    opts::{CompilerOpts, GlobalArgs, RpcOpts},
    submit::{DeploymentPipeline, PrepareRequest},
};
use clap::Parser;
use eyre::{Result, bail};
use singleton_factory_common::{CallRequest, ChainRpc, sh_println};
use singleton_factory_wallets::WalletOpts;
use yansi::Paint;

/// CLI arguments for `singleton-factory prepare`.
#[derive(Clone, Debug, Parser)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub rpc: RpcOpts,

    #[command(flatten)]
    pub compiler: CompilerOpts,

    #[command(flatten)]
    pub wallet: WalletOpts,
}

impl PrepareArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (constants, store) = context(global)?;
        let rpc = self.rpc.rpc()?;
        let bytecode = factory_bytecode(&self.compiler, &constants)?;
        let signer = self.wallet.signer().await?;
        if signer.address() != constants.signer {
            bail!(
                "signer {} is not the factory deployer {}",
                signer.address(),
                constants.signer
            );
        }

        let chain_id = rpc.chain_id().await?;
        let request = CallRequest::create(constants.signer, bytecode.clone());
        let estimate = gas::estimate(&rpc, &request, GasMultipliers::EVM).await?;
        sh_println!(
            "Chain {chain_id}: gas price {}, gas limit {}",
            estimate.gas_price,
            estimate.gas_limit
        )?;

        let request = PrepareRequest {
            bytecode,
            chain_id,
            nonce: 0,
            fees: FeeParams::Legacy {
                gas_price: estimate.gas_price,
                gas_limit: estimate.gas_limit,
            },
            scheme: DeploymentScheme::NonceCreate,
        };
        let artifact = DeploymentPipeline::new(&constants, &store)
            .prepare(request, &*signer, Some(&rpc))
            .await?;

        sh_println!("Factory:  {}", artifact.address.green())?;
        sh_println!("Artifact: {}", store.artifact_path(chain_id).display())?;
        Ok(())
    }
}
