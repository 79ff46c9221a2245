use super::{context, factory_bytecode};
use crate::{
    builder::{DeploymentScheme, FeeParams},
    gas::{OFFLINE_GAS_LIMIT, OFFLINE_GAS_PRICE},
    opts::{CompilerOpts, GlobalArgs},
    submit::{DeploymentPipeline, PrepareRequest},
};
use clap::Parser;
use eyre::Result;
use singleton_factory_common::sh_println;
use singleton_factory_wallets::WalletOpts;
use yansi::Paint;

/// CLI arguments for `singleton-factory compile`.
#[derive(Clone, Debug, Parser)]
pub struct CompileArgs {
    /// Chain the transaction is bound to.
    pub chain_id: u64,

    /// Gas price, or max fee per gas with `--priority-fee`.
    #[arg(long, value_name = "WEI", default_value_t = OFFLINE_GAS_PRICE)]
    pub gas_price: u128,

    #[arg(long, value_name = "GAS", default_value_t = OFFLINE_GAS_LIMIT)]
    pub gas_limit: u64,

    #[arg(long, default_value_t = 0)]
    pub nonce: u64,

    /// Build an EIP-1559 transaction with this max priority fee per gas.
    #[arg(long, value_name = "WEI")]
    pub priority_fee: Option<u128>,

    #[command(flatten)]
    pub compiler: CompilerOpts,

    #[command(flatten)]
    pub wallet: WalletOpts,
}

impl CompileArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (constants, store) = context(global)?;
        let bytecode = factory_bytecode(&self.compiler, &constants)?;
        let fees = match self.priority_fee {
            Some(max_priority_fee_per_gas) => FeeParams::Eip1559 {
                max_fee_per_gas: self.gas_price,
                max_priority_fee_per_gas,
                gas_limit: self.gas_limit,
            },
            None => FeeParams::Legacy { gas_price: self.gas_price, gas_limit: self.gas_limit },
        };
        let signer = self.wallet.signer().await?;

        let request = PrepareRequest {
            bytecode,
            chain_id: self.chain_id,
            nonce: self.nonce,
            fees,
            scheme: DeploymentScheme::NonceCreate,
        };
        let artifact =
            DeploymentPipeline::new(&constants, &store).prepare(request, &*signer, None).await?;

        sh_println!("Deployer: {}", artifact.signer_address)?;
        sh_println!("Factory:  {}", artifact.address.green())?;
        sh_println!("Artifact: {}", store.artifact_path(self.chain_id).display())?;
        Ok(())
    }
}
