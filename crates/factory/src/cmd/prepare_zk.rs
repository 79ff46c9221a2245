use super::context;
use crate::{
    builder::{Create2Flavor, DeploymentBuilder, DeploymentScheme, FeeParams},
    gas::{self, GasMultipliers},
    opts::{GlobalArgs, RpcOpts},
    submit::{DeploymentPipeline, PrepareRequest},
};
use alloy_primitives::{Address, B256, Bytes, U256, hex};
use clap::{Parser, ValueHint};
use eyre::{Result, WrapErr, eyre};
use singleton_factory_common::{CallRequest, ChainRpc, ZkCallMeta, sh_println};
use singleton_factory_wallets::WalletOpts;
use singleton_factory_zksync::{DEFAULT_GAS_PER_PUBDATA, PaymasterParams, general_paymaster_input};
use std::path::{Path, PathBuf};
use yansi::Paint;

/// CLI arguments for `singleton-factory prepare-zk`.
#[derive(Clone, Debug, Parser)]
pub struct PrepareZkArgs {
    /// File with the zk bytecode of the factory, as hex or as a compiler artifact.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub zk_bytecode: PathBuf,

    #[arg(long, value_name = "SALT", default_value_t = B256::ZERO)]
    pub salt: B256,

    /// Gas per pubdata byte limit.
    #[arg(long, value_name = "GAS", default_value_t = DEFAULT_GAS_PER_PUBDATA)]
    pub gas_per_pubdata: u64,

    /// Paymaster paying for the deployment through the general flow.
    #[arg(long, env = "ZK_PAYMASTER_ADDRESS", value_name = "ADDRESS")]
    pub paymaster: Option<Address>,

    #[command(flatten)]
    pub rpc: RpcOpts,

    #[command(flatten)]
    pub wallet: WalletOpts,
}

impl PrepareZkArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (constants, store) = context(global)?;
        let rpc = self.rpc.rpc()?;
        let bytecode = read_zk_bytecode(&self.zk_bytecode)?;
        let signer = self.wallet.signer().await?;
        let from = signer.address();

        let chain_id = rpc.chain_id().await?;
        let nonce = rpc.transaction_count(from).await?;
        let gas_per_pubdata = U256::from(self.gas_per_pubdata);
        let paymaster = self
            .paymaster
            .map(|paymaster| PaymasterParams { paymaster, paymaster_input: general_paymaster_input() });
        let scheme = DeploymentScheme::Create2 {
            salt: self.salt,
            constructor_input: Bytes::new(),
            flavor: Create2Flavor::ZkSync,
        };
        let fees = |max_fee_per_gas: u128, gas_limit: u64| FeeParams::ZkSync {
            max_fee_per_gas,
            max_priority_fee_per_gas: max_fee_per_gas,
            gas_limit,
            gas_per_pubdata,
            factory_deps: Vec::new(),
            paymaster: paymaster.clone(),
        };

        let draft = DeploymentBuilder::new(&constants).build(
            &bytecode,
            chain_id,
            nonce,
            fees(0, 0),
            &scheme,
            from,
        )?;
        let request = CallRequest {
            from: Some(from),
            to: draft.to,
            data: draft.data,
            zk: Some(ZkCallMeta {
                gas_per_pubdata,
                factory_deps: vec![bytecode.clone()],
                paymaster: paymaster.clone(),
            }),
            ..Default::default()
        };
        let estimate = gas::estimate(&rpc, &request, GasMultipliers::ZKSYNC).await?;
        sh_println!(
            "Chain {chain_id}: gas price {}, gas limit {}",
            estimate.gas_price,
            estimate.gas_limit
        )?;

        let request = PrepareRequest {
            bytecode,
            chain_id,
            nonce,
            fees: fees(estimate.gas_price, estimate.gas_limit),
            scheme,
        };
        let artifact = DeploymentPipeline::new(&constants, &store)
            .prepare(request, &*signer, Some(&rpc))
            .await?;

        sh_println!("Factory:  {}", artifact.address.green())?;
        sh_println!("Artifact: {}", store.artifact_path(chain_id).display())?;
        Ok(())
    }
}

/// Reads hex bytecode, or the `bytecode` field of a JSON compiler artifact.
fn read_zk_bytecode(path: &Path) -> Result<Bytes> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let contents = contents.trim();
    let encoded = if contents.starts_with('{') {
        let json: serde_json::Value = serde_json::from_str(contents)?;
        let bytecode = &json["bytecode"];
        bytecode
            .as_str()
            .or_else(|| bytecode["object"].as_str())
            .ok_or_else(|| eyre!("no bytecode in {}", path.display()))?
            .to_string()
    } else {
        contents.to_string()
    };
    let bytecode = hex::decode(&encoded)
        .wrap_err_with(|| format!("invalid zk bytecode in {}", path.display()))?;
    Ok(bytecode.into())
}
