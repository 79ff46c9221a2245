use super::context;
use crate::{
    opts::{GlobalArgs, RpcOpts},
    submit::{
        DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL, DeploymentPipeline, SubmitOptions,
        SubmitOutcome,
    },
    verify::verify_deployment,
};
use clap::Parser;
use eyre::Result;
use singleton_factory_common::{sh_println, sh_warn};
use std::time::Duration;
use yansi::Paint;

/// CLI arguments for `singleton-factory submit`.
#[derive(Clone, Debug, Parser)]
pub struct SubmitArgs {
    /// Broadcast without replaying the transaction first.
    #[arg(long)]
    pub no_simulate: bool,

    /// Seconds to wait for the receipt.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CONFIRMATION_TIMEOUT.as_secs())]
    pub timeout: u64,

    #[command(flatten)]
    pub rpc: RpcOpts,
}

impl SubmitArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let (constants, store) = context(global)?;
        let rpc = self.rpc.rpc()?;
        let options = SubmitOptions {
            simulate: !self.no_simulate,
            timeout: Duration::from_secs(self.timeout),
            poll_interval: DEFAULT_POLL_INTERVAL,
        };

        match DeploymentPipeline::new(&constants, &store).submit(&rpc, options).await? {
            SubmitOutcome::Unconfirmed(hash) => {
                sh_warn!(
                    "transaction {hash} was not confirmed within {}s, run `verify` once it is",
                    self.timeout
                )?;
            }
            SubmitOutcome::Confirmed(receipt) => {
                sh_println!("Transaction {} confirmed", receipt.transaction_hash)?;
                let report = verify_deployment(&rpc, &store, &constants).await?;
                sh_println!("Deployed {} at {}", report.codehash, report.address.green())?;
            }
        }
        Ok(())
    }
}
