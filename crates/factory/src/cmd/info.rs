use crate::opts::GlobalArgs;
use clap::Parser;
use eyre::{Result, eyre};
use singleton_factory_common::sh_println;

/// CLI arguments for `singleton-factory info`.
#[derive(Clone, Debug, Parser)]
pub struct InfoArgs {
    pub chain_id: u64,
}

impl InfoArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let store = global.store();
        let artifact = store
            .read(self.chain_id)?
            .ok_or_else(|| eyre!("no deployment for chain {}", self.chain_id))?;
        sh_println!("{}", artifact.to_json()?.trim_end())?;
        Ok(())
    }
}
