use crate::{DeploymentSigner, DeviceSigner, LedgerDevice, LocalWallet, ledger::DEFAULT_HD_PATH};
use clap::Parser;
use eyre::Result;

/// Signer selection.
///
/// Local key material takes precedence; without it the Ledger is used.
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Wallet options")]
pub struct WalletOpts {
    /// Private key of the deployer account.
    #[arg(long, env = "PK", value_name = "KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Mnemonic of the deployer account, its first account is used.
    #[arg(long, env = "MNEMONIC", value_name = "PHRASE", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Derivation path used on the Ledger.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_HD_PATH)]
    pub hd_path: String,
}

impl WalletOpts {
    /// Instantiates the selected signer.
    pub async fn signer(&self) -> Result<Box<dyn DeploymentSigner>> {
        if let Some(key) = self.private_key.as_deref().filter(|key| !key.is_empty()) {
            return Ok(Box::new(LocalWallet::from_private_key(key)?));
        }
        if let Some(phrase) = self.mnemonic.as_deref().filter(|phrase| !phrase.is_empty()) {
            return Ok(Box::new(LocalWallet::from_mnemonic(phrase)?));
        }
        let device = LedgerDevice::connect(&self.hd_path).await?;
        Ok(Box::new(DeviceSigner::connect(device).await?))
    }
}
