use alloy_consensus::SignableTransaction;
use alloy_primitives::{Address, Signature};
use alloy_signer::Signer;
use alloy_signer_local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English};
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use singleton_factory_common::sh_warn;

/// A signer able to produce the deployment transaction signature.
///
/// Signatures are returned with a normalized y-parity; callers attach them to the transaction and
/// encode it.
#[async_trait]
pub trait DeploymentSigner: Send + Sync {
    /// The address signatures recover to.
    fn address(&self) -> Address;

    /// Signs a legacy, EIP-1559 or zkSync EIP-712 transaction.
    async fn sign_transaction(
        &self,
        tx: &mut dyn SignableTransaction<Signature>,
    ) -> Result<Signature>;
}

/// Signer backed by local key material.
#[derive(Clone, Debug)]
pub struct LocalWallet {
    inner: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }

    /// Parses a hex encoded private key.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let inner = key.trim().parse::<PrivateKeySigner>().wrap_err("invalid private key")?;
        Ok(Self::new(inner))
    }

    /// Derives the first account (`m/44'/60'/0'/0/0`) of a BIP-39 mnemonic.
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        sh_warn!("Using a mnemonic is considered insecure, and is deprecated.")?;
        let inner = MnemonicBuilder::<English>::default()
            .phrase(phrase.trim())
            .index(0u32)?
            .build()
            .wrap_err("invalid mnemonic")?;
        Ok(Self::new(inner))
    }
}

#[async_trait]
impl DeploymentSigner for LocalWallet {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_transaction(
        &self,
        tx: &mut dyn SignableTransaction<Signature>,
    ) -> Result<Signature> {
        Ok(self.inner.sign_hash(&tx.signature_hash()).await?)
    }
}
