//! Scripted chain and registry fakes.

use alloy_primitives::{Address, B256, Bytes, U256, bytes, keccak256};
use async_trait::async_trait;
use eyre::{Result, bail};
use singleton_factory::{ArtifactStore, ChainRegistry};
use singleton_factory_common::{CallRequest, ChainRpc, DeployerConstants, ReceiptSummary};
use singleton_factory_wallets::{DeploymentSigner, LocalWallet};
use std::sync::Mutex;

/// First anvil dev account.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Runtime code returned by the scripted `eth_call` of a deployment.
pub const RUNTIME: Bytes = bytes!("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe0");

pub fn wallet() -> LocalWallet {
    LocalWallet::from_private_key(DEV_KEY).unwrap()
}

/// Constants for a factory deployed by the dev account.
pub fn dev_constants() -> DeployerConstants {
    let signer = wallet().address();
    DeployerConstants {
        signer,
        factory_address: signer.create(0),
        codehash: keccak256(&RUNTIME),
        ..Default::default()
    }
}

pub fn store() -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("artifacts"));
    (dir, store)
}

/// In-memory chain answering every request from fixed values.
///
/// `None` fields make the matching request fail.
#[derive(Debug)]
pub struct ScriptedRpc {
    pub chain_id: u64,
    pub nonce: u64,
    pub code: Bytes,
    pub balance: U256,
    pub gas_price: Option<u128>,
    pub gas_estimate: Option<u64>,
    pub call_output: Option<Bytes>,
    /// Receipt status of broadcast transactions, `None` to never mine them.
    pub receipt_status: Option<bool>,
    pub sent: Mutex<Vec<Bytes>>,
}

impl Default for ScriptedRpc {
    fn default() -> Self {
        Self {
            chain_id: 1337,
            nonce: 0,
            code: Bytes::new(),
            balance: U256::ZERO,
            gas_price: Some(10),
            gas_estimate: Some(68_211),
            call_output: Some(RUNTIME),
            receipt_status: Some(true),
            sent: Mutex::default(),
        }
    }
}

impl ScriptedRpc {
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainRpc for ScriptedRpc {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn transaction_count(&self, _: Address) -> Result<u64> {
        Ok(self.nonce)
    }

    async fn code(&self, _: Address) -> Result<Bytes> {
        Ok(self.code.clone())
    }

    async fn balance(&self, _: Address) -> Result<U256> {
        Ok(self.balance)
    }

    async fn gas_price(&self) -> Result<u128> {
        match self.gas_price {
            Some(price) => Ok(price),
            None => bail!("eth_gasPrice unavailable"),
        }
    }

    async fn estimate_gas(&self, _: &CallRequest) -> Result<u64> {
        match self.gas_estimate {
            Some(gas) => Ok(gas),
            None => bail!("execution reverted"),
        }
    }

    async fn call(&self, _: &CallRequest) -> Result<Bytes> {
        match &self.call_output {
            Some(output) => Ok(output.clone()),
            None => bail!("execution reverted"),
        }
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        self.sent.lock().unwrap().push(Bytes::copy_from_slice(raw));
        Ok(keccak256(raw))
    }

    async fn receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>> {
        Ok(self.receipt_status.map(|status| ReceiptSummary {
            transaction_hash: hash,
            block_number: Some(1),
            gas_used: 68_211,
            status,
            contract_address: None,
        }))
    }
}

/// Registry with a fixed answer.
#[derive(Clone, Copy, Debug)]
pub struct FixedRegistry(pub bool);

#[async_trait]
impl ChainRegistry for FixedRegistry {
    fn entry_url(&self, chain_id: u64) -> String {
        format!("https://chains.test/eip155-{chain_id}.json")
    }

    async fn is_listed(&self, _: u64) -> Result<bool> {
        Ok(self.0)
    }
}
