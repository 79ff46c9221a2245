//! JSON-RPC access used by the deployment pipeline.
//!
//! All chain reads and writes go through the [`ChainRpc`] trait so that the pipeline and the
//! eligibility checker can be driven by scripted fakes in tests. [`AlloyRpc`] is the production
//! implementation over an HTTP [`RootProvider`].

use alloy_network::{AnyNetwork, ReceiptResponse};
use alloy_primitives::{Address, B256, Bytes, TxKind, U256};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_serde::WithOtherFields;
use alloy_zksync::network::{
    transaction_request::TransactionRequest as ZkTransactionRequest,
    unsigned_tx::eip712::PaymasterParams,
};
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use singleton_factory_zksync::EIP712_TX_TYPE;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A read-only call or gas estimation request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallRequest {
    pub from: Option<Address>,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: U256,
    pub nonce: Option<u64>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
    /// zkSync specific fields, sent as `eip712Meta`.
    pub zk: Option<ZkCallMeta>,
}

/// zkSync EIP-712 metadata attached to a [`CallRequest`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZkCallMeta {
    pub gas_per_pubdata: U256,
    pub factory_deps: Vec<Bytes>,
    pub paymaster: Option<PaymasterParams>,
}

impl CallRequest {
    /// A contract creation request from `from` with the given init code.
    pub fn create(from: Address, data: Bytes) -> Self {
        Self { from: Some(from), data, ..Default::default() }
    }

    fn into_alloy(self) -> Result<WithOtherFields<TransactionRequest>> {
        let inner = TransactionRequest {
            from: self.from,
            to: Some(self.to.map(TxKind::Call).unwrap_or(TxKind::Create)),
            input: TransactionInput::new(self.data),
            value: Some(self.value),
            nonce: self.nonce,
            gas: self.gas,
            gas_price: self.gas_price,
            transaction_type: self.zk.as_ref().map(|_| EIP712_TX_TYPE),
            ..Default::default()
        };
        let Some(meta) = self.zk else { return Ok(WithOtherFields::new(inner)) };

        let mut request = ZkTransactionRequest::from(inner);
        request.set_gas_per_pubdata(meta.gas_per_pubdata);
        request.set_factory_deps(meta.factory_deps);
        if let Some(paymaster) = meta.paymaster {
            request.set_paymaster_params(paymaster);
        }
        // The zkSync fields end up in `other`.
        let value = serde_json::to_value(&request).wrap_err("failed to serialize zkSync request")?;
        serde_json::from_value(value).wrap_err("failed to convert zkSync request")
    }
}

/// The parts of a transaction receipt the pipeline cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub status: bool,
    pub contract_address: Option<Address>,
}

/// Chain access needed to estimate, simulate, submit and verify a deployment.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    async fn transaction_count(&self, address: Address) -> Result<u64>;

    async fn code(&self, address: Address) -> Result<Bytes>;

    async fn balance(&self, address: Address) -> Result<U256>;

    async fn gas_price(&self) -> Result<u128>;

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64>;

    async fn call(&self, request: &CallRequest) -> Result<Bytes>;

    /// Broadcasts a signed raw transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;

    async fn receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>>;

    /// Polls for the receipt of `hash` until it is available or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout.
    async fn wait_for_receipt(
        &self,
        hash: B256,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Option<ReceiptSummary>> {
        let poll = async {
            loop {
                if let Some(receipt) = self.receipt(hash).await? {
                    return Ok::<_, eyre::Report>(receipt);
                }
                tokio::time::sleep(poll_interval).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(receipt) => receipt.map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// [`ChainRpc`] over an HTTP JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct AlloyRpc {
    provider: RootProvider<AnyNetwork>,
}

impl AlloyRpc {
    pub fn new(url: Url) -> Self {
        let provider = ProviderBuilder::<_, _, AnyNetwork>::default().connect_http(url);
        Self { provider }
    }
}

#[async_trait]
impl ChainRpc for AlloyRpc {
    async fn chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.wrap_err("failed to get chain id")
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .wrap_err_with(|| format!("failed to get transaction count of {address}"))
    }

    async fn code(&self, address: Address) -> Result<Bytes> {
        self.provider
            .get_code_at(address)
            .await
            .wrap_err_with(|| format!("failed to get code at {address}"))
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .wrap_err_with(|| format!("failed to get balance of {address}"))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider.get_gas_price().await.wrap_err("failed to get gas price")
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64> {
        Ok(self.provider.estimate_gas(request.clone().into_alloy()?).await?)
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes> {
        Ok(self.provider.call(request.clone().into_alloy()?).await?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .wrap_err("failed to broadcast transaction")?;
        let hash = *pending.tx_hash();
        debug!(%hash, "broadcast raw transaction");
        Ok(hash)
    }

    async fn receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .wrap_err_with(|| format!("failed to get receipt of {hash}"))?;
        Ok(receipt.map(|receipt| ReceiptSummary {
            transaction_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            status: receipt.status(),
            contract_address: receipt.contract_address(),
        }))
    }
}
