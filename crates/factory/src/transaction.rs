//! Signing and decoding of raw deployment transactions.

use crate::builder::{FeeParams, UnsignedDeploymentTransaction};
use alloy_consensus::{SignableTransaction, Signed, Transaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_eips::{
    Typed2718,
    eip2718::{Decodable2718, Encodable2718},
};
use alloy_primitives::{Address, B256, Bytes, TxKind, U256};
use eyre::{Result, WrapErr, bail};
use singleton_factory_common::{CallRequest, DeployerConstants};
use singleton_factory_wallets::DeploymentSigner;
use singleton_factory_zksync::{
    EIP712_TX_TYPE, Eip712Fields, compute_create2_address, decode_create2_call, decode_signed,
    encode_signed,
};
use tracing::{debug, instrument};

/// Envelope of a deployment transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Legacy,
    Eip1559,
    /// zkSync EIP-712 (type `0x71`).
    ZkSync,
}

/// A signed, chain-bound deployment transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedDeployment {
    pub raw: Bytes,
    pub signer: Address,
    pub address: Address,
    pub gas_price: u128,
    pub gas_limit: u64,
}

/// Signs `tx` with `signer` and serializes it for broadcast.
#[instrument(skip_all, fields(chain_id = tx.chain_id, nonce = tx.nonce))]
pub async fn sign_deployment(
    tx: &UnsignedDeploymentTransaction,
    signer: &dyn DeploymentSigner,
) -> Result<SignedDeployment> {
    if signer.address() != tx.from {
        bail!("transaction is sent from {} but the signer is {}", tx.from, signer.address());
    }
    let kind = tx.to.map(TxKind::Call).unwrap_or(TxKind::Create);

    let raw: Bytes = match &tx.fees {
        FeeParams::Legacy { gas_price, gas_limit } => {
            let mut inner = TxLegacy {
                chain_id: Some(tx.chain_id),
                nonce: tx.nonce,
                gas_price: *gas_price,
                gas_limit: *gas_limit,
                to: kind,
                value: tx.value,
                input: tx.data.clone(),
            };
            let signature = signer.sign_transaction(&mut inner).await?;
            TxEnvelope::from(inner.into_signed(signature)).encoded_2718().into()
        }
        FeeParams::Eip1559 { max_fee_per_gas, max_priority_fee_per_gas, gas_limit } => {
            let mut inner = TxEip1559 {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_limit: *gas_limit,
                max_fee_per_gas: *max_fee_per_gas,
                max_priority_fee_per_gas: *max_priority_fee_per_gas,
                to: kind,
                value: tx.value,
                access_list: Default::default(),
                input: tx.data.clone(),
            };
            let signature = signer.sign_transaction(&mut inner).await?;
            TxEnvelope::from(inner.into_signed(signature)).encoded_2718().into()
        }
        FeeParams::ZkSync {
            max_fee_per_gas,
            max_priority_fee_per_gas,
            gas_limit,
            gas_per_pubdata,
            factory_deps,
            paymaster,
        } => {
            let Some(to) = tx.to else { bail!("zkSync transactions need a recipient") };
            let mut inner = Eip712Fields {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                from: tx.from,
                to,
                gas_limit: *gas_limit,
                max_fee_per_gas: *max_fee_per_gas,
                max_priority_fee_per_gas: *max_priority_fee_per_gas,
                gas_per_pubdata: *gas_per_pubdata,
                value: tx.value,
                data: tx.data.clone(),
                factory_deps: factory_deps.clone(),
                paymaster: paymaster.clone(),
            }
            .build()?;
            let signature = signer.sign_transaction(&mut inner).await?;
            encode_signed(inner, signature)
        }
    };
    debug!(len = raw.len(), "signed deployment transaction");

    Ok(SignedDeployment {
        raw,
        signer: tx.from,
        address: tx.expected_address,
        gas_price: tx.fees.gas_price(),
        gas_limit: tx.fees.gas_limit(),
    })
}

/// A raw deployment transaction, decoded with its sender recovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedDeployment {
    pub kind: TransactionKind,
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl DecodedDeployment {
    /// Decodes a legacy, EIP-1559 or zkSync EIP-712 transaction and recovers its sender.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.first() == Some(&EIP712_TX_TYPE) {
            let signed = decode_signed(raw)?;
            let recovered = signed.recover_signer()?;
            let tx = signed.tx();
            if recovered != tx.from {
                bail!("signature recovers to {recovered}, but the transaction is from {}", tx.from);
            }
            return Ok(Self {
                kind: TransactionKind::ZkSync,
                chain_id: tx.chain_id(),
                nonce: tx.nonce(),
                from: tx.from,
                to: tx.to(),
                value: tx.value(),
                data: tx.input().clone(),
                gas_limit: tx.gas_limit(),
                gas_price: tx.max_fee_per_gas(),
            });
        }

        let envelope =
            TxEnvelope::decode_2718(&mut &raw[..]).wrap_err("failed to decode raw transaction")?;
        match envelope {
            TxEnvelope::Legacy(signed) => Self::from_legacy(signed),
            TxEnvelope::Eip1559(signed) => Self::from_eip1559(signed),
            other => bail!("unsupported transaction type {:#x}", other.ty()),
        }
    }

    fn from_legacy(signed: Signed<TxLegacy>) -> Result<Self> {
        let from = signed.recover_signer()?;
        let tx = signed.strip_signature();
        Ok(Self {
            kind: TransactionKind::Legacy,
            chain_id: tx.chain_id,
            nonce: tx.nonce,
            from,
            to: tx.to.to().copied(),
            value: tx.value,
            data: tx.input,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
        })
    }

    fn from_eip1559(signed: Signed<TxEip1559>) -> Result<Self> {
        let from = signed.recover_signer()?;
        let tx = signed.strip_signature();
        Ok(Self {
            kind: TransactionKind::Eip1559,
            chain_id: Some(tx.chain_id),
            nonce: tx.nonce,
            from,
            to: tx.to.to().copied(),
            value: tx.value,
            data: tx.input,
            gas_limit: tx.gas_limit,
            gas_price: tx.max_fee_per_gas,
        })
    }

    pub fn is_zksync(&self) -> bool {
        self.kind == TransactionKind::ZkSync
    }

    /// Re-derives the address of the deployed contract from the transaction alone.
    pub fn derive_address(&self, constants: &DeployerConstants) -> Result<Address> {
        let Some(to) = self.to else {
            return Ok(self.from.create(self.nonce));
        };
        if self.is_zksync() {
            if Some(to) != constants.zksync_contract_deployer {
                bail!("{to} is not the zkSync contract deployer");
            }
            let (salt, bytecode_hash, input) = decode_create2_call(&self.data)
                .wrap_err("transaction is not a `create2` deployment")?;
            return Ok(compute_create2_address(self.from, bytecode_hash, salt, &input));
        }
        if Some(to) != constants.create2_proxy {
            bail!("{to} is not the configured CREATE2 proxy");
        }
        if self.data.len() < 32 {
            bail!("CREATE2 proxy calldata is shorter than a salt");
        }
        let salt = B256::from_slice(&self.data[..32]);
        Ok(to.create2_from_code(salt, &self.data[32..]))
    }

    /// A call request replaying this transaction.
    pub fn call_request(&self) -> CallRequest {
        CallRequest {
            from: Some(self.from),
            to: self.to,
            data: self.data.clone(),
            value: self.value,
            nonce: Some(self.nonce),
            gas: Some(self.gas_limit),
            gas_price: Some(self.gas_price),
            zk: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Create2Flavor, DeploymentBuilder, DeploymentScheme};
    use alloy_primitives::bytes;
    use singleton_factory_wallets::LocalWallet;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn legacy_round_trip_recovers_signer() {
        let wallet = LocalWallet::from_private_key(KEY).unwrap();
        let constants = DeployerConstants { signer: wallet.address(), ..Default::default() };
        let tx = DeploymentBuilder::new(&constants)
            .build(
                &constants.factory_bytecode,
                1337,
                0,
                FeeParams::Legacy { gas_price: 100_000_000_000, gas_limit: 100_000 },
                &DeploymentScheme::NonceCreate,
                wallet.address(),
            )
            .unwrap();

        let signed = sign_deployment(&tx, &wallet).await.unwrap();
        let decoded = DecodedDeployment::decode(&signed.raw).unwrap();
        assert_eq!(decoded.kind, TransactionKind::Legacy);
        assert_eq!(decoded.from, wallet.address());
        assert_eq!(decoded.chain_id, Some(1337));
        assert_eq!(decoded.to, None);
        assert_eq!(decoded.data, constants.factory_bytecode);
        assert_eq!(decoded.derive_address(&constants).unwrap(), signed.address);
        assert_eq!(signed.address, wallet.address().create(0));
    }

    #[tokio::test]
    async fn eip1559_create2_round_trip() {
        let wallet = LocalWallet::from_private_key(KEY).unwrap();
        let constants = DeployerConstants::default();
        let scheme = DeploymentScheme::Create2 {
            salt: B256::with_last_byte(1),
            constructor_input: Bytes::new(),
            flavor: Create2Flavor::Evm,
        };
        let fees = FeeParams::Eip1559 {
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            gas_limit: 200_000,
        };
        let tx = DeploymentBuilder::new(&constants)
            .build(&bytes!("6000"), 10, 5, fees, &scheme, wallet.address())
            .unwrap();

        let signed = sign_deployment(&tx, &wallet).await.unwrap();
        assert_eq!(signed.raw[0], 0x02);
        let decoded = DecodedDeployment::decode(&signed.raw).unwrap();
        assert_eq!(decoded.kind, TransactionKind::Eip1559);
        assert_eq!(decoded.nonce, 5);
        assert_eq!(decoded.gas_price, 30_000_000_000);
        assert_eq!(decoded.derive_address(&constants).unwrap(), tx.expected_address);
    }

    #[tokio::test]
    async fn zksync_round_trip() {
        let wallet = LocalWallet::from_private_key(KEY).unwrap();
        let constants = DeployerConstants::default();
        let fees = FeeParams::ZkSync {
            max_fee_per_gas: 50_000_000,
            max_priority_fee_per_gas: 0,
            gas_limit: 5_000_000,
            gas_per_pubdata: U256::from(50_000),
            factory_deps: vec![],
            paymaster: None,
        };
        let bytecode = Bytes::from(vec![0u8; 96]);
        let scheme = DeploymentScheme::zksync();
        let tx = DeploymentBuilder::new(&constants)
            .build(&bytecode, 324, 2, fees, &scheme, wallet.address())
            .unwrap();

        let signed = sign_deployment(&tx, &wallet).await.unwrap();
        let decoded = DecodedDeployment::decode(&signed.raw).unwrap();
        assert!(decoded.is_zksync());
        assert_eq!(decoded.from, wallet.address());
        assert_eq!(decoded.derive_address(&constants).unwrap(), tx.expected_address);
    }

    #[tokio::test]
    async fn rejects_foreign_sender() {
        let wallet = LocalWallet::from_private_key(KEY).unwrap();
        let constants = DeployerConstants::default();
        let tx = DeploymentBuilder::new(&constants)
            .build(
                &constants.factory_bytecode,
                1,
                0,
                FeeParams::Legacy { gas_price: 1, gas_limit: 1 },
                &DeploymentScheme::NonceCreate,
                constants.signer,
            )
            .unwrap();
        assert!(sign_deployment(&tx, &wallet).await.is_err());
    }
}
