use crate::EIP712_TX_TYPE;
use alloy_consensus::{SignableTransaction, Signed};
use alloy_eips::eip2718::{Decodable2718, Eip2718Error, Encodable2718};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, Signature, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_zksync::network::{
    transaction_request::TransactionRequest as ZkTransactionRequest,
    tx_envelope::TxEnvelope,
    unsigned_tx::{
        TypedTransaction,
        eip712::{PaymasterParams, TxEip712},
    },
};

/// Errors building or decoding an EIP-712 transaction.
#[derive(Debug, thiserror::Error)]
pub enum Eip712Error {
    /// The request is missing fields of an EIP-712 transaction.
    #[error("failed to build the EIP-712 transaction: {0}")]
    Build(String),
    /// The transaction has another type.
    #[error("not a zkSync EIP-712 transaction")]
    NotEip712,
    /// The raw bytes are malformed.
    #[error("failed to decode the EIP-712 transaction: {0}")]
    Decode(#[from] Eip2718Error),
}

/// The fields of a deployment sent as a zkSync EIP-712 transaction.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct Eip712Fields {
    pub chain_id: u64,
    pub nonce: u64,
    pub from: Address,
    pub to: Address,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub gas_per_pubdata: U256,
    pub value: U256,
    pub data: Bytes,
    pub factory_deps: Vec<Bytes>,
    pub paymaster: Option<PaymasterParams>,
}

impl Eip712Fields {
    /// The zkSync transaction request carrying these fields.
    pub fn into_request(self) -> ZkTransactionRequest {
        let base = TransactionRequest::default()
            .transaction_type(EIP712_TX_TYPE)
            .from(self.from)
            .to(self.to)
            .nonce(self.nonce)
            .value(self.value)
            .input(self.data.into())
            .gas_limit(self.gas_limit)
            .max_fee_per_gas(self.max_fee_per_gas)
            .max_priority_fee_per_gas(self.max_priority_fee_per_gas);
        let mut request = <ZkTransactionRequest as From<TransactionRequest>>::from(base);
        request.set_chain_id(self.chain_id);
        request.set_gas_per_pubdata(self.gas_per_pubdata);
        request.set_factory_deps(self.factory_deps);
        if let Some(paymaster) = self.paymaster {
            request.set_paymaster_params(paymaster);
        }
        request
    }

    /// Builds the unsigned EIP-712 transaction.
    pub fn build(self) -> Result<TxEip712, Eip712Error> {
        let unsigned = self
            .into_request()
            .build_unsigned()
            .map_err(|err| Eip712Error::Build(err.error.to_string()))?;
        match unsigned {
            TypedTransaction::Eip712(tx) => Ok(tx),
            TypedTransaction::Native(_) => Err(Eip712Error::NotEip712),
        }
    }
}

/// Serializes the signed transaction as `0x71 || rlp(fields)`.
pub fn encode_signed(tx: TxEip712, signature: Signature) -> Bytes {
    TxEnvelope::Eip712(tx.into_signed(signature)).encoded_2718().into()
}

/// Decodes a raw signed EIP-712 transaction.
pub fn decode_signed(raw: &[u8]) -> Result<Signed<TxEip712>, Eip712Error> {
    match TxEnvelope::decode_2718(&mut &raw[..])? {
        TxEnvelope::Eip712(signed) => Ok(signed),
        TxEnvelope::Native(_) => Err(Eip712Error::NotEip712),
    }
}
