//! External signing devices.
//!
//! A device only ever returns a one byte recovery indicator next to `r` and `s`. For EIP-155
//! transactions that byte is `chainId * 2 + 35 + yParity` truncated to 8 bits, so it cannot be
//! used as is once the chain ID exceeds 110. [`DeviceSigner`] recovers the parity from the byte and
//! checks every signature against the device address before handing it out.
//!
//! zkSync EIP-712 transactions are signed in hashed mode from the domain separator and struct hash.

use crate::signer::DeploymentSigner;
use alloy_consensus::{SignableTransaction, Transaction};
use alloy_eips::Typed2718;
use alloy_primitives::{Address, B256, Signature, U256};
use async_trait::async_trait;
use eyre::Result;
use singleton_factory_zksync::EIP712_TX_TYPE;
use tracing::debug;

/// Transaction type of legacy transactions.
const LEGACY_TX_TYPE: u8 = 0;

/// A signature as returned by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawSignature {
    /// Raw recovery indicator.
    pub v: u8,
    pub r: U256,
    pub s: U256,
}

/// Errors produced while normalizing device signatures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeviceSignatureError {
    #[error("unexpected recovery indicator {0} from the signing device")]
    InvalidRecoveryId(u8),
    #[error("device signature recovers to {recovered}, expected {expected}")]
    SignerMismatch { recovered: Address, expected: Address },
    #[error("EIP-712 signing payload of {0} bytes is not `0x1901 || domainSeparator || structHash`")]
    MalformedTypedPayload(usize),
}

/// Low level access to a hardware signing device.
#[async_trait]
pub trait SigningDevice: Send + Sync {
    /// Address of the configured account.
    async fn address(&self) -> Result<Address>;

    /// Signs the unsigned transaction payload, as encoded for signing.
    async fn sign_transaction_payload(&self, payload: &[u8]) -> Result<RawSignature>;

    /// Signs an EIP-712 message in hashed (blind signing) mode.
    async fn sign_typed_data_hashed(
        &self,
        domain_separator: B256,
        struct_hash: B256,
    ) -> Result<RawSignature>;
}

/// Derives the y-parity of an EIP-155 legacy signature from the device indicator.
///
/// `chainId * 2 + 35` is odd, and truncating to a byte does not change the parity, so the parity
/// is the complement of the indicator's low bit.
pub fn eip155_parity(v: u8) -> bool {
    (v & 1) ^ 1 == 1
}

/// Maps `{0, 1, 27, 28}` to a y-parity.
pub fn plain_parity(v: u8) -> Result<bool, DeviceSignatureError> {
    match v {
        0 | 27 => Ok(false),
        1 | 28 => Ok(true),
        _ => Err(DeviceSignatureError::InvalidRecoveryId(v)),
    }
}

/// Splits `0x1901 || domainSeparator || structHash` into its two hashes.
pub fn typed_data_parts(payload: &[u8]) -> Result<(B256, B256), DeviceSignatureError> {
    match payload {
        [0x19, 0x01, rest @ ..] if rest.len() == 64 => {
            Ok((B256::from_slice(&rest[..32]), B256::from_slice(&rest[32..])))
        }
        _ => Err(DeviceSignatureError::MalformedTypedPayload(payload.len())),
    }
}

/// [`DeploymentSigner`] backed by a [`SigningDevice`].
#[derive(Debug)]
pub struct DeviceSigner<D> {
    device: D,
    address: Address,
}

impl<D: SigningDevice> DeviceSigner<D> {
    /// Queries the device for its address.
    pub async fn connect(device: D) -> Result<Self> {
        let address = device.address().await?;
        debug!(%address, "connected to signing device");
        Ok(Self { device, address })
    }

    fn checked(&self, signature: Signature, prehash: &B256) -> Result<Signature> {
        let recovered = signature.recover_address_from_prehash(prehash)?;
        if recovered != self.address {
            return Err(DeviceSignatureError::SignerMismatch { recovered, expected: self.address }
                .into());
        }
        Ok(signature)
    }
}

#[async_trait]
impl<D: SigningDevice> DeploymentSigner for DeviceSigner<D> {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transaction(
        &self,
        tx: &mut dyn SignableTransaction<Signature>,
    ) -> Result<Signature> {
        let payload = tx.encoded_for_signing();
        let raw = if tx.ty() == EIP712_TX_TYPE {
            let (domain_separator, struct_hash) = typed_data_parts(&payload)?;
            self.device.sign_typed_data_hashed(domain_separator, struct_hash).await?
        } else {
            self.device.sign_transaction_payload(&payload).await?
        };
        let parity = match (tx.ty(), tx.chain_id()) {
            (LEGACY_TX_TYPE, Some(_)) => eip155_parity(raw.v),
            _ => plain_parity(raw.v)?,
        };
        self.checked(Signature::new(raw.r, raw.s, parity), &tx.signature_hash())
    }
}
