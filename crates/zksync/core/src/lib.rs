//! # singleton-factory-zksync
//!
//! zkSync specific pieces of the singleton factory deployment: the zk bytecode hash, the system
//! contract deployer CREATE2 derivation and the EIP-712 (type `0x71`) deployment transaction.
#![warn(missing_docs, unused_crate_dependencies)]

/// Contains the zk bytecode hash and CREATE2 address derivation.
pub mod bytecode;

/// Contains the EIP-712 deployment transaction.
pub mod transaction;

use alloy_primitives::{B256, Bytes};
use alloy_sol_types::{SolCall, sol};
use alloy_zksync::contracts::l2::contract_deployer::create2Call;

pub use alloy_zksync::{
    contracts::l2::contract_deployer::CONTRACT_DEPLOYER_ADDRESS,
    network::unsigned_tx::eip712::{PaymasterParams, TxEip712},
};
pub use bytecode::{BytecodeHashError, compute_create2_address, hash_bytecode};
pub use transaction::{Eip712Error, Eip712Fields, decode_signed, encode_signed};

/// Transaction type of zkSync EIP-712 transactions.
pub const EIP712_TX_TYPE: u8 = 0x71;

/// Default gas per pubdata byte limit for EIP-712 transactions.
pub const DEFAULT_GAS_PER_PUBDATA: u64 = 50_000;

sol! {
    /// Input of the general paymaster flow.
    function general(bytes input);
}

/// Calldata of a `create2` call to the system contract deployer.
pub fn encode_create2_call(salt: B256, bytecode_hash: B256, input: Bytes) -> Bytes {
    create2Call::new((salt, bytecode_hash, input)).abi_encode().into()
}

/// Decodes `create2` calldata into `(salt, bytecodeHash, input)`.
pub fn decode_create2_call(data: &[u8]) -> alloy_sol_types::Result<(B256, B256, Bytes)> {
    Ok(create2Call::abi_decode(data)?.into())
}

/// Paymaster input for the general flow with an empty inner input.
pub fn general_paymaster_input() -> Bytes {
    generalCall { input: Default::default() }.abi_encode().into()
}
