//! Construction of the unsigned deployment transaction.

use alloy_primitives::{Address, B256, Bytes, U256};
use singleton_factory_common::DeployerConstants;
use singleton_factory_zksync::{
    BytecodeHashError, PaymasterParams, compute_create2_address, encode_create2_call,
    hash_bytecode,
};

/// How the contract address is derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeploymentScheme {
    /// Plain contract creation; the address depends on the sender and nonce only.
    NonceCreate,
    /// Salted deployment through a deployer contract.
    Create2 { salt: B256, constructor_input: Bytes, flavor: Create2Flavor },
}

impl DeploymentScheme {
    /// A zkSync salted deployment with the zero salt and no constructor input.
    pub fn zksync() -> Self {
        Self::Create2 {
            salt: B256::ZERO,
            constructor_input: Bytes::new(),
            flavor: Create2Flavor::ZkSync,
        }
    }

    pub fn is_zksync(&self) -> bool {
        matches!(self, Self::Create2 { flavor: Create2Flavor::ZkSync, .. })
    }
}

/// Deployer contract used by [`DeploymentScheme::Create2`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Create2Flavor {
    /// `salt ++ initcode` sent to the configured CREATE2 proxy.
    Evm,
    /// `create2(salt, bytecodeHash, input)` sent to the system contract deployer.
    ZkSync,
}

/// Fee fields of the transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum FeeParams {
    Legacy {
        gas_price: u128,
        gas_limit: u64,
    },
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
        gas_limit: u64,
    },
    ZkSync {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
        gas_limit: u64,
        gas_per_pubdata: U256,
        /// Extra factory dependencies; the deployed bytecode is always added.
        factory_deps: Vec<Bytes>,
        paymaster: Option<PaymasterParams>,
    },
}

impl FeeParams {
    pub fn gas_limit(&self) -> u64 {
        match self {
            Self::Legacy { gas_limit, .. }
            | Self::Eip1559 { gas_limit, .. }
            | Self::ZkSync { gas_limit, .. } => *gas_limit,
        }
    }

    /// The legacy gas price, or the max fee per gas.
    pub fn gas_price(&self) -> u128 {
        match self {
            Self::Legacy { gas_price, .. } => *gas_price,
            Self::Eip1559 { max_fee_per_gas, .. } | Self::ZkSync { max_fee_per_gas, .. } => {
                *max_fee_per_gas
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("bytecode must not be empty")]
    EmptyBytecode,
    #[error("chain ID must not be zero")]
    ZeroChainId,
    #[error("no {0} is configured")]
    ProxyNotConfigured(&'static str),
    #[error("{fees} fees cannot be used with {scheme} deployments")]
    IncompatibleFees { fees: &'static str, scheme: &'static str },
    #[error(transparent)]
    ZkBytecode(#[from] BytecodeHashError),
}

/// A deployment transaction ready to be signed.
#[derive(Clone, Debug, PartialEq)]
pub struct UnsignedDeploymentTransaction {
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub chain_id: u64,
    pub nonce: u64,
    pub value: U256,
    pub data: Bytes,
    pub fees: FeeParams,
    /// Address the contract will be deployed at.
    pub expected_address: Address,
}

/// Builds deployment transactions against a set of [`DeployerConstants`].
#[derive(Clone, Copy, Debug)]
pub struct DeploymentBuilder<'a> {
    constants: &'a DeployerConstants,
}

impl<'a> DeploymentBuilder<'a> {
    pub fn new(constants: &'a DeployerConstants) -> Self {
        Self { constants }
    }

    /// Builds the unsigned transaction deploying `bytecode`.
    ///
    /// For the zkSync flavor `bytecode` is the zk bytecode; otherwise it is EVM init code.
    pub fn build(
        &self,
        bytecode: &Bytes,
        chain_id: u64,
        nonce: u64,
        fees: FeeParams,
        scheme: &DeploymentScheme,
        from: Address,
    ) -> Result<UnsignedDeploymentTransaction, BuildError> {
        if bytecode.is_empty() {
            return Err(BuildError::EmptyBytecode);
        }
        if chain_id == 0 {
            return Err(BuildError::ZeroChainId);
        }

        let (to, data, expected_address, fees) = match scheme {
            DeploymentScheme::NonceCreate => {
                ensure_evm_fees(&fees, "nonce")?;
                (None, bytecode.clone(), from.create(nonce), fees)
            }
            DeploymentScheme::Create2 { salt, constructor_input, flavor: Create2Flavor::Evm } => {
                ensure_evm_fees(&fees, "CREATE2")?;
                let proxy = self
                    .constants
                    .create2_proxy
                    .ok_or(BuildError::ProxyNotConfigured("CREATE2 proxy"))?;
                let initcode = [bytecode.as_ref(), constructor_input.as_ref()].concat();
                let address = proxy.create2_from_code(*salt, &initcode);
                let data = [salt.as_slice(), &initcode].concat();
                (Some(proxy), data.into(), address, fees)
            }
            DeploymentScheme::Create2 { salt, constructor_input, flavor: Create2Flavor::ZkSync } => {
                let deployer = self
                    .constants
                    .zksync_contract_deployer
                    .ok_or(BuildError::ProxyNotConfigured("zkSync contract deployer"))?;
                let fees = match fees {
                    FeeParams::ZkSync {
                        max_fee_per_gas,
                        max_priority_fee_per_gas,
                        gas_limit,
                        gas_per_pubdata,
                        mut factory_deps,
                        paymaster,
                    } => {
                        if !factory_deps.contains(bytecode) {
                            factory_deps.push(bytecode.clone());
                        }
                        FeeParams::ZkSync {
                            max_fee_per_gas,
                            max_priority_fee_per_gas,
                            gas_limit,
                            gas_per_pubdata,
                            factory_deps,
                            paymaster,
                        }
                    }
                    other => {
                        return Err(BuildError::IncompatibleFees {
                            fees: fees_name(&other),
                            scheme: "zkSync CREATE2",
                        });
                    }
                };
                let bytecode_hash = hash_bytecode(bytecode)?;
                let address =
                    compute_create2_address(from, bytecode_hash, *salt, constructor_input);
                let data = encode_create2_call(*salt, bytecode_hash, constructor_input.clone());
                (Some(deployer), data, address, fees)
            }
        };

        Ok(UnsignedDeploymentTransaction {
            from,
            to,
            chain_id,
            nonce,
            value: U256::ZERO,
            data,
            fees,
            expected_address,
        })
    }
}

fn ensure_evm_fees(fees: &FeeParams, scheme: &'static str) -> Result<(), BuildError> {
    match fees {
        FeeParams::ZkSync { .. } => Err(BuildError::IncompatibleFees { fees: "zkSync", scheme }),
        _ => Ok(()),
    }
}

fn fees_name(fees: &FeeParams) -> &'static str {
    match fees {
        FeeParams::Legacy { .. } => "legacy",
        FeeParams::Eip1559 { .. } => "EIP-1559",
        FeeParams::ZkSync { .. } => "zkSync",
    }
}
