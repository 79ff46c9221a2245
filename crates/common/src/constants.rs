//! Well-known deployer constants.
//!
//! The deterministic address guarantee only holds as long as every chain sees the same signer,
//! the same init code and the same nonce. These values are bundled into [`DeployerConstants`] and
//! passed explicitly to every component, so that alternate fixture sets (e.g. a testnet deployer)
//! can be swapped in without touching global state.

use alloy_primitives::{Address, B256, Bytes, address, b256, bytes};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Address of the deployer account whose nonce-0 transaction creates the factory.
pub const SAFE_FACTORY_SIGNER: Address = address!("0xE1CB04A0fA36DdD16a06ea828007E35e1a3cBC37");

/// Address of the singleton factory on every chain that supports legacy transactions.
pub const SAFE_FACTORY_ADDRESS: Address = address!("0x914d7Fec6aaC8cd542e72Bca78B30650d45643d7");

/// `keccak256` of the factory runtime code.
pub const SAFE_FACTORY_CODEHASH: B256 =
    b256!("0x2fa86add0aed31f33a762c9d88e807c475bd51d0f52bd0955754b2608f7e4989");

/// Init code of the singleton factory, as produced by compiling
/// `deterministic-deployment-proxy.yul`.
pub const SAFE_FACTORY_BYTECODE: Bytes = bytes!(
    "604580600e600039806000f350fe7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe03601600081602082378035828234f58015156039578182fd5b8082525050506014600cf3"
);

/// zkSync system contract deployer.
pub const ZKSYNC_CONTRACT_DEPLOYER: Address =
    address!("0x0000000000000000000000000000000000008006");

/// Immutable set of constants every pipeline stage is checked against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployerConstants {
    /// The well-known deployer account.
    pub signer: Address,
    /// Expected address of the factory for the nonce-based flow.
    pub factory_address: Address,
    /// Expected `keccak256` of the deployed factory code.
    pub codehash: B256,
    /// Init code used for gas estimation and simulation.
    pub factory_bytecode: Bytes,
    /// CREATE2 proxy used by the EVM flavor of salted deployments.
    #[serde(default)]
    pub create2_proxy: Option<Address>,
    /// System contract deployer used by the zkSync flavor of salted deployments.
    #[serde(default)]
    pub zksync_contract_deployer: Option<Address>,
    /// Expected `keccak256` of the factory code on zkSync chains, if known.
    #[serde(default)]
    pub zksync_codehash: Option<B256>,
}

impl Default for DeployerConstants {
    fn default() -> Self {
        Self::safe_singleton_factory()
    }
}

impl DeployerConstants {
    /// The canonical Safe singleton factory constants.
    pub fn safe_singleton_factory() -> Self {
        Self {
            signer: SAFE_FACTORY_SIGNER,
            factory_address: SAFE_FACTORY_ADDRESS,
            codehash: SAFE_FACTORY_CODEHASH,
            factory_bytecode: SAFE_FACTORY_BYTECODE,
            create2_proxy: Some(SAFE_FACTORY_ADDRESS),
            zksync_contract_deployer: Some(ZKSYNC_CONTRACT_DEPLOYER),
            zksync_codehash: None,
        }
    }

    /// Loads a constants set from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read constants from {}", path.display()))?;
        toml::from_str(&contents)
            .wrap_err_with(|| format!("failed to parse constants from {}", path.display()))
    }

    /// Address created by the deployer account at `nonce`.
    pub fn create_address(&self, nonce: u64) -> Address {
        self.signer.create(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_address_is_signer_nonce_zero() {
        let constants = DeployerConstants::default();
        assert_eq!(constants.create_address(0), constants.factory_address);
    }

    #[test]
    fn loads_partial_constants_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constants.toml");
        std::fs::write(
            &path,
            r#"
signer = "0x0000000000000000000000000000000000000001"
factoryAddress = "0x0000000000000000000000000000000000000002"
codehash = "0x0000000000000000000000000000000000000000000000000000000000000003"
factoryBytecode = "0x6000"
"#,
        )
        .unwrap();

        let constants = DeployerConstants::load(&path).unwrap();
        assert_eq!(constants.signer, Address::with_last_byte(1));
        assert_eq!(constants.factory_bytecode, bytes!("6000"));
        assert_eq!(constants.create2_proxy, None);
        assert_eq!(constants.zksync_contract_deployer, None);
    }
}
