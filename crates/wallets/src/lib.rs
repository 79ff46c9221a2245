//! # singleton-factory-wallets
//!
//! Signing backends for the deployment transaction.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod device;
pub mod ledger;
pub mod opts;
pub mod signer;

pub use device::{DeviceSignatureError, DeviceSigner, RawSignature, SigningDevice};
pub use ledger::LedgerDevice;
pub use opts::WalletOpts;
pub use signer::{DeploymentSigner, LocalWallet};
