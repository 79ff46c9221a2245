//! # singleton-factory-common
//!
//! Common utilities shared by the singleton factory deployment crates.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
pub mod io;

pub mod constants;
pub mod errors;
pub mod rpc;
pub mod utils;

pub use constants::DeployerConstants;
pub use errors::{DeploymentFailure, FailureKind};
pub use rpc::{AlloyRpc, CallRequest, ChainRpc, ReceiptSummary, ZkCallMeta};
