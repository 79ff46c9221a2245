//! # singleton-factory
//!
//! Deploys the singleton CREATE2 factory to the same address on every chain.
//!
//! The deployment is a pre-signed transaction from a well-known deployer account: built and signed
//! once per chain, persisted as an artifact, then simulated, broadcast and verified against the
//! expected code hash. [`eligibility`] decides whether a new chain can get the factory at all.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod args;
pub mod artifact;
pub mod builder;
pub mod cmd;
pub mod eligibility;
pub mod gas;
pub mod opts;
pub mod submit;
pub mod transaction;
pub mod verify;

pub use artifact::{ArtifactExists, ArtifactStore, DeploymentArtifact};
pub use builder::{
    BuildError, Create2Flavor, DeploymentBuilder, DeploymentScheme, FeeParams,
    UnsignedDeploymentTransaction,
};
pub use eligibility::{
    ChainEligibilityReport, ChainRegistry, ChainlistRegistry, EligibilityChecker,
    EligibilityOutcome, PrefundBuffer,
};
pub use gas::{GasEstimate, GasMultipliers};
pub use submit::{DeploymentPipeline, PrepareRequest, Stage, SubmitOptions, SubmitOutcome};
pub use transaction::{DecodedDeployment, SignedDeployment, TransactionKind, sign_deployment};
pub use verify::{VerificationReport, verify_deployment};
