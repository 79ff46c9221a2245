//! Failure taxonomy shared by the deployment pipeline and the eligibility checker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of failure tags.
///
/// Every tag maps to a stable process exit code and a message template whose `{name}` placeholders
/// are filled from the parameters carried by [`DeploymentFailure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    RpcUrlNotFound,
    FactoryAlreadyDeployed,
    ChainNotListed,
    FactoryDifferentBytecode,
    FactoryPreDeployed,
    FactoryNotAddedToRepo,
    FactoryDeployerAccountNonceBurned,
    GasPriceNotRetrieved,
    GasLimitNotEstimated,
    GasLimitEstimationFailed,
    DeploymentSimulationFailed,
    FactoryDeploymentSimulationDifferentBytecode,
    PrefundNeeded,
    NonceMismatch,
    DeploymentReverted,
    BytecodeIntegrityMismatch,
    UnknownError,
}

impl FailureKind {
    /// All tags, in exit code order.
    pub const ALL: [Self; 17] = [
        Self::UnknownError,
        Self::RpcUrlNotFound,
        Self::FactoryAlreadyDeployed,
        Self::ChainNotListed,
        Self::FactoryDifferentBytecode,
        Self::FactoryPreDeployed,
        Self::FactoryNotAddedToRepo,
        Self::FactoryDeployerAccountNonceBurned,
        Self::GasPriceNotRetrieved,
        Self::GasLimitNotEstimated,
        Self::GasLimitEstimationFailed,
        Self::DeploymentSimulationFailed,
        Self::FactoryDeploymentSimulationDifferentBytecode,
        Self::PrefundNeeded,
        Self::NonceMismatch,
        Self::DeploymentReverted,
        Self::BytecodeIntegrityMismatch,
    ];

    /// Process exit code for this tag.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::UnknownError => 1,
            Self::RpcUrlNotFound => 10,
            Self::FactoryAlreadyDeployed => 11,
            Self::ChainNotListed => 12,
            Self::FactoryDifferentBytecode => 13,
            Self::FactoryPreDeployed => 14,
            Self::FactoryNotAddedToRepo => 15,
            Self::FactoryDeployerAccountNonceBurned => 16,
            Self::GasPriceNotRetrieved => 17,
            Self::GasLimitNotEstimated => 18,
            Self::GasLimitEstimationFailed => 19,
            Self::DeploymentSimulationFailed => 20,
            Self::FactoryDeploymentSimulationDifferentBytecode => 21,
            Self::PrefundNeeded => 22,
            Self::NonceMismatch => 23,
            Self::DeploymentReverted => 24,
            Self::BytecodeIntegrityMismatch => 25,
        }
    }

    /// Message template, with `{name}` placeholders.
    pub const fn template(self) -> &'static str {
        match self {
            Self::RpcUrlNotFound => "no RPC URL was provided or it could not be parsed",
            Self::FactoryAlreadyDeployed => {
                "the factory is already deployed on chain {chainId} and its artifact is present"
            }
            Self::ChainNotListed => "chain {chainId} is not listed in the public chain registry",
            Self::FactoryDifferentBytecode => {
                "code at the factory address {address} has codehash {codehash}, expected {expected}"
            }
            Self::FactoryPreDeployed => {
                "the factory is already present at {address} while the deployer nonce is still 0"
            }
            Self::FactoryNotAddedToRepo => {
                "the factory is deployed at {address} but its artifact was never added"
            }
            Self::FactoryDeployerAccountNonceBurned => {
                "the deployer account {signer} already used nonce {nonce}, the factory can no longer be deployed at {address}"
            }
            Self::GasPriceNotRetrieved => "the gas price could not be retrieved",
            Self::GasLimitNotEstimated => "the gas limit estimate for the deployment was zero",
            Self::GasLimitEstimationFailed => "gas estimation for the deployment failed: {reason}",
            Self::DeploymentSimulationFailed => "the deployment simulation failed: {reason}",
            Self::FactoryDeploymentSimulationDifferentBytecode => {
                "the simulated deployment produced codehash {codehash}, expected {expected}"
            }
            Self::PrefundNeeded => {
                "the deployer account {signer} must be funded with {shortfall} wei to cover the required {required} wei"
            }
            Self::NonceMismatch => {
                "the transaction uses nonce {expected} but the sender nonce on chain is {actual}"
            }
            Self::DeploymentReverted => "the deployment transaction {hash} reverted",
            Self::BytecodeIntegrityMismatch => {
                "code at {address} has codehash {codehash}, expected {expected}"
            }
            Self::UnknownError => "{reason}",
        }
    }

    /// Returns the tag for the given exit code, if any.
    pub fn from_exit_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.exit_code() == code)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A tagged failure with its interpolation parameters.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DeploymentFailure {
    pub kind: FailureKind,
    pub params: Vec<(&'static str, String)>,
    message: String,
}

impl DeploymentFailure {
    pub fn new(kind: FailureKind) -> Self {
        Self { kind, params: Vec::new(), message: kind.template().to_string() }
    }

    /// Adds an interpolation parameter.
    pub fn with(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.params.push((name, value.to_string()));
        self.message = render(self.kind.template(), &self.params);
        self
    }

    /// Shorthand for an [`FailureKind::UnknownError`] carrying `reason`.
    pub fn unknown(reason: impl fmt::Display) -> Self {
        Self::new(FailureKind::UnknownError).with("reason", reason)
    }

    /// The rendered message, without the tag.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the value of the named parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(key, _)| *key == name).map(|(_, value)| value.as_str())
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl From<FailureKind> for DeploymentFailure {
    fn from(kind: FailureKind) -> Self {
        Self::new(kind)
    }
}

/// Maps an error report to a process exit code.
///
/// Reports that do not carry a [`DeploymentFailure`] anywhere in their chain are unclassified.
pub fn exit_code(report: &eyre::Report) -> i32 {
    report
        .chain()
        .find_map(|err| err.downcast_ref::<DeploymentFailure>())
        .map(DeploymentFailure::exit_code)
        .unwrap_or(FailureKind::UnknownError.exit_code())
}

fn render(template: &str, params: &[(&'static str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
