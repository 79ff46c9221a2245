//! Pre-deployment checks for a chain requesting the factory.
//!
//! The checks run in a fixed order and stop at the first failure. Everything observed along the
//! way is kept in the [`ChainEligibilityReport`], which is always produced.

use crate::artifact::ArtifactStore;
use alloy_primitives::{B256, Bytes, U256, keccak256, utils::format_ether};
use async_trait::async_trait;
use eyre::Result;
use serde::{Serialize, Serializer};
use singleton_factory_common::{
    CallRequest, ChainRpc, DeployerConstants, DeploymentFailure, FailureKind,
};
use std::{fmt, str::FromStr};
use tracing::{debug, instrument};

/// Base URL of the `ethereum-lists/chains` registry entries.
pub const CHAINLIST_BASE_URL: &str =
    "https://raw.githubusercontent.com/ethereum-lists/chains/master/_data/chains";

/// Response of an eligible chain.
pub const ELIGIBLE_RESPONSE: &str = "**✅ Success:**<br>The issue description is valid:<br>- The RPC URL is valid<br>- The chain is in the chainlist<br>- The deployer address is pre-funded<br>:sparkles: The team will be in touch with you soon :sparkles:";

/// A public registry of chain IDs.
#[async_trait]
pub trait ChainRegistry: Send + Sync {
    /// Location of the registry entry for `chain_id`.
    fn entry_url(&self, chain_id: u64) -> String;

    async fn is_listed(&self, chain_id: u64) -> Result<bool>;
}

/// The `ethereum-lists/chains` registry over HTTP.
#[derive(Clone, Debug)]
pub struct ChainlistRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl Default for ChainlistRegistry {
    fn default() -> Self {
        Self::new(CHAINLIST_BASE_URL)
    }
}

impl ChainlistRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl ChainRegistry for ChainlistRegistry {
    fn entry_url(&self, chain_id: u64) -> String {
        format!("{}/eip155-{chain_id}.json", self.base_url.trim_end_matches('/'))
    }

    async fn is_listed(&self, chain_id: u64) -> Result<bool> {
        let url = self.entry_url(chain_id);
        let response = self.client.get(&url).send().await?;
        debug!(%url, status = %response.status(), "chain registry lookup");
        Ok(response.status().is_success())
    }
}

/// Multiplier applied to the estimated deployment cost, in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefundBuffer(pub u64);

impl Default for PrefundBuffer {
    fn default() -> Self {
        Self(150)
    }
}

impl PrefundBuffer {
    pub fn apply(&self, cost: U256) -> U256 {
        cost * U256::from(self.0) / U256::from(100)
    }
}

impl FromStr for PrefundBuffer {
    type Err = String;

    /// Accepts a percentage (`150`, `150%`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let percent = s.strip_suffix('%').unwrap_or(s).trim();
        percent
            .parse()
            .map(Self)
            .map_err(|_| format!("invalid prefund buffer `{s}`, expected a percentage"))
    }
}

impl fmt::Display for PrefundBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Hint for the issue automation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum LabelOperation {
    #[default]
    #[serde(rename = "--remove-label")]
    Remove,
    #[serde(rename = "--add-label")]
    Add,
}

/// Terminal outcome of the checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EligibilityOutcome {
    Eligible,
    Failed(DeploymentFailure),
}

impl EligibilityOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Eligible => 0,
            Self::Failed(failure) => failure.exit_code(),
        }
    }

    pub fn failure(&self) -> Option<&DeploymentFailure> {
        match self {
            Self::Eligible => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

impl fmt::Display for EligibilityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eligible => f.write_str("Eligible"),
            Self::Failed(failure) => fmt::Display::fmt(&failure.kind, f),
        }
    }
}

impl Serialize for EligibilityOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Observations of an eligibility run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEligibilityReport {
    pub label_operation: LabelOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chainlist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_chainlist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codehash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    /// Decimal wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    /// Required funds including the prefund buffer, decimal wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_codehash: Option<B256>,
    /// Deployer balance in ether.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    pub outcome: EligibilityOutcome,
    pub response: String,
}

impl Default for ChainEligibilityReport {
    fn default() -> Self {
        Self {
            label_operation: LabelOperation::Remove,
            chain_id: None,
            chainlist: None,
            on_chainlist: None,
            nonce: None,
            codehash: None,
            code: None,
            gas_price: None,
            gas_limit: None,
            gas_estimate: None,
            simulation: None,
            simulation_codehash: None,
            balance: None,
            outcome: EligibilityOutcome::Eligible,
            response: String::new(),
        }
    }
}

impl ChainEligibilityReport {
    /// Pretty JSON, two space indented.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs the eligibility checks.
#[derive(Clone, Copy)]
pub struct EligibilityChecker<'a> {
    constants: &'a DeployerConstants,
    store: &'a ArtifactStore,
    registry: &'a dyn ChainRegistry,
    buffer: PrefundBuffer,
}

impl<'a> EligibilityChecker<'a> {
    pub fn new(
        constants: &'a DeployerConstants,
        store: &'a ArtifactStore,
        registry: &'a dyn ChainRegistry,
    ) -> Self {
        Self { constants, store, registry, buffer: PrefundBuffer::default() }
    }

    pub fn with_buffer(mut self, buffer: PrefundBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    /// Checks the chain behind `rpc`.
    ///
    /// `rpc` carries the failure of resolving the RPC URL, if any.
    #[instrument(skip_all)]
    pub async fn check(
        &self,
        rpc: Result<&dyn ChainRpc, DeploymentFailure>,
    ) -> ChainEligibilityReport {
        let mut report = ChainEligibilityReport::default();
        match self.run(rpc, &mut report).await {
            Ok(()) => {
                report.outcome = EligibilityOutcome::Eligible;
                report.label_operation = LabelOperation::Add;
                report.response = ELIGIBLE_RESPONSE.to_string();
            }
            Err(failure) => {
                debug!(%failure, "chain is not eligible");
                report.response = failure.message().to_string();
                report.outcome = EligibilityOutcome::Failed(failure);
            }
        }
        report
    }

    async fn run(
        &self,
        rpc: Result<&dyn ChainRpc, DeploymentFailure>,
        report: &mut ChainEligibilityReport,
    ) -> Result<(), DeploymentFailure> {
        let rpc = rpc?;
        let signer = self.constants.signer;
        let address = self.constants.factory_address;

        let chain_id = rpc.chain_id().await.map_err(unknown)?;
        report.chain_id = Some(chain_id);

        if self.store.exists(chain_id).map_err(unknown)? {
            return Err(failure(FailureKind::FactoryAlreadyDeployed).with("chainId", chain_id));
        }

        report.chainlist = Some(self.registry.entry_url(chain_id));
        let listed = self.registry.is_listed(chain_id).await.map_err(unknown)?;
        report.on_chainlist = Some(listed);
        if !listed {
            return Err(failure(FailureKind::ChainNotListed).with("chainId", chain_id));
        }

        let (nonce, code) =
            tokio::try_join!(rpc.transaction_count(signer), rpc.code(address)).map_err(unknown)?;
        let codehash = keccak256(&code);
        report.nonce = Some(nonce);
        report.codehash = Some(codehash);
        report.code = Some(code.clone());

        if !code.is_empty() {
            if codehash != self.constants.codehash {
                return Err(failure(FailureKind::FactoryDifferentBytecode)
                    .with("address", address)
                    .with("codehash", codehash)
                    .with("expected", self.constants.codehash));
            }
            let kind = if nonce == 0 {
                FailureKind::FactoryPreDeployed
            } else {
                FailureKind::FactoryNotAddedToRepo
            };
            return Err(failure(kind).with("address", address));
        }
        if nonce > 0 {
            return Err(failure(FailureKind::FactoryDeployerAccountNonceBurned)
                .with("signer", signer)
                .with("nonce", nonce)
                .with("address", address));
        }

        let gas_price =
            rpc.gas_price().await.map_err(|_| failure(FailureKind::GasPriceNotRetrieved))?;
        let request = CallRequest::create(signer, self.constants.factory_bytecode.clone());
        let gas_limit = match rpc.estimate_gas(&request).await {
            Ok(0) => return Err(failure(FailureKind::GasLimitNotEstimated)),
            Ok(limit) => limit,
            Err(err) => {
                return Err(failure(FailureKind::GasLimitEstimationFailed)
                    .with("reason", format!("{err:#}")));
            }
        };
        let required = self.buffer.apply(U256::from(gas_price) * U256::from(gas_limit));
        report.gas_price = Some(gas_price.to_string());
        report.gas_limit = Some(gas_limit.to_string());
        report.gas_estimate = Some(required.to_string());

        let simulation = rpc.call(&request).await.map_err(|err| {
            failure(FailureKind::DeploymentSimulationFailed).with("reason", format!("{err:#}"))
        })?;
        let simulation_codehash = keccak256(&simulation);
        report.simulation = Some(simulation);
        report.simulation_codehash = Some(simulation_codehash);
        if simulation_codehash != self.constants.codehash {
            return Err(failure(FailureKind::FactoryDeploymentSimulationDifferentBytecode)
                .with("codehash", simulation_codehash)
                .with("expected", self.constants.codehash));
        }

        let balance = rpc.balance(signer).await.map_err(unknown)?;
        report.balance = Some(format_ether(balance));
        if balance < required {
            return Err(failure(FailureKind::PrefundNeeded)
                .with("signer", signer)
                .with("shortfall", required - balance)
                .with("required", required));
        }

        Ok(())
    }
}

fn failure(kind: FailureKind) -> DeploymentFailure {
    DeploymentFailure::new(kind)
}

fn unknown(err: eyre::Report) -> DeploymentFailure {
    DeploymentFailure::unknown(format!("{err:#}"))
}
