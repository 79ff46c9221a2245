//! The deployment pipeline: prepare, simulate, broadcast and confirm.

use crate::{
    artifact::{ArtifactStore, DeploymentArtifact},
    builder::{DeploymentBuilder, DeploymentScheme, FeeParams},
    transaction::{DecodedDeployment, sign_deployment},
    verify::load_artifact,
};
use alloy_primitives::{Address, B256, Bytes, keccak256};
use eyre::Result;
use singleton_factory_common::{
    ChainRpc, DeployerConstants, DeploymentFailure, FailureKind, ReceiptSummary, sh_warn,
};
use singleton_factory_wallets::DeploymentSigner;
use std::{fmt, time::Duration};
use tracing::{debug, info, instrument};

/// Default time to wait for the deployment receipt.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default receipt polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Pipeline stages, in the order they are reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Built,
    Signed,
    Persisted,
    Simulated,
    SimulationSkipped,
    Broadcast,
    Confirmed,
    /// The receipt did not arrive before the timeout.
    Unconfirmed,
    Reverted,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Built => "built",
            Self::Signed => "signed",
            Self::Persisted => "persisted",
            Self::Simulated => "simulated",
            Self::SimulationSkipped => "simulation skipped",
            Self::Broadcast => "broadcast",
            Self::Confirmed => "confirmed",
            Self::Unconfirmed => "unconfirmed",
            Self::Reverted => "reverted",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Stages reached by a pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageTrail {
    stages: Vec<Stage>,
}

impl StageTrail {
    pub fn record(&mut self, stage: Stage) {
        info!(%stage, "deployment stage");
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn last(&self) -> Option<Stage> {
        self.stages.last().copied()
    }
}

/// Everything needed to build the deployment transaction.
#[derive(Clone, Debug)]
pub struct PrepareRequest {
    /// EVM init code, or the zk bytecode for zkSync deployments.
    pub bytecode: Bytes,
    pub chain_id: u64,
    pub nonce: u64,
    pub fees: FeeParams,
    pub scheme: DeploymentScheme,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Replay the transaction with `eth_call` before broadcasting it.
    pub simulate: bool,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            simulate: true,
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Result of a broadcast that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Confirmed(ReceiptSummary),
    /// Broadcast, but no receipt within the timeout.
    Unconfirmed(B256),
}

/// Drives a deployment against one chain.
#[derive(Debug)]
pub struct DeploymentPipeline<'a> {
    constants: &'a DeployerConstants,
    store: &'a ArtifactStore,
    trail: StageTrail,
}

impl<'a> DeploymentPipeline<'a> {
    pub fn new(constants: &'a DeployerConstants, store: &'a ArtifactStore) -> Self {
        Self { constants, store, trail: StageTrail::default() }
    }

    pub fn trail(&self) -> &StageTrail {
        &self.trail
    }

    /// Builds, signs and persists the deployment transaction.
    ///
    /// With an RPC the signer's on-chain nonce is checked before signing.
    #[instrument(skip_all, fields(chain_id = request.chain_id, nonce = request.nonce))]
    pub async fn prepare(
        &mut self,
        request: PrepareRequest,
        signer: &dyn DeploymentSigner,
        rpc: Option<&dyn ChainRpc>,
    ) -> Result<DeploymentArtifact> {
        let result = self.try_prepare(request, signer, rpc).await;
        self.finish(result)
    }

    async fn try_prepare(
        &mut self,
        request: PrepareRequest,
        signer: &dyn DeploymentSigner,
        rpc: Option<&dyn ChainRpc>,
    ) -> Result<DeploymentArtifact> {
        let from = signer.address();
        let PrepareRequest { bytecode, chain_id, nonce, fees, scheme } = request;
        self.store.ensure_vacant(chain_id)?;
        let tx = DeploymentBuilder::new(self.constants)
            .build(&bytecode, chain_id, nonce, fees, &scheme, from)?;
        self.trail.record(Stage::Built);

        if let Some(rpc) = rpc {
            ensure_nonce(rpc, from, tx.nonce).await?;
        }

        let signed = sign_deployment(&tx, signer).await?;
        self.trail.record(Stage::Signed);

        let decoded = DecodedDeployment::decode(&signed.raw)?;
        if decoded.from != from {
            eyre::bail!("signed transaction recovers to {}, expected {from}", decoded.from);
        }
        let derived = decoded.derive_address(self.constants)?;
        if derived != signed.address {
            eyre::bail!("signed transaction deploys to {derived}, expected {}", signed.address);
        }

        let artifact = DeploymentArtifact::from(&signed);
        if !scheme.is_zksync() {
            self.store.write_bytecode(&bytecode)?;
        }
        let path = self.store.write(chain_id, &artifact)?;
        debug!(path = %path.display(), address = %artifact.address, "persisted artifact");
        self.trail.record(Stage::Persisted);
        Ok(artifact)
    }

    /// Replays `decoded` with `eth_call` and checks the result.
    ///
    /// zkSync EIP-712 transactions cannot be replayed and are skipped with a warning.
    pub async fn simulate(
        &mut self,
        rpc: &dyn ChainRpc,
        decoded: &DecodedDeployment,
    ) -> Result<()> {
        if decoded.is_zksync() {
            sh_warn!("simulation is not supported for zkSync EIP-712 transactions, skipping")?;
            self.trail.record(Stage::SimulationSkipped);
            return Ok(());
        }

        ensure_nonce(rpc, decoded.from, decoded.nonce).await?;
        let output = rpc.call(&decoded.call_request()).await.map_err(|err| {
            DeploymentFailure::new(FailureKind::DeploymentSimulationFailed)
                .with("reason", format!("{err:#}"))
        })?;

        match decoded.to {
            None => {
                let codehash = keccak256(&output);
                debug!(%codehash, len = output.len(), "simulated deployment");
                if codehash != self.constants.codehash {
                    return Err(DeploymentFailure::new(
                        FailureKind::FactoryDeploymentSimulationDifferentBytecode,
                    )
                    .with("codehash", codehash)
                    .with("expected", self.constants.codehash)
                    .into());
                }
            }
            Some(_) => {
                let expected = decoded.derive_address(self.constants)?;
                let returned = (output.len() >= 20)
                    .then(|| Address::from_slice(&output[output.len() - 20..]));
                if returned != Some(expected) {
                    return Err(DeploymentFailure::new(FailureKind::DeploymentSimulationFailed)
                        .with("reason", format!("proxy returned {output}, expected {expected}"))
                        .into());
                }
            }
        }
        self.trail.record(Stage::Simulated);
        Ok(())
    }

    /// Broadcasts the stored transaction of the RPC's chain and waits for its receipt.
    ///
    /// The artifact is never modified.
    #[instrument(skip_all)]
    pub async fn submit(
        &mut self,
        rpc: &dyn ChainRpc,
        options: SubmitOptions,
    ) -> Result<SubmitOutcome> {
        let result = self.try_submit(rpc, options).await;
        self.finish(result)
    }

    async fn try_submit(
        &mut self,
        rpc: &dyn ChainRpc,
        options: SubmitOptions,
    ) -> Result<SubmitOutcome> {
        let (chain_id, artifact) = load_artifact(rpc, self.store).await?;

        let decoded = DecodedDeployment::decode(&artifact.transaction)?;
        if let Some(tx_chain_id) = decoded.chain_id
            && tx_chain_id != chain_id
        {
            eyre::bail!("artifact transaction is bound to chain {tx_chain_id}, RPC is {chain_id}");
        }
        let derived = decoded.derive_address(self.constants)?;
        if derived != artifact.address {
            eyre::bail!(
                "artifact address {} does not match its transaction, which deploys to {derived}",
                artifact.address
            );
        }

        if options.simulate {
            self.simulate(rpc, &decoded).await?;
        }

        let hash = rpc.send_raw_transaction(&artifact.transaction).await?;
        self.trail.record(Stage::Broadcast);
        info!(%hash, "waiting for receipt");

        match rpc.wait_for_receipt(hash, options.poll_interval, options.timeout).await? {
            None => {
                self.trail.record(Stage::Unconfirmed);
                Ok(SubmitOutcome::Unconfirmed(hash))
            }
            Some(receipt) if !receipt.status => {
                self.trail.record(Stage::Reverted);
                let failure =
                    DeploymentFailure::new(FailureKind::DeploymentReverted).with("hash", hash);
                Err(failure.into())
            }
            Some(receipt) => {
                self.trail.record(Stage::Confirmed);
                Ok(SubmitOutcome::Confirmed(receipt))
            }
        }
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() && self.trail.last() != Some(Stage::Reverted) {
            self.trail.record(Stage::Failed);
        }
        result
    }
}

async fn ensure_nonce(rpc: &dyn ChainRpc, from: Address, nonce: u64) -> Result<()> {
    let on_chain = rpc.transaction_count(from).await?;
    if on_chain != nonce {
        return Err(DeploymentFailure::new(FailureKind::NonceMismatch)
            .with("expected", nonce)
            .with("actual", on_chain)
            .into());
    }
    Ok(())
}
