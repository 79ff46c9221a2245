//! Post-deployment verification.

use crate::{
    artifact::{ArtifactStore, DeploymentArtifact},
    transaction::DecodedDeployment,
};
use alloy_primitives::{Address, B256, Bytes, keccak256};
use eyre::{Result, bail, eyre};
use singleton_factory_common::{ChainRpc, DeployerConstants, DeploymentFailure, FailureKind};
use tracing::{debug, warn};

/// What was found on chain for a stored artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationReport {
    pub chain_id: u64,
    pub address: Address,
    pub codehash: B256,
    /// `None` if no codehash is known for the transaction's chain flavor.
    pub expected: Option<B256>,
}

/// Loads the artifact for the RPC's chain.
pub async fn load_artifact(
    rpc: &dyn ChainRpc,
    store: &ArtifactStore,
) -> Result<(u64, DeploymentArtifact)> {
    let chain_id = rpc.chain_id().await?;
    let artifact = store.read(chain_id)?.ok_or_else(|| {
        eyre!(
            "no deployment artifact for chain {chain_id} at {}",
            store.artifact_path(chain_id).display()
        )
    })?;
    Ok((chain_id, artifact))
}

/// Checks that the stored artifact is consistent and that the code at its address is the
/// expected one.
pub async fn verify_deployment(
    rpc: &dyn ChainRpc,
    store: &ArtifactStore,
    constants: &DeployerConstants,
) -> Result<VerificationReport> {
    let (chain_id, artifact) = load_artifact(rpc, store).await?;

    let decoded = DecodedDeployment::decode(&artifact.transaction)?;
    let derived = decoded.derive_address(constants)?;
    if derived != artifact.address {
        bail!(
            "artifact address {} does not match its transaction, which deploys to {derived}",
            artifact.address
        );
    }
    if decoded.from == constants.signer
        && decoded.to.is_none()
        && decoded.nonce == 0
        && artifact.address != constants.factory_address
    {
        bail!(
            "unexpected address {} for the singleton factory, expected {}",
            artifact.address,
            constants.factory_address
        );
    }

    let code = rpc.code(artifact.address).await?;
    let codehash = keccak256(&code);
    debug!(address = %artifact.address, %codehash, len = code.len(), "deployed code");

    let expected =
        if decoded.is_zksync() { constants.zksync_codehash } else { Some(constants.codehash) };
    match expected {
        Some(expected) if expected != codehash => {
            return Err(DeploymentFailure::new(FailureKind::BytecodeIntegrityMismatch)
                .with("address", artifact.address)
                .with("codehash", codehash)
                .with("expected", expected)
                .into());
        }
        Some(_) => {}
        None if code.is_empty() => bail!("no code at {}", artifact.address),
        None => warn!("no zkSync codehash configured, only checked that code exists"),
    }

    Ok(VerificationReport { chain_id, address: artifact.address, codehash, expected })
}

/// Returns the artifact address and the code currently deployed there.
pub async fn deployed_code(rpc: &dyn ChainRpc, store: &ArtifactStore) -> Result<(Address, Bytes)> {
    let (_, artifact) = load_artifact(rpc, store).await?;
    let code = rpc.code(artifact.address).await?;
    Ok((artifact.address, code))
}
