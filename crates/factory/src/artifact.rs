//! Per-chain deployment artifacts.
//!
//! Layout:
//!
//! ```text
//! artifacts/
//! ├── bytecode.txt
//! └── <chainId>/
//!     └── deployment.json
//! ```

use crate::transaction::SignedDeployment;
use alloy_primitives::{Address, Bytes};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{trace, warn};

/// File name of the artifact inside a chain directory.
pub const DEPLOYMENT_FILE: &str = "deployment.json";

/// File name of the init code next to the chain directories.
pub const BYTECODE_FILE: &str = "bytecode.txt";

/// The signed deployment transaction for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentArtifact {
    pub gas_price: u128,
    pub gas_limit: u64,
    #[serde(serialize_with = "checksummed")]
    pub signer_address: Address,
    /// Raw signed transaction, ready for `eth_sendRawTransaction`.
    pub transaction: Bytes,
    #[serde(serialize_with = "checksummed")]
    pub address: Address,
}

fn checksummed<S: serde::Serializer>(
    address: &Address,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&address.to_checksum(None))
}

impl From<&SignedDeployment> for DeploymentArtifact {
    fn from(signed: &SignedDeployment) -> Self {
        Self {
            gas_price: signed.gas_price,
            gas_limit: signed.gas_limit,
            signer_address: signed.signer,
            transaction: signed.raw.clone(),
            address: signed.address,
        }
    }
}

impl DeploymentArtifact {
    /// Tab-indented JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"\t");
        let mut serializer = Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(String::from_utf8(out)?)
    }
}

/// Returned when a chain already has a deployment artifact.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("chain {chain_id} already has a deployment artifact at {}", path.display())]
pub struct ArtifactExists {
    pub chain_id: u64,
    pub path: PathBuf,
}

/// Owns the artifacts directory.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn chain_dir(&self, chain_id: u64) -> PathBuf {
        self.root.join(chain_id.to_string())
    }

    pub fn artifact_path(&self, chain_id: u64) -> PathBuf {
        self.chain_dir(chain_id).join(DEPLOYMENT_FILE)
    }

    pub fn bytecode_path(&self) -> PathBuf {
        self.root.join(BYTECODE_FILE)
    }

    /// Reads the artifact of `chain_id`.
    ///
    /// A missing or unparsable file yields `None`.
    pub fn read(&self, chain_id: u64) -> Result<Option<DeploymentArtifact>> {
        let path = self.artifact_path(chain_id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).wrap_err_with(|| format!("failed to read {}", path.display()));
            }
        };
        match serde_json::from_str(&contents) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring unparsable artifact");
                Ok(None)
            }
        }
    }

    pub fn exists(&self, chain_id: u64) -> Result<bool> {
        Ok(self.read(chain_id)?.is_some())
    }

    /// Fails with [`ArtifactExists`] if `chain_id` already has an artifact.
    pub fn ensure_vacant(&self, chain_id: u64) -> Result<()> {
        if self.exists(chain_id)? {
            return Err(ArtifactExists { chain_id, path: self.artifact_path(chain_id) }.into());
        }
        Ok(())
    }

    /// Writes the artifact of `chain_id`.
    ///
    /// Artifacts are never replaced; an existing one yields [`ArtifactExists`]. The file is
    /// written next to its destination and renamed into place.
    pub fn write(&self, chain_id: u64, artifact: &DeploymentArtifact) -> Result<PathBuf> {
        self.ensure_vacant(chain_id)?;
        let dir = self.chain_dir(chain_id);
        let path = dir.join(DEPLOYMENT_FILE);
        write_atomic(&dir, &path, artifact.to_json()?.as_bytes())?;
        trace!(path = %path.display(), "wrote deployment artifact");
        Ok(path)
    }

    /// Writes the 0x-prefixed init code.
    pub fn write_bytecode(&self, bytecode: &Bytes) -> Result<PathBuf> {
        let path = self.bytecode_path();
        write_atomic(&self.root, &path, format!("{bytecode}\n").as_bytes())?;
        Ok(path)
    }
}

fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("failed to create {}", dir.display()))?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
