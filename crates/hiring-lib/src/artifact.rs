//! Trained model artifact persistence
//!
//! File layout: 8-byte magic, 32-byte SHA-256 of the payload, then the
//! bincode-encoded [`ModelArtifact`]. A file whose checksum does not match
//! its payload is rejected rather than partially loaded.

use crate::error::{HiringError, Result};
use crate::forest::{ForestParams, RandomForest};
use crate::schema::FeatureSchema;
use crate::training::TrainingReport;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MAGIC: &[u8; 8] = b"SHRFMDL1";
const CHECKSUM_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + CHECKSUM_LEN;

/// Everything a prediction process needs from a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: FeatureSchema,
    pub params: ForestParams,
    pub forest: RandomForest,
    pub report: Option<TrainingReport>,
    pub trained_at: i64,
}

impl ModelArtifact {
    pub fn new(
        schema: FeatureSchema,
        params: ForestParams,
        forest: RandomForest,
        report: Option<TrainingReport>,
    ) -> Self {
        Self {
            schema,
            params,
            forest,
            report,
            trained_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Encode into the on-disk format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| HiringError::Artifact(format!("failed to encode model: {}", e)))?;
        let digest = Sha256::digest(&payload);

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decode and verify the on-disk format
    pub fn from_bytes(bytes: &[u8]) -> Result<LoadedModel> {
        if bytes.len() < HEADER_LEN {
            return Err(HiringError::Artifact(format!(
                "file too short ({} bytes)",
                bytes.len()
            )));
        }
        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(HiringError::Artifact("not a smart hiring model file".to_string()));
        }

        let expected = &bytes[MAGIC.len()..HEADER_LEN];
        let payload = &bytes[HEADER_LEN..];
        let actual = Sha256::digest(payload);
        if actual.as_slice() != expected {
            return Err(HiringError::Artifact(format!(
                "checksum mismatch: expected {}, got {}",
                hex::encode(expected),
                hex::encode(actual)
            )));
        }

        let artifact: ModelArtifact = bincode::deserialize(payload)
            .map_err(|e| HiringError::Artifact(format!("failed to decode model: {}", e)))?;
        if artifact.forest.n_features() != artifact.schema.len() {
            return Err(HiringError::SchemaMismatch {
                expected: artifact.schema.len(),
                actual: artifact.forest.n_features(),
            });
        }

        let checksum = hex::encode(actual);
        Ok(LoadedModel {
            version: version_from_checksum(&checksum),
            checksum,
            size_bytes: bytes.len(),
            path: None,
            artifact,
        })
    }

    /// Write atomically: temp file, fsync, rename
    pub fn save(&self, path: impl AsRef<Path>) -> Result<LoadedModel> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = self.to_bytes()?;
        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;

        let checksum = hex::encode(&bytes[MAGIC.len()..HEADER_LEN]);
        let version = version_from_checksum(&checksum);
        info!(
            path = %path.display(),
            version = %version,
            size = bytes.len(),
            "Model artifact saved"
        );

        Ok(LoadedModel {
            version,
            checksum,
            size_bytes: bytes.len(),
            path: Some(path.to_path_buf()),
            artifact: self.clone(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<LoadedModel> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let mut loaded = Self::from_bytes(&bytes)?;
        loaded.path = Some(path.to_path_buf());
        debug!(path = %path.display(), version = %loaded.version, "Model artifact read");
        Ok(loaded)
    }
}

/// A verified artifact plus the metadata derived from its file
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub artifact: ModelArtifact,
    pub version: String,
    pub checksum: String,
    pub size_bytes: usize,
    pub path: Option<PathBuf>,
}

impl LoadedModel {
    /// Wrap an in-memory artifact that has not been written to disk
    pub fn in_memory(artifact: ModelArtifact) -> Result<Self> {
        let bytes = artifact.to_bytes()?;
        let checksum = hex::encode(&bytes[MAGIC.len()..HEADER_LEN]);
        Ok(Self {
            version: version_from_checksum(&checksum),
            checksum,
            size_bytes: bytes.len(),
            path: None,
            artifact,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.artifact.schema
    }

    pub fn forest(&self) -> &RandomForest {
        &self.artifact.forest
    }
}

fn version_from_checksum(checksum: &str) -> String {
    format!("rf-{}", &checksum[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tiny_artifact() -> ModelArtifact {
        let x = vec![vec![1.0, 0.0, 2.0], vec![9.0, 1.0, 3.0], vec![2.0, 0.0, 1.0], vec![8.0, 1.0, 5.0]];
        let y = vec![false, true, false, true];
        let params = ForestParams::legacy().with_trees(5);
        let forest = RandomForest::fit(&x, &y, &params).unwrap();
        ModelArtifact::new(FeatureSchema::legacy(), params, forest, None)
    }

    #[test]
    fn test_round_trip_bytes() {
        let artifact = tiny_artifact();
        let bytes = artifact.to_bytes().unwrap();
        let loaded = ModelArtifact::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.artifact, artifact);
        assert_eq!(loaded.checksum.len(), 64);
        assert!(loaded.version.starts_with("rf-"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models").join("model.bin");
        let artifact = tiny_artifact();

        let saved = artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(saved.version, loaded.version);
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert!(!path.with_extension("tmp").exists());

        let sample = [5.0, 1.0, 2.0];
        assert_eq!(
            artifact.forest.predict_proba(&sample).unwrap().to_bits(),
            loaded.forest().predict_proba(&sample).unwrap().to_bits()
        );
    }

    #[test]
    fn test_corrupted_payload_rejected() {
        let mut bytes = tiny_artifact().to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let err = ModelArtifact::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_bad_magic_and_truncation_rejected() {
        assert!(ModelArtifact::from_bytes(b"short").is_err());
        let mut bytes = tiny_artifact().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(ModelArtifact::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ModelArtifact::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, HiringError::Io(_)));
    }
}
