use crate::{SnapshotStore, StorageError};
use ledger_core::Block;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stores the chain as a pretty-printed JSON array of block records.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, blocks: &[Block]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(blocks).map_err(StorageError::Serialize)?;
        // The old snapshot stays intact until the staged copy replaces it.
        let staging = self.staging_path();
        fs::write(&staging, bytes).map_err(|source| StorageError::Io {
            path: staging.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(StorageError::Io {
                path: self.path.clone(),
                source,
            });
        }
        info!("saved {} blocks to {}", blocks.len(), self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<Block>>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let blocks: Option<Vec<Block>> =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Deserialize {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            "read {} blocks from {}",
            blocks.as_ref().map_or(0, Vec::len),
            self.path.display()
        );
        Ok(blocks.filter(|blocks| !blocks.is_empty()))
    }
}
