pub mod json_store;

use ledger_core::{Block, Chain, Clock};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

pub use json_store::JsonFileStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("i/o error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("snapshot {} does not hold a block list: {source}", .path.display())]
    Deserialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not encode snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Whole-chain snapshot persistence.
pub trait SnapshotStore {
    /// Overwrites the snapshot with `blocks`.
    fn save(&self, blocks: &[Block]) -> Result<(), StorageError>;
    /// Reads the snapshot. `Ok(None)` means it held no blocks.
    fn load(&self) -> Result<Option<Vec<Block>>, StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restored {
    /// The chain now holds this many blocks from the snapshot.
    Replaced(usize),
    /// The snapshot was empty; the chain restarted from genesis.
    Reset,
}

pub fn save_chain<S, C>(store: &S, chain: &Chain<C>) -> Result<usize, StorageError>
where
    S: SnapshotStore + ?Sized,
    C: Clock,
{
    store.save(chain.blocks())?;
    Ok(chain.len())
}

/// Replaces the chain with the snapshot contents. On error the chain is left untouched.
pub fn restore<S, C>(store: &S, chain: &mut Chain<C>) -> Result<Restored, StorageError>
where
    S: SnapshotStore + ?Sized,
    C: Clock,
{
    match store.load()? {
        Some(blocks) => {
            let count = blocks.len();
            chain.replace_blocks(blocks);
            info!("restored {count} blocks from snapshot");
            Ok(Restored::Replaced(count))
        }
        None => {
            chain.reset();
            info!("snapshot held no blocks; chain reset to genesis");
            Ok(Restored::Reset)
        }
    }
}
