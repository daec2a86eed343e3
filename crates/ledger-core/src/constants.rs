use std::time::Duration;

pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Payload carried by every genesis block.
pub const GENESIS_PAYLOAD: &str = "{}";

pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const MIN_DIFFICULTY: u32 = 1;
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const TARGET_BLOCK_TIME: Duration = Duration::from_secs(10);
pub const ADJUSTMENT_INTERVAL: usize = 5;
