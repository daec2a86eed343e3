use crate::constants::GENESIS_PAYLOAD;
use crate::{Block, ChainError, Clock, Miner, SystemClock};
use tracing::{info, warn};

/// Append-only sequence of mined blocks. Always holds a genesis block at index 0.
///
/// `add_block` takes `&mut self`, so reading the tail, mining and appending
/// happen under one exclusive borrow. Wrap the chain in a `Mutex` to share it.
#[derive(Debug)]
pub struct Chain<C: Clock = SystemClock> {
    blocks: Vec<Block>,
    miner: Miner<C>,
}

impl Chain<SystemClock> {
    pub fn new() -> Self {
        Self::with_miner(Miner::default())
    }
}

impl Default for Chain<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Chain<C> {
    pub fn with_miner(miner: Miner<C>) -> Self {
        Self::from_blocks(Vec::new(), miner)
    }

    /// Restores a chain from stored blocks without validating them. An empty
    /// list yields a fresh genesis-only chain.
    pub fn from_blocks(blocks: Vec<Block>, miner: Miner<C>) -> Self {
        let mut chain = Self { blocks, miner };
        if chain.blocks.is_empty() {
            chain.reset();
        }
        chain
    }

    /// Drops every block and starts over from a new genesis block.
    pub fn reset(&mut self) {
        let genesis = genesis_block(self.miner.clock().timestamp_millis());
        self.blocks = vec![genesis];
    }

    /// Whole-chain replace, as done when loading a snapshot.
    pub fn replace_blocks(&mut self, blocks: Vec<Block>) {
        if blocks.is_empty() {
            self.reset();
        } else {
            self.blocks = blocks;
        }
    }

    /// Mines a block carrying `payload` on top of the current head and appends it.
    pub fn add_block(&mut self, payload: impl Into<String>) -> Result<&Block, ChainError> {
        let head = self.head_block()?;
        let previous = head.digest;
        let index = head.index + 1;

        let mut block = Block::new(
            self.miner.clock().timestamp_millis(),
            Some(previous),
            payload,
        );
        block.index = index;

        let difficulty = self.miner.difficulty();
        let elapsed = self.miner.mine(&mut block, difficulty);
        info!(
            "Mined block {} with nonce {} at difficulty {} in {:?}: {}",
            block.index,
            block.nonce,
            difficulty,
            elapsed,
            block.digest_hex()
        );

        self.blocks.push(block);
        self.miner.record_and_maybe_adjust(index, elapsed);
        self.head_block()
    }

    /// Checks content integrity of every block (genesis included) and link
    /// integrity of every block after genesis. Reports the first violation.
    pub fn validate(&self) -> Result<(), ChainError> {
        let genesis = self.blocks.first().ok_or(ChainError::Empty)?;
        if !genesis.is_sealed() {
            return Err(ChainError::DigestMismatch { index: 0 });
        }

        for (offset, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = offset + 1;
            if !current.is_sealed() {
                return Err(ChainError::DigestMismatch { index });
            }
            if current.previous_digest != Some(previous.digest) {
                return Err(ChainError::BrokenLink { index });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!("chain validation failed: {err}");
                false
            }
        }
    }

    pub fn head_block(&self) -> Result<&Block, ChainError> {
        self.blocks.last().ok_or(ChainError::Empty)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.miner.difficulty()
    }

    pub fn miner(&self) -> &Miner<C> {
        &self.miner
    }
}

/// The fixed first block: index 0, no predecessor, sentinel payload, never mined.
pub fn genesis_block(timestamp: u64) -> Block {
    Block::new(timestamp, None, GENESIS_PAYLOAD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pow, DifficultyState, ManualClock, MinerConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_chain(difficulty: u32) -> Chain<ManualClock> {
        let config = MinerConfig {
            initial_difficulty: difficulty,
            ..MinerConfig::default()
        };
        let clock = ManualClock::new(Duration::from_secs(1_600_000_000), Duration::from_secs(1));
        Chain::with_miner(Miner::with_clock(config, clock))
    }

    #[test]
    fn genesis_block_example() {
        let genesis = genesis_block(1_600_000_000_000);
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_digest, None);
        assert_eq!(genesis.payload, GENESIS_PAYLOAD);
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.is_sealed());
    }

    #[test]
    fn new_chain_holds_only_genesis() {
        let chain = Chain::new();
        assert_eq!(chain.len(), 1);
        let head = chain.head_block().unwrap();
        assert_eq!(head.index, 0);
        assert_eq!(head.previous_digest, None);
        assert!(chain.is_valid());
    }

    #[test]
    fn add_block_links_to_previous_head() {
        let mut chain = test_chain(1);
        for payload in ["a", "b", "c"] {
            let previous = chain.head_block().unwrap().clone();
            let len = chain.len();
            let block = chain.add_block(payload).unwrap().clone();
            assert_eq!(chain.len(), len + 1);
            assert_eq!(block.previous_digest, Some(previous.digest));
            assert_eq!(block.index, previous.index + 1);
            assert_eq!(block.payload, payload);
        }
        assert!(chain.is_valid());
    }

    #[test]
    fn added_blocks_meet_current_difficulty() {
        let mut chain = test_chain(2);
        let block = chain.add_block("hello").unwrap();
        assert!(pow::meets_difficulty(&block.digest, 2));
        assert!(block.digest_hex().starts_with("00"));
        assert!(block.is_sealed());
    }

    #[test]
    fn hello_world_scenario() {
        let mut chain = test_chain(1);
        chain.add_block("hello").unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.head_block().unwrap().digest_hex().starts_with('0'));
        assert!(chain.is_valid());

        let hello = chain.head_block().unwrap().digest;
        let world = chain.add_block("world").unwrap();
        assert_eq!(world.previous_digest, Some(hello));
        assert_eq!(chain.len(), 3);
        assert!(chain.is_valid());
    }

    #[test]
    fn tampered_payload_is_detected() {
        let mut chain = test_chain(1);
        chain.add_block("one").unwrap();
        chain.add_block("two").unwrap();
        let mut blocks = chain.blocks().to_vec();
        blocks[1].payload = "forged".to_string();

        let tampered = Chain::from_blocks(blocks, Miner::default());
        assert_eq!(
            tampered.validate(),
            Err(ChainError::DigestMismatch { index: 1 })
        );
        assert!(!tampered.is_valid());
    }

    #[test]
    fn resealed_block_still_breaks_the_link() {
        let mut chain = test_chain(1);
        chain.add_block("one").unwrap();
        chain.add_block("two").unwrap();
        let mut blocks = chain.blocks().to_vec();
        blocks[1].payload = "forged".to_string();
        blocks[1].seal();

        let tampered = Chain::from_blocks(blocks, Miner::default());
        assert_eq!(tampered.validate(), Err(ChainError::BrokenLink { index: 2 }));
    }

    #[test]
    fn rewritten_previous_digest_is_detected() {
        let mut chain = test_chain(1);
        chain.add_block("one").unwrap();
        let mut blocks = chain.blocks().to_vec();
        blocks[1].previous_digest = Some([7u8; 32]);
        blocks[1].seal();

        let tampered = Chain::from_blocks(blocks, Miner::default());
        assert_eq!(tampered.validate(), Err(ChainError::BrokenLink { index: 1 }));
    }

    #[test]
    fn tampered_genesis_is_detected() {
        let chain = test_chain(1);
        let mut blocks = chain.blocks().to_vec();
        blocks[0].payload = "rewritten".to_string();

        let tampered = Chain::from_blocks(blocks, Miner::default());
        assert_eq!(
            tampered.validate(),
            Err(ChainError::DigestMismatch { index: 0 })
        );
    }

    #[test]
    fn replace_with_empty_resets_to_genesis() {
        let mut chain = test_chain(1);
        chain.add_block("one").unwrap();
        chain.replace_blocks(Vec::new());
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.head_block().unwrap().payload, GENESIS_PAYLOAD);
    }

    #[test]
    fn replace_keeps_mining_on_top_of_loaded_head() {
        let mut source = test_chain(1);
        source.add_block("one").unwrap();
        let snapshot = source.blocks().to_vec();

        let mut chain = test_chain(1);
        chain.replace_blocks(snapshot.clone());
        assert_eq!(chain.blocks(), snapshot.as_slice());
        let block = chain.add_block("two").unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_digest, Some(snapshot[1].digest));
    }

    #[test]
    fn difficulty_rises_when_blocks_are_fast() {
        // Each mining run spans two clock readings one second apart.
        let mut chain = test_chain(1);
        for i in 0..5 {
            chain.add_block(format!("block {i}")).unwrap();
        }
        assert_eq!(chain.difficulty(), 2);
        assert!(chain.is_valid());
    }

    #[test]
    fn difficulty_falls_when_blocks_are_slow() {
        let clock = Arc::new(ManualClock::new(Duration::from_secs(0), Duration::from_secs(30)));
        let miner = Miner::with_state(
            MinerConfig::default(),
            DifficultyState::new(2),
            Arc::clone(&clock),
        );
        let mut chain = Chain::with_miner(miner);
        for i in 0..4 {
            chain.add_block(format!("slow {i}")).unwrap();
        }
        assert_eq!(chain.difficulty(), 2);
        chain.add_block("slow 4").unwrap();
        assert_eq!(chain.difficulty(), 1);

        clock.set_step(Duration::from_secs(10));
        for i in 5..10 {
            chain.add_block(format!("steady {i}")).unwrap();
        }
        assert_eq!(chain.difficulty(), 1);
        assert_eq!(chain.miner().state().recent_durations.len(), 10);
    }
}
