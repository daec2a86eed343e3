use crate::constants::{
    ADJUSTMENT_INTERVAL, DEFAULT_DIFFICULTY, MIN_DIFFICULTY, TARGET_BLOCK_TIME,
};
use crate::{pow, Block, Clock, SystemClock};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinerConfig {
    pub initial_difficulty: u32,
    /// Desired wall-clock time to mine one block.
    pub target_block_time: Duration,
    /// Blocks between difficulty recalculations.
    pub adjustment_interval: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            initial_difficulty: DEFAULT_DIFFICULTY,
            target_block_time: TARGET_BLOCK_TIME,
            adjustment_interval: ADJUSTMENT_INTERVAL,
        }
    }
}

/// Mutable controller state. `recent_durations` is ordered most-recent-first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DifficultyState {
    pub difficulty: u32,
    pub recent_durations: VecDeque<Duration>,
}

impl DifficultyState {
    pub fn new(difficulty: u32) -> Self {
        Self {
            difficulty: difficulty.max(MIN_DIFFICULTY),
            recent_durations: VecDeque::new(),
        }
    }
}

/// Proof-of-work search plus the rolling duration window that drives the
/// difficulty. One instance must serve every block of a chain.
#[derive(Debug)]
pub struct Miner<C: Clock = SystemClock> {
    config: MinerConfig,
    state: DifficultyState,
    clock: C,
}

impl Miner<SystemClock> {
    pub fn new(config: MinerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for Miner<SystemClock> {
    fn default() -> Self {
        Self::new(MinerConfig::default())
    }
}

impl<C: Clock> Miner<C> {
    pub fn with_clock(config: MinerConfig, clock: C) -> Self {
        let state = DifficultyState::new(config.initial_difficulty);
        Self::with_state(config, state, clock)
    }

    pub fn with_state(config: MinerConfig, state: DifficultyState, clock: C) -> Self {
        Self {
            config,
            state,
            clock,
        }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    pub fn state(&self) -> &DifficultyState {
        &self.state
    }

    pub fn difficulty(&self) -> u32 {
        self.state.difficulty
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Searches nonces until the block digest satisfies `difficulty` and returns
    /// the elapsed time. Blocks the caller; there is no iteration cap.
    pub fn mine(&self, block: &mut Block, difficulty: u32) -> Duration {
        let started = self.clock.now();
        pow::mine_block(block, difficulty);
        self.clock.now().saturating_sub(started)
    }

    /// Records the mining time of `block_index` and recalculates the difficulty
    /// on every adjustment boundary.
    pub fn record_and_maybe_adjust(&mut self, block_index: u64, duration: Duration) {
        let interval = self.interval();
        self.state.recent_durations.push_front(duration);
        debug!(
            "Recorded {:?} for block {} ({} samples)",
            duration,
            block_index,
            self.state.recent_durations.len()
        );

        if block_index > 0 && block_index % interval as u64 == 0 {
            self.adjust_difficulty();
        }
        if self.state.recent_durations.len() > interval.saturating_mul(2) {
            self.state.recent_durations.truncate(interval);
        }
    }

    /// Hysteresis controller: tighten below half the target, relax above twice
    /// the target, otherwise leave the difficulty alone.
    fn adjust_difficulty(&mut self) {
        let interval = self.interval();
        let samples = self.state.recent_durations.len().min(interval);
        if samples == 0 {
            return;
        }
        let total: Duration = self.state.recent_durations.iter().take(samples).sum();
        let average = total / samples as u32;

        let target = self.config.target_block_time;
        let current = self.state.difficulty;
        let next = if average < target / 2 {
            current + 1
        } else if average > target * 2 {
            current.saturating_sub(1).max(MIN_DIFFICULTY)
        } else {
            current
        };

        if next != current {
            info!(
                "Difficulty adjusted {} -> {} (average {:?}, target {:?})",
                current, next, average, target
            );
        }
        self.state.difficulty = next;
    }

    fn interval(&self) -> usize {
        self.config.adjustment_interval.max(1)
    }
}
