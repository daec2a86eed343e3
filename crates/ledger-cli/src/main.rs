mod shell;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{value_parser, Parser};
use ledger_core::constants::{
    ADJUSTMENT_INTERVAL, DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MIN_DIFFICULTY, TARGET_BLOCK_TIME,
};
use ledger_core::{Chain, Miner, MinerConfig};
use ledger_storage::JsonFileStore;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Interactive shell for a minimal proof-of-work ledger")]
struct Args {
    /// Snapshot file used by `save` and `load`
    #[arg(long, env = "LEDGER_SNAPSHOT", default_value = "blockchain.json")]
    snapshot: PathBuf,

    /// Starting difficulty, in leading zero hex digits of the block digest
    #[arg(
        long,
        default_value_t = DEFAULT_DIFFICULTY,
        value_parser = value_parser!(u32).range(MIN_DIFFICULTY as i64..=MAX_DIFFICULTY as i64)
    )]
    difficulty: u32,

    /// Desired seconds per block for the difficulty controller
    #[arg(
        long,
        default_value_t = TARGET_BLOCK_TIME.as_secs(),
        value_parser = value_parser!(u64).range(1..)
    )]
    target_block_secs: u64,

    /// Blocks between difficulty adjustments
    #[arg(
        long,
        default_value_t = ADJUSTMENT_INTERVAL as u32,
        value_parser = value_parser!(u32).range(1..)
    )]
    adjust_interval: u32,
}

impl Args {
    fn miner_config(&self) -> MinerConfig {
        MinerConfig {
            initial_difficulty: self.difficulty,
            target_block_time: Duration::from_secs(self.target_block_secs),
            adjustment_interval: self.adjust_interval as usize,
        }
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    info!("starting ledger shell with {:?}", args);

    let chain = Chain::with_miner(Miner::new(args.miner_config()));
    let store = JsonFileStore::new(&args.snapshot);
    let mut shell = Shell::new(chain, store);
    shell.run(io::stdin().lock(), io::stdout().lock())?;
    info!("exiting with {} blocks", shell.chain().len());
    Ok(())
}
