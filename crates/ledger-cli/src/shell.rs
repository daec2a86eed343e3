//! Line-oriented command loop over a chain and its JSON snapshot.
use std::io::{self, BufRead, Write};

use ledger_core::{Chain, Clock};
use ledger_storage::{restore, save_chain, JsonFileStore, Restored, StorageError};
use tracing::debug;

pub const COMMANDS: &str = "add <data>, validate, print, save, load, exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    /// `add` with nothing after it.
    AddUsage,
    Validate,
    Print,
    Save,
    Load,
    Exit,
    Unknown(String),
}

impl Command {
    /// Parses one input line. Blank lines yield `None`. The verb is
    /// case-insensitive and the payload is the rest of the line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let command = match verb.to_lowercase().as_str() {
            "add" if rest.is_empty() => Command::AddUsage,
            "add" => Command::Add(rest.to_string()),
            "validate" => Command::Validate,
            "print" => Command::Print,
            "save" => Command::Save,
            "load" => Command::Load,
            "exit" => Command::Exit,
            _ => Command::Unknown(verb.to_string()),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<C: Clock> {
    chain: Chain<C>,
    store: JsonFileStore,
}

impl<C: Clock> Shell<C> {
    pub fn new(chain: Chain<C>, store: JsonFileStore) -> Self {
        Self { chain, store }
    }

    pub fn chain(&self) -> &Chain<C> {
        &self.chain
    }

    /// Reads commands until `exit` or end of input.
    /// Invalid UTF-8 in a line is replaced rather than ending the session.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> io::Result<()> {
        writeln!(out, "A simple proof-of-work ledger.")?;
        writeln!(out, "Commands: {COMMANDS}")?;
        let mut buf = Vec::new();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            if self.execute(command, &mut out)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<Flow> {
        debug!("executing {:?}", command);
        match command {
            Command::Add(payload) => match self.chain.add_block(payload) {
                Ok(block) => writeln!(
                    out,
                    "Block #{} added: {} (nonce {})",
                    block.index, block.payload, block.nonce
                )?,
                Err(err) => writeln!(out, "Could not add block: {err}")?,
            },
            Command::AddUsage => writeln!(out, "Usage: add <data>")?,
            Command::Validate => match self.chain.validate() {
                Ok(()) => writeln!(out, "Blockchain valid? true")?,
                Err(err) => writeln!(out, "Blockchain valid? false ({err})")?,
            },
            Command::Print => {
                for block in self.chain.blocks() {
                    writeln!(out, "{block}")?;
                }
                writeln!(
                    out,
                    "{} blocks, difficulty {}",
                    self.chain.len(),
                    self.chain.difficulty()
                )?;
            }
            Command::Save => match save_chain(&self.store, &self.chain) {
                Ok(count) => writeln!(
                    out,
                    "Blockchain saved to {} ({count} blocks)",
                    self.store.path().display()
                )?,
                Err(err) => writeln!(out, "Save failed: {err}")?,
            },
            Command::Load => match restore(&self.store, &mut self.chain) {
                Ok(Restored::Replaced(count)) => writeln!(
                    out,
                    "Blockchain loaded from {} ({count} blocks)",
                    self.store.path().display()
                )?,
                Ok(Restored::Reset) => writeln!(
                    out,
                    "Snapshot {} held no blocks; started a new chain",
                    self.store.path().display()
                )?,
                Err(StorageError::NotFound { path }) => {
                    writeln!(out, "File not found: {}", path.display())?
                }
                Err(err) => writeln!(out, "Load failed: {err}")?,
            },
            Command::Exit => return Ok(Flow::Exit),
            Command::Unknown(verb) => {
                writeln!(out, "Unknown command '{verb}'. Available commands: {COMMANDS}")?
            }
        }
        Ok(Flow::Continue)
    }
}
