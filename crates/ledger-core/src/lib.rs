//! Core of the ledger: hash engine, blocks, the append-only chain and the
//! proof-of-work miner with its adaptive difficulty controller.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub mod chain;
pub mod clock;
pub mod constants;
mod error;
mod mine;

pub use chain::Chain;
pub use clock::{Clock, ManualClock, SystemClock};
pub use constants::HASH_SIZE;
pub use error::ChainError;
pub use mine::{DifficultyState, Miner, MinerConfig};

pub type Hash = [u8; HASH_SIZE];

/// SHA-256 over an arbitrary byte slice.
pub fn digest(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Creation time in unix milliseconds.
    pub timestamp: u64,
    #[serde(default, with = "hex_digest::option")]
    pub previous_digest: Option<Hash>,
    #[serde(with = "hex_digest")]
    pub digest: Hash,
    pub payload: String,
    pub nonce: u64,
}

impl Block {
    /// Builds an unmined block at index 0 with its initial digest already computed.
    /// The chain fixes the index when it links the block to its tail.
    pub fn new(timestamp: u64, previous_digest: Option<Hash>, payload: impl Into<String>) -> Self {
        let mut block = Self {
            index: 0,
            timestamp,
            previous_digest,
            digest: [0u8; HASH_SIZE],
            payload: payload.into(),
            nonce: 0,
        };
        block.seal();
        block
    }

    /// Canonical encoding fed to the hash engine. Changing the field order or
    /// framing invalidates every previously mined chain.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let payload = self.payload.as_bytes();
        let mut bytes = Vec::with_capacity(8 + 8 + 1 + HASH_SIZE + 8 + payload.len() + 8);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        match &self.previous_digest {
            Some(previous) => {
                bytes.push(1);
                bytes.extend_from_slice(previous);
            }
            None => bytes.push(0),
        }
        bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Rederives the digest from the source fields, ignoring the stored one.
    pub fn compute_digest(&self) -> Hash {
        digest(&self.hash_bytes())
    }

    /// Stores a fresh digest for the current fields.
    pub fn seal(&mut self) -> Hash {
        self.digest = self.compute_digest();
        self.digest
    }

    pub fn is_sealed(&self) -> bool {
        self.digest == self.compute_digest()
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let previous = self
            .previous_digest
            .map(hex::encode)
            .unwrap_or_else(|| "none".to_string());
        writeln!(f, "Block #{}", self.index)?;
        writeln!(f, "  timestamp: {}", self.timestamp)?;
        writeln!(f, "  nonce:     {}", self.nonce)?;
        writeln!(f, "  previous:  {previous}")?;
        writeln!(f, "  digest:    {}", self.digest_hex())?;
        write!(f, "  payload:   {}", self.payload)
    }
}

/// Serde adapters storing digests as lowercase hex strings.
mod hex_digest {
    use super::{Hash, HASH_SIZE};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode(&text).map_err(D::Error::custom)
    }

    fn decode(text: &str) -> Result<Hash, hex::FromHexError> {
        let mut out = [0u8; HASH_SIZE];
        hex::decode_to_slice(text, &mut out)?;
        Ok(out)
    }

    pub mod option {
        use super::Hash;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            hash: &Option<Hash>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match hash {
                Some(hash) => serializer.serialize_some(&hex::encode(hash)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Hash>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| super::decode(&text).map_err(D::Error::custom))
                .transpose()
        }
    }
}

pub mod pow {
    use super::{Block, Hash};

    /// Number of leading `'0'` characters in the hex encoding of `hash`.
    /// Difficulty is measured in hex digits, not bits: one unit is four zero bits.
    pub fn leading_zero_digits(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if *b >> 4 == 0 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
        leading_zero_digits(hash) >= difficulty
    }

    /// Mine the block in place by incrementing the nonce until its digest has at
    /// least `difficulty` leading zero hex digits. The stored digest always
    /// matches the final nonce.
    pub fn mine_block(block: &mut Block, difficulty: u32) {
        block.seal();
        while !meets_difficulty(&block.digest, difficulty) {
            block.nonce = block.nonce.wrapping_add(1);
            block.seal();
        }
    }
}
