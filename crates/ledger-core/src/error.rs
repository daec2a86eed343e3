use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain has no blocks")]
    Empty,
    #[error("block {index} digest does not match its contents")]
    DigestMismatch { index: usize },
    #[error("block {index} is not linked to the digest of its predecessor")]
    BrokenLink { index: usize },
}
