use thiserror::Error;

/// Rejections raised when sealing a block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("proof {proof} does not satisfy the difficulty against last proof {last_proof}")]
    InvalidProof { last_proof: u64, proof: u64 },
    #[error("previous hash mismatch: expected {expected}, got {got}")]
    PreviousHashMismatch { expected: String, got: String },
}

/// Startup configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}
