//! Parse errors for value types that arrive as text (config, CLI, tool output).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("address checksum mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid max factor {value}: {reason}")]
    InvalidMaxFactor { value: String, reason: String },

    #[error("invalid key type: {0}")]
    InvalidKeyType(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
