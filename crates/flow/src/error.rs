use thiserror::Error;

use crate::address::Address;

pub type Result<T> = std::result::Result<T, Error>;

/// Allocator errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Remote query for account {address} failed: {source}")]
    RemoteQueryFailed {
        address: Address,
        #[source]
        source: ClientError,
    },

    #[error("Key index {key_index} is not registered on account {address}")]
    KeyNotFound { address: Address, key_index: u32 },

    #[error("Key index {key_index} on account {address} is revoked")]
    KeyRevoked { address: Address, key_index: u32 },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Sequence number exhausted for key index {key_index} on account {address}")]
    SequenceExhausted { address: Address, key_index: u32 },
}

/// Errors raised by a `LedgerClient` implementation
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Access node returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}
