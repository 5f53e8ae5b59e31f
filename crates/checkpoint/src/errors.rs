use std::io;

use thiserror::Error;

/// Errors returned by the on-chain contract clients.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("invalid rpc url '{0}'")]
    InvalidRpcUrl(String),

    #[error("contract call failed: {0}")]
    Call(#[from] alloy::contract::Error),
}

/// A storage location string that does not name a supported checkpoint store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageLocationError {
    #[error("unsupported storage scheme in '{0}', expected s3://, gs:// or file://")]
    UnsupportedScheme(String),

    #[error("missing bucket in '{0}'")]
    MissingBucket(String),

    #[error("missing region in '{0}'")]
    MissingRegion(String),

    #[error("missing path in '{0}'")]
    MissingPath(String),
}

/// Errors raised while building or querying a validator's checkpoint store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("malformed storage location: {0}")]
    Location(#[from] StorageLocationError),

    #[error("checkpoint store {0} is not reachable")]
    Unreachable(String),

    #[error("no checkpoint published at {0}")]
    NoCheckpoint(String),

    #[error("unexpected status {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("invalid checkpoint index body: {0}")]
    Decode(#[from] serde_json::Error),
}
