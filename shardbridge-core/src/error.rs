//! Error types for shardbridge

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),

    #[error("Invalid item pointer: {0}")]
    InvalidItemPointer(String),

    #[error("Scroll error: {0}")]
    Scroll(String),

    #[error("Document {doc_id} has no value for field {field}")]
    MissingField { doc_id: String, field: String },

    #[error(
        "No routing token found for shard {shard} of index {index} after {probes} probes"
    )]
    RoutingProbeExhausted {
        index: String,
        shard: u32,
        probes: u64,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Maps a short read into `MalformedBuffer`, keeping other IO errors as-is
    pub(crate) fn from_decode(err: io::Error, what: &str) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => {
                Error::MalformedBuffer(format!("{}: {}", what, err))
            }
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
