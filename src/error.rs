//! # Error taxonomy.
//!
//! Parse failures are terminal for a single envelope: the envelope is
//! skipped and the pass continues. Remote failures split into transport
//! errors, which abort the current folder pass only, and protocol errors,
//! which stop at the boundary of the task that issued the operation.

use thiserror::Error;

/// Structural or semantic failure decoding a single envelope.
///
/// Never retryable; the affected envelope is skipped with a diagnostic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Missing header/body separator or an unparsable header line.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// CPIM or multipart body did not match its declared structure.
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// A header required for the resolved message kind is absent.
    #[error("missing header: {0}")]
    MissingHeader(String),

    /// The resolver could not classify the envelope.
    #[error("unsupported message type: {content_type}")]
    UnsupportedMessageType {
        /// Raw content-type or context token, retained for logging.
        content_type: String,
    },
}

/// Failure of an operation against the remote store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection-level I/O failure. Retry policy belongs to the caller.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote store rejected the operation.
    #[error("protocol failure: {0}")]
    Protocol(String),
}

impl RemoteError {
    /// Whether the caller may retry the failed pass without a code change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

/// Anything that can go wrong during a synchronization pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Local store collaborator failure.
    #[error("local store: {0}")]
    Store(#[from] anyhow::Error),
}
