//! # Remote store collaborator seam.
//!
//! The IMAP-like remote store is consumed through an object-safe trait;
//! the transport/session library behind it is out of scope. All
//! operations run sequentially over the one session a synchronization
//! pass owns. Errors distinguish only transport failures, retryable by
//! the caller, from protocol failures, which are not.

use async_trait::async_trait;
use strum_macros::Display;

use crate::error::RemoteError;

/// Flags observed on, or applied to, one remote message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFlags {
    pub seen: bool,
    pub deleted: bool,
}

/// One flag kind for batched updates.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFlag {
    #[strum(serialize = "seen")]
    Seen,
    #[strum(serialize = "deleted")]
    Deleted,
}

/// One message fetched from a remote folder: sequence number, flags and
/// the raw envelope text, before any decoding happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEnvelope {
    pub uid: u32,
    pub flags: RemoteFlags,
    pub raw: String,
}

/// One established session against the remote store.
///
/// A session is a scoped resource: the strategy that runs a pass owns it
/// exclusively and releases it via [`RemoteSession::close`] on every exit
/// path.
#[async_trait]
pub trait RemoteSession: Send {
    async fn select_folder(&mut self, folder: &str) -> Result<(), RemoteError>;

    async fn list_folders(&mut self) -> Result<Vec<String>, RemoteError>;

    async fn create_folder(&mut self, folder: &str) -> Result<(), RemoteError>;

    async fn delete_folder(&mut self, folder: &str) -> Result<(), RemoteError>;

    /// Fetches messages of the selected folder, optionally only those
    /// above a known modification marker (last seen UID).
    async fn fetch_messages(
        &mut self,
        folder: &str,
        since_uid: Option<u32>,
    ) -> Result<Vec<RemoteEnvelope>, RemoteError>;

    /// Appends a message and returns the UID the store assigned.
    async fn append(
        &mut self,
        folder: &str,
        flags: RemoteFlags,
        raw: &str,
    ) -> Result<u32, RemoteError>;

    /// Sets or clears one flag kind on a batch of UIDs.
    async fn store_flags(
        &mut self,
        folder: &str,
        uids: &[u32],
        flag: RemoteFlag,
        value: bool,
    ) -> Result<(), RemoteError>;

    /// Searches by exact header value, returning matching UIDs.
    async fn search_header(
        &mut self,
        folder: &str,
        name: &str,
        value: &str,
    ) -> Result<Vec<u32>, RemoteError>;

    /// Permanently purges messages flagged deleted in the folder.
    async fn expunge(&mut self, folder: &str) -> Result<(), RemoteError>;

    async fn close(&mut self) -> Result<(), RemoteError>;
}
