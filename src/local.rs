//! # Local store collaborator seam.
//!
//! The relational storage engine holding chat/file-transfer/SMS/MMS
//! records and their synchronization objects is out of scope; this trait
//! is the boundary the sync core consumes it through. Implementations
//! report failures as `anyhow` errors, which the core wraps as
//! [`crate::error::SyncError::Store`].

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::correlate::LocalItem;
use crate::message::ResolvedMessage;
use crate::sync::SyncObject;

/// Identifier of a message record in the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalMessageId(pub u64);

impl fmt::Display for LocalMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg#{}", self.0)
    }
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Conversation folders known locally, in pass order.
    async fn list_folders(&self) -> Result<Vec<String>>;

    /// Highest remote UID already fetched for the folder, if any.
    async fn uid_marker(&self, folder: &str) -> Result<Option<u32>>;

    async fn set_uid_marker(&self, folder: &str, uid: u32) -> Result<()>;

    async fn sync_object(&self, local_id: LocalMessageId) -> Result<Option<SyncObject>>;

    async fn save_sync_object(&self, object: &SyncObject) -> Result<()>;

    async fn delete_sync_object(&self, local_id: LocalMessageId) -> Result<()>;

    /// Correlation inputs for the folder: locally known messages whose
    /// synchronization object is not yet bound to a remote UID.
    async fn correlation_items(&self, folder: &str) -> Result<Vec<LocalItem>>;

    /// Remote UIDs already bound to a local message in the folder.
    async fn bound_uids(&self, folder: &str) -> Result<Vec<u32>>;

    /// Objects still in `PushRequested` for the folder.
    async fn push_candidates(&self, folder: &str) -> Result<Vec<SyncObject>>;

    /// Objects with a pending read or delete report for the folder.
    async fn flag_update_candidates(&self, folder: &str) -> Result<Vec<SyncObject>>;

    /// Persists a downloaded message together with its synchronization
    /// object in one logical step. `object.local_id` is a placeholder;
    /// the store assigns the real id and returns the persisted object.
    async fn create_message(
        &self,
        message: &ResolvedMessage,
        object: SyncObject,
    ) -> Result<SyncObject>;

    /// Reconstructs the full message for serialization towards the
    /// remote store.
    async fn message_for_push(&self, local_id: LocalMessageId) -> Result<ResolvedMessage>;

    /// Removes the message content once its delete status reaches
    /// `Deleted`; the synchronization object may stay as a tombstone.
    async fn delete_message_content(&self, local_id: LocalMessageId) -> Result<()>;

    /// Drops all messages and synchronization objects of a folder.
    async fn purge_folder(&self, folder: &str) -> Result<()>;
}
