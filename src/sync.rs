//! # Synchronization objects and flag reconciliation.
//!
//! Per local message, a synchronization object tracks push, read and
//! delete state across both stores. Read and delete run as independent
//! two-phase machines: a `*ReportRequested` state is local intent
//! ("tell the remote store"), confirmed into the terminal state once the
//! remote store acknowledged the flag update. Confirmed states never
//! regress, and pending local intent always wins over a stale remote
//! observation; flag values converge monotonically toward set.

use strum_macros::Display;

use crate::local::LocalMessageId;
use crate::message::ResolvedMessage;
use crate::remote::RemoteFlags;
use crate::resolver::MessageKind;

#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// Not yet on the remote store; no UID assigned.
    #[default]
    PushRequested,
    Pushed,
}

#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    #[default]
    Unread,

    /// Local intent: the remote seen flag should be set.
    ReadReportRequested,
    Read,
}

#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    #[default]
    NotDeleted,

    /// Local intent: the remote deleted flag should be set.
    DeletedReportRequested,
    Deleted,
}

/// Per-message bookkeeping record spanning both stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncObject {
    pub kind: MessageKind,
    pub folder: String,
    pub local_id: LocalMessageId,

    /// Remote sequence number; `None` only while `PushRequested`, and
    /// immutable once known.
    pub uid: Option<u32>,
    pub push_status: PushStatus,
    pub read_status: ReadStatus,
    pub delete_status: DeleteStatus,
    pub conversation_id: String,
}

impl SyncObject {
    /// Fresh object for a locally created message that still needs a
    /// push.
    pub fn for_local(
        kind: MessageKind,
        folder: &str,
        local_id: LocalMessageId,
        conversation_id: &str,
    ) -> Self {
        SyncObject {
            kind,
            folder: folder.to_string(),
            local_id,
            uid: None,
            push_status: PushStatus::PushRequested,
            read_status: ReadStatus::default(),
            delete_status: DeleteStatus::default(),
            conversation_id: conversation_id.to_string(),
        }
    }

    /// Template for a message just downloaded from the remote store:
    /// already pushed by definition, flag states seeded from the
    /// observed remote flags. The local id is a placeholder until the
    /// local store assigns one.
    pub fn for_downloaded(message: &ResolvedMessage) -> Self {
        SyncObject {
            kind: message.kind(),
            folder: message.meta.folder.clone(),
            local_id: LocalMessageId(0),
            uid: message.meta.uid,
            push_status: PushStatus::Pushed,
            read_status: if message.meta.seen {
                ReadStatus::Read
            } else {
                ReadStatus::Unread
            },
            delete_status: if message.meta.deleted {
                DeleteStatus::Deleted
            } else {
                DeleteStatus::NotDeleted
            },
            conversation_id: message.meta.conversation_id.clone(),
        }
    }

    /// Records the UID the remote store assigned. A UID never changes
    /// once known.
    pub fn bind_uid(&mut self, uid: u32) {
        if self.uid.is_none() {
            self.uid = Some(uid);
            self.push_status = PushStatus::Pushed;
        }
    }

    /// Whether a read or delete report is still pending.
    pub fn has_pending_report(&self) -> bool {
        self.read_status == ReadStatus::ReadReportRequested
            || self.delete_status == DeleteStatus::DeletedReportRequested
    }
}

/// Result of reconciling one object against the observed remote flags:
/// remote flag operations to request plus local transitions, split into
/// those applied immediately (pure observation) and those applied only
/// after the remote store confirmed the update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlagPlan {
    pub set_remote_seen: bool,
    pub set_remote_deleted: bool,

    /// Transition to apply now, without any remote operation.
    pub read_now: Option<ReadStatus>,
    pub delete_now: Option<DeleteStatus>,

    /// Transition to apply once the requested remote update succeeded.
    pub read_confirm: Option<ReadStatus>,
    pub delete_confirm: Option<DeleteStatus>,
}

impl FlagPlan {
    pub fn is_empty(&self) -> bool {
        *self == FlagPlan::default()
    }
}

/// Merges local state with the remote flags observed in this pass.
///
/// `remote` is `None` when the message was not part of the fetch (e.g.
/// no UID known yet); unknown flags are treated as unset.
pub fn reconcile(object: &SyncObject, remote: Option<RemoteFlags>) -> FlagPlan {
    let remote = remote.unwrap_or_default();
    let mut plan = FlagPlan::default();

    match object.read_status {
        ReadStatus::ReadReportRequested => {
            if remote.seen {
                // Already set remotely; confirm without an operation.
                plan.read_now = Some(ReadStatus::Read);
            } else {
                plan.set_remote_seen = true;
                plan.read_confirm = Some(ReadStatus::Read);
            }
        }
        ReadStatus::Unread => {
            if remote.seen {
                plan.read_now = Some(ReadStatus::Read);
            }
        }
        ReadStatus::Read => {
            if !remote.seen && object.uid.is_some() {
                plan.set_remote_seen = true;
            }
        }
    }

    match object.delete_status {
        DeleteStatus::DeletedReportRequested => {
            if remote.deleted {
                plan.delete_now = Some(DeleteStatus::Deleted);
            } else {
                plan.set_remote_deleted = true;
                plan.delete_confirm = Some(DeleteStatus::Deleted);
            }
        }
        DeleteStatus::NotDeleted => {
            if remote.deleted {
                plan.delete_now = Some(DeleteStatus::Deleted);
            }
        }
        DeleteStatus::Deleted => {
            if !remote.deleted && object.uid.is_some() {
                plan.set_remote_deleted = true;
            }
        }
    }

    plan
}
