//! # Sync work units.
//!
//! Each task is a single remote-session operation sequence over one
//! folder: pushing locally created messages, updating remote flags, or
//! deleting/expunging. The top-level strategy composes them per folder.
//!
//! Ordering rule: local intent is durable before any remote mutation is
//! issued, and a confirmed state is persisted only after the remote
//! store acknowledged the update. A crash between the two leaves the
//! intent pending, so the remote update is re-issued on the next pass
//! (at-least-once, never a lost local intent).

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{RemoteError, SyncError};
use crate::local::LocalStore;
use crate::remote::{RemoteFlag, RemoteFlags, RemoteSession};
use crate::resolver::MessageKind;
use crate::sync::{reconcile, DeleteStatus, FlagPlan, PushStatus, ReadStatus, SyncObject};

/// Pushes every `PushRequested` object of the folder to the remote
/// store, recording the UID each append returns.
///
/// The folder is created on demand: a protocol failure on the first
/// append triggers one create-and-retry.
pub async fn push_messages(
    remote: &mut dyn RemoteSession,
    local: &dyn LocalStore,
    folder: &str,
) -> Result<u32, SyncError> {
    let candidates = local.push_candidates(folder).await?;
    let mut pushed = 0;
    let mut folder_checked = false;

    for mut object in candidates {
        if object.uid.is_some() || object.push_status == PushStatus::Pushed {
            continue;
        }
        let message = local.message_for_push(object.local_id).await?;
        let raw = message.to_wire();
        let flags = RemoteFlags {
            seen: object.read_status != ReadStatus::Unread,
            deleted: object.delete_status == DeleteStatus::Deleted,
        };

        let uid = match remote.append(folder, flags, &raw).await {
            Ok(uid) => uid,
            Err(RemoteError::Protocol(reason)) if !folder_checked => {
                debug!(folder, %reason, "append rejected, creating folder");
                remote.create_folder(folder).await?;
                folder_checked = true;
                remote.append(folder, flags, &raw).await?
            }
            Err(err) => return Err(err.into()),
        };

        object.bind_uid(uid);
        local.save_sync_object(&object).await?;
        pushed += 1;
    }

    Ok(pushed)
}

/// Reconciles pending flag state for the folder against the remote
/// store: resolves missing UIDs by header search, issues one batched
/// flag update per flag kind, then confirms the local transitions.
///
/// `observed` holds the remote flags seen during this pass's fetch,
/// keyed by UID; flags of messages outside the fetch window count as
/// unset, which only means their update is re-issued harmlessly.
pub async fn update_flags(
    remote: &mut dyn RemoteSession,
    local: &dyn LocalStore,
    folder: &str,
    observed: &HashMap<u32, RemoteFlags>,
) -> Result<u32, SyncError> {
    let candidates = local.flag_update_candidates(folder).await?;
    let mut planned: Vec<(SyncObject, FlagPlan)> = Vec::new();
    let mut seen_batch = Vec::new();
    let mut deleted_batch = Vec::new();

    for mut object in candidates {
        if object.uid.is_none() {
            match resolve_uid(remote, local, folder, &object).await? {
                Some(uid) => {
                    object.bind_uid(uid);
                    local.save_sync_object(&object).await?;
                }
                None => {
                    debug!(folder, local_id = %object.local_id, "no remote uid yet, skipping");
                    continue;
                }
            }
        }
        let Some(uid) = object.uid else {
            continue;
        };

        let plan = reconcile(&object, observed.get(&uid).copied());
        if plan.is_empty() {
            continue;
        }
        apply_now(local, &mut object, &plan).await?;
        if plan.set_remote_seen {
            seen_batch.push(uid);
        }
        if plan.set_remote_deleted {
            deleted_batch.push(uid);
        }
        planned.push((object, plan));
    }

    if !seen_batch.is_empty() {
        remote
            .store_flags(folder, &seen_batch, RemoteFlag::Seen, true)
            .await?;
        for (object, plan) in &mut planned {
            if plan.set_remote_seen {
                if let Some(state) = plan.read_confirm {
                    object.read_status = state;
                }
                local.save_sync_object(object).await?;
            }
        }
    }
    if !deleted_batch.is_empty() {
        remote
            .store_flags(folder, &deleted_batch, RemoteFlag::Deleted, true)
            .await?;
        for (object, plan) in &mut planned {
            if plan.set_remote_deleted {
                if let Some(state) = plan.delete_confirm {
                    object.delete_status = state;
                    finish_delete(local, object).await?;
                } else {
                    local.save_sync_object(object).await?;
                }
            }
        }
    }

    // One count per object, even when both flags were updated for it.
    let updated = planned
        .iter()
        .filter(|(_, plan)| plan.set_remote_seen || plan.set_remote_deleted)
        .count() as u32;
    Ok(updated)
}

/// Applies observation-only transitions immediately; they need no
/// remote operation.
async fn apply_now(
    local: &dyn LocalStore,
    object: &mut SyncObject,
    plan: &FlagPlan,
) -> Result<(), SyncError> {
    let mut changed = false;
    if let Some(state) = plan.read_now {
        object.read_status = state;
        changed = true;
    }
    if let Some(state) = plan.delete_now {
        object.delete_status = state;
        changed = true;
    }
    if changed {
        if object.delete_status == DeleteStatus::Deleted {
            finish_delete(local, object).await?;
        } else {
            local.save_sync_object(object).await?;
        }
    }
    Ok(())
}

/// Removes message content once `Deleted` is reached. The object itself
/// stays as a tombstone for conversation bookkeeping, except for IMDN
/// notifications, which nothing refers back to.
async fn finish_delete(local: &dyn LocalStore, object: &SyncObject) -> Result<(), SyncError> {
    local.delete_message_content(object.local_id).await?;
    if object.kind == MessageKind::Imdn {
        local.delete_sync_object(object.local_id).await?;
    } else {
        local.save_sync_object(object).await?;
    }
    Ok(())
}

async fn resolve_uid(
    remote: &mut dyn RemoteSession,
    local: &dyn LocalStore,
    folder: &str,
    object: &SyncObject,
) -> Result<Option<u32>, SyncError> {
    let message = local.message_for_push(object.local_id).await?;
    let Some((header, value)) = message.search_key() else {
        return Ok(None);
    };
    let uids = remote
        .search_header(folder, &header.to_string(), value)
        .await?;
    if uids.len() > 1 {
        warn!(folder, header = %header, value, "ambiguous uid search, taking first");
    }
    Ok(uids.first().copied())
}

/// Remote-side deletion modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTask {
    /// Delete one conversation folder on both stores.
    Folder(String),

    /// Delete every remote folder and purge the local bookkeeping.
    AllFolders,

    /// Permanently purge messages already flagged deleted in a folder.
    Expunge(String),
}

pub async fn delete(
    remote: &mut dyn RemoteSession,
    local: &dyn LocalStore,
    task: &DeleteTask,
) -> Result<(), SyncError> {
    match task {
        DeleteTask::Folder(folder) => {
            remote.delete_folder(folder).await?;
            local.purge_folder(folder).await?;
        }
        DeleteTask::AllFolders => {
            for folder in remote.list_folders().await? {
                remote.delete_folder(&folder).await?;
                local.purge_folder(&folder).await?;
            }
        }
        DeleteTask::Expunge(folder) => {
            remote.select_folder(folder).await?;
            remote.expunge(folder).await?;
        }
    }
    Ok(())
}
