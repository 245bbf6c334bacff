//! # Top-level synchronization strategy.
//!
//! One pass owns one remote session and runs strictly sequentially:
//! per known conversation folder, fetch remote state, correlate against
//! the local store, reconcile flags, apply local writes, then run the
//! flag-update and push tasks for residual work. Folders are isolated:
//! a failure marks that folder's report and the pass moves on. The
//! session is released on every exit path.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::correlate::{correlate, RemoteItem};
use crate::error::{RemoteError, SyncError};
use crate::local::LocalStore;
use crate::message::ResolvedMessage;
use crate::remote::{RemoteFlags, RemoteSession};
use crate::sync::SyncObject;
use crate::task;
use crate::tools::truncate;

/// Explicit per-pass context; notably the local user identity, used to
/// exclude self from group participant lists.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    pub user_id: Option<String>,
}

impl SyncSettings {
    pub fn with_user(user_id: impl Into<String>) -> Self {
        SyncSettings {
            user_id: Some(user_id.into()),
        }
    }

    fn self_identity(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// What happened to one folder during a pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub folder: String,
    pub downloaded: u32,
    pub matched: u32,
    pub pushed: u32,
    pub flags_set: u32,

    /// Envelopes skipped because they could not be decoded.
    pub skipped: u32,

    /// Set when the folder's pass was aborted.
    pub failed: Option<String>,
}

/// Aggregated outcome of one synchronization pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub folders: Vec<FolderReport>,
}

impl SyncReport {
    pub fn all_ok(&self) -> bool {
        self.folders.iter().all(|f| f.failed.is_none())
    }
}

/// Runs one full pass over every known conversation folder.
///
/// The session is closed before returning, on success and on failure.
pub async fn sync_all(
    remote: &mut dyn RemoteSession,
    local: &dyn LocalStore,
    settings: &SyncSettings,
) -> Result<SyncReport, SyncError> {
    let result = sync_all_inner(remote, local, settings).await;
    if let Err(err) = remote.close().await {
        warn!("closing remote session failed: {err}");
    }
    result
}

async fn sync_all_inner(
    remote: &mut dyn RemoteSession,
    local: &dyn LocalStore,
    settings: &SyncSettings,
) -> Result<SyncReport, SyncError> {
    let folders = local.list_folders().await?;
    let mut report = SyncReport::default();

    for folder in folders {
        match sync_folder(remote, local, settings, &folder).await {
            Ok(folder_report) => report.folders.push(folder_report),
            Err(err) => {
                // Failure isolation: a folder left stale is re-tried on
                // the next scheduled pass.
                warn!(folder, "folder pass failed: {err}");
                report.folders.push(FolderReport {
                    folder,
                    failed: Some(err.to_string()),
                    ..Default::default()
                });
            }
        }
    }

    Ok(report)
}

async fn sync_folder(
    remote: &mut dyn RemoteSession,
    local: &dyn LocalStore,
    settings: &SyncSettings,
    folder: &str,
) -> Result<FolderReport, SyncError> {
    let mut report = FolderReport {
        folder: folder.to_string(),
        ..Default::default()
    };

    remote.select_folder(folder).await?;
    let since = local.uid_marker(folder).await?;
    let fetched = remote.fetch_messages(folder, since).await?;
    info!(folder, count = fetched.len(), "fetched remote messages");

    let mut observed: HashMap<u32, RemoteFlags> = HashMap::new();
    let mut decoded: HashMap<u32, ResolvedMessage> = HashMap::new();
    let mut remote_items = Vec::new();
    let mut max_uid = since.unwrap_or(0);

    for envelope in &fetched {
        observed.insert(envelope.uid, envelope.flags);
        max_uid = max_uid.max(envelope.uid);
        match ResolvedMessage::from_remote(folder, envelope, settings.self_identity()) {
            Ok(message) => {
                remote_items.push(RemoteItem::of(&message, envelope.uid));
                decoded.insert(envelope.uid, message);
            }
            Err(err) => {
                report.skipped += 1;
                warn!(
                    folder,
                    uid = envelope.uid,
                    payload = %truncate(&envelope.raw, 80),
                    "skipping envelope: {err}"
                );
            }
        }
    }

    let local_items = local.correlation_items(folder).await?;
    let correlation = correlate(&remote_items, &local_items);

    // Bind matched UIDs before any flag work, so that re-running
    // correlation settles on the identifier path.
    for (uid, local_id) in &correlation.matched {
        if let Some(mut object) = local.sync_object(*local_id).await? {
            object.bind_uid(*uid);
            local.save_sync_object(&object).await?;
            report.matched += 1;
        }
    }

    // Remote-only messages become local ones; the message and its sync
    // object are persisted in one step before any remote mutation.
    // Messages already bound to a local record are not downloaded again,
    // whatever the fetch window returned.
    let bound: HashSet<u32> = local.bound_uids(folder).await?.into_iter().collect();
    for uid in &correlation.new_remote {
        if bound.contains(uid) {
            continue;
        }
        if let Some(message) = decoded.get(uid) {
            let template = SyncObject::for_downloaded(message);
            local.create_message(message, template).await?;
            report.downloaded += 1;
        }
    }

    if max_uid > since.unwrap_or(0) {
        local.set_uid_marker(folder, max_uid).await?;
    }

    // Residual work. Protocol rejections stay local to the task; only
    // transport failures abort the folder.
    match task::update_flags(remote, local, folder, &observed).await {
        Ok(updated) => report.flags_set = updated,
        Err(SyncError::Remote(RemoteError::Protocol(reason))) => {
            warn!(folder, %reason, "flag update rejected by remote store");
        }
        Err(err) => return Err(err),
    }
    match task::push_messages(remote, local, folder).await {
        Ok(pushed) => report.pushed = pushed,
        Err(SyncError::Remote(RemoteError::Protocol(reason))) => {
            warn!(folder, %reason, "push rejected by remote store");
        }
        Err(err) => return Err(err),
    }

    Ok(report)
}
