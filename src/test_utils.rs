//! In-memory stand-ins for the two collaborator seams, plus fixture
//! builders, for use in integration-style tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::constants::Direction;
use crate::correlate::LocalItem;
use crate::error::RemoteError;
use crate::local::{LocalMessageId, LocalStore};
use crate::message::{ChatMessage, MessageMeta, MessageVariant, ResolvedMessage, SmsMessage};
use crate::remote::{RemoteEnvelope, RemoteFlag, RemoteFlags, RemoteSession};
use crate::sync::SyncObject;

pub fn ts(secs: i64) -> DateTime<FixedOffset> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.fixed_offset())
        .unwrap_or_default()
}

/// One message as stored by [`MockRemote`]: flags plus raw wire text.
#[derive(Debug, Clone)]
pub struct MockMessage {
    pub flags: RemoteFlags,
    pub raw: String,
}

impl From<String> for MockMessage {
    fn from(raw: String) -> Self {
        MockMessage {
            flags: RemoteFlags::default(),
            raw,
        }
    }
}

/// Wire text of an incoming one-to-one chat message.
pub fn chat_envelope(
    contribution_id: &str,
    from: &str,
    text: &str,
    imdn_message_id: &str,
    seen: bool,
) -> MockMessage {
    let message = ResolvedMessage {
        meta: MessageMeta {
            folder: String::new(),
            uid: None,
            seen,
            deleted: false,
            direction: Direction::Incoming,
            conversation_id: contribution_id.to_string(),
            from: Some(format!("tel:{from}")),
            to: None,
        },
        variant: MessageVariant::Chat(ChatMessage {
            one_to_one: true,
            contribution_id: contribution_id.to_string(),
            imdn_message_id: imdn_message_id.to_string(),
            text: text.to_string(),
            timestamp: ts(1_550_000_000),
        }),
    };
    MockMessage {
        flags: RemoteFlags {
            seen,
            deleted: false,
        },
        raw: message.to_wire(),
    }
}

/// Outgoing legacy SMS, correlated by content fingerprint only.
pub fn sms_message(folder: &str, text: &str, secs: i64) -> ResolvedMessage {
    ResolvedMessage {
        meta: MessageMeta {
            folder: folder.to_string(),
            uid: None,
            seen: false,
            deleted: false,
            direction: Direction::Outgoing,
            conversation_id: folder.to_string(),
            from: None,
            to: Some("tel:+33600000042".to_string()),
        },
        variant: MessageVariant::Sms(SmsMessage {
            correlator: crate::correlate::message_correlator(text),
            text: text.to_string(),
            timestamp: ts(secs),
        }),
    }
}

/// In-memory remote store, one UID sequence across all folders.
#[derive(Debug, Default)]
pub struct MockRemote {
    pub folders: BTreeMap<String, Vec<RemoteEnvelope>>,
    pub next_uid: u32,
    pub closed: bool,

    /// Folders whose selection fails with a transport error.
    pub fail_select: HashSet<String>,
}

impl MockRemote {
    pub fn ensure_folder(&mut self, folder: &str) {
        self.folders.entry(folder.to_string()).or_default();
    }

    pub fn add_message(&mut self, folder: &str, message: impl Into<MockMessage>) -> u32 {
        let message = message.into();
        self.next_uid += 1;
        let uid = self.next_uid;
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(RemoteEnvelope {
                uid,
                flags: message.flags,
                raw: message.raw,
            });
        uid
    }

    pub fn raw_message(&self, folder: &str, uid: u32) -> RemoteEnvelope {
        self.folders
            .get(folder)
            .and_then(|messages| messages.iter().find(|m| m.uid == uid))
            .cloned()
            .unwrap_or_else(|| panic!("no message {uid} in {folder}"))
    }

    pub fn flags(&self, folder: &str, uid: u32) -> RemoteFlags {
        self.raw_message(folder, uid).flags
    }
}

#[async_trait]
impl RemoteSession for MockRemote {
    async fn select_folder(&mut self, folder: &str) -> Result<(), RemoteError> {
        if self.fail_select.contains(folder) {
            return Err(RemoteError::Transport(format!("select {folder} failed")));
        }
        Ok(())
    }

    async fn list_folders(&mut self) -> Result<Vec<String>, RemoteError> {
        Ok(self.folders.keys().cloned().collect())
    }

    async fn create_folder(&mut self, folder: &str) -> Result<(), RemoteError> {
        self.ensure_folder(folder);
        Ok(())
    }

    async fn delete_folder(&mut self, folder: &str) -> Result<(), RemoteError> {
        self.folders.remove(folder);
        Ok(())
    }

    async fn fetch_messages(
        &mut self,
        folder: &str,
        since_uid: Option<u32>,
    ) -> Result<Vec<RemoteEnvelope>, RemoteError> {
        let floor = since_uid.unwrap_or(0);
        Ok(self
            .folders
            .get(folder)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.uid > floor)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn append(
        &mut self,
        folder: &str,
        flags: RemoteFlags,
        raw: &str,
    ) -> Result<u32, RemoteError> {
        if !self.folders.contains_key(folder) {
            return Err(RemoteError::Protocol(format!("no such folder {folder}")));
        }
        Ok(self.add_message(
            folder,
            MockMessage {
                flags,
                raw: raw.to_string(),
            },
        ))
    }

    async fn store_flags(
        &mut self,
        folder: &str,
        uids: &[u32],
        flag: RemoteFlag,
        value: bool,
    ) -> Result<(), RemoteError> {
        let messages = self
            .folders
            .get_mut(folder)
            .ok_or_else(|| RemoteError::Protocol(format!("no such folder {folder}")))?;
        for message in messages.iter_mut().filter(|m| uids.contains(&m.uid)) {
            match flag {
                RemoteFlag::Seen => message.flags.seen = value,
                RemoteFlag::Deleted => message.flags.deleted = value,
            }
        }
        Ok(())
    }

    async fn search_header(
        &mut self,
        folder: &str,
        name: &str,
        value: &str,
    ) -> Result<Vec<u32>, RemoteError> {
        let Some(messages) = self.folders.get(folder) else {
            return Ok(Vec::new());
        };
        Ok(messages
            .iter()
            .filter(|m| {
                crate::envelope::Envelope::parse(&m.raw)
                    .ok()
                    .and_then(|envelope| envelope.header(name).map(|v| v == value))
                    .unwrap_or(false)
            })
            .map(|m| m.uid)
            .collect())
    }

    async fn expunge(&mut self, folder: &str) -> Result<(), RemoteError> {
        if let Some(messages) = self.folders.get_mut(folder) {
            messages.retain(|m| !m.flags.deleted);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RemoteError> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LocalInner {
    folders: Vec<String>,
    messages: BTreeMap<u64, ResolvedMessage>,
    objects: BTreeMap<u64, SyncObject>,
    markers: HashMap<String, u32>,
    content_deleted: BTreeSet<u64>,
    next_id: u64,
}

/// In-memory local store.
#[derive(Debug, Default)]
pub struct MockLocal {
    inner: Mutex<LocalInner>,
}

impl MockLocal {
    pub fn with_folders(folders: &[&str]) -> Self {
        let store = MockLocal::default();
        store
            .inner
            .lock()
            .unwrap()
            .folders
            .extend(folders.iter().map(|f| f.to_string()));
        store
    }

    /// Inserts a message with a fresh push-requested object; `adjust`
    /// fixes up the object before it is stored.
    pub fn insert_message(
        &self,
        message: ResolvedMessage,
        adjust: impl FnOnce(&mut SyncObject),
    ) -> LocalMessageId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = LocalMessageId(inner.next_id);
        let mut object = SyncObject::for_local(
            message.kind(),
            &message.meta.folder,
            id,
            &message.meta.conversation_id,
        );
        adjust(&mut object);
        inner.messages.insert(id.0, message);
        inner.objects.insert(id.0, object);
        id
    }

    pub fn object(&self, id: LocalMessageId) -> SyncObject {
        self.inner.lock().unwrap().objects[&id.0].clone()
    }

    pub fn single_message(&self) -> (ResolvedMessage, SyncObject) {
        let inner = self.inner.lock().unwrap();
        assert_eq!(inner.messages.len(), 1, "expected exactly one message");
        let (id, message) = inner.messages.iter().next().map(|(k, v)| (*k, v.clone())).unwrap();
        (message, inner.objects[&id].clone())
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    pub fn content_deleted(&self, id: LocalMessageId) -> bool {
        self.inner.lock().unwrap().content_deleted.contains(&id.0)
    }
}

#[async_trait]
impl LocalStore for MockLocal {
    async fn list_folders(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().unwrap().folders.clone())
    }

    async fn uid_marker(&self, folder: &str) -> Result<Option<u32>> {
        Ok(self.inner.lock().unwrap().markers.get(folder).copied())
    }

    async fn set_uid_marker(&self, folder: &str, uid: u32) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .markers
            .insert(folder.to_string(), uid);
        Ok(())
    }

    async fn sync_object(&self, local_id: LocalMessageId) -> Result<Option<SyncObject>> {
        Ok(self.inner.lock().unwrap().objects.get(&local_id.0).cloned())
    }

    async fn save_sync_object(&self, object: &SyncObject) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .insert(object.local_id.0, object.clone());
        Ok(())
    }

    async fn delete_sync_object(&self, local_id: LocalMessageId) -> Result<()> {
        self.inner.lock().unwrap().objects.remove(&local_id.0);
        Ok(())
    }

    async fn correlation_items(&self, folder: &str) -> Result<Vec<LocalItem>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .objects
            .values()
            .filter(|o| o.folder == folder && o.uid.is_none())
            .filter_map(|o| {
                inner
                    .messages
                    .get(&o.local_id.0)
                    .map(|m| LocalItem::of(m, o.local_id))
            })
            .collect())
    }

    async fn bound_uids(&self, folder: &str) -> Result<Vec<u32>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .objects
            .values()
            .filter(|o| o.folder == folder)
            .filter_map(|o| o.uid)
            .collect())
    }

    async fn push_candidates(&self, folder: &str) -> Result<Vec<SyncObject>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .objects
            .values()
            .filter(|o| o.folder == folder && o.push_status == crate::sync::PushStatus::PushRequested)
            .cloned()
            .collect())
    }

    async fn flag_update_candidates(&self, folder: &str) -> Result<Vec<SyncObject>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .objects
            .values()
            .filter(|o| o.folder == folder && o.has_pending_report())
            .cloned()
            .collect())
    }

    async fn create_message(
        &self,
        message: &ResolvedMessage,
        mut object: SyncObject,
    ) -> Result<SyncObject> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        object.local_id = LocalMessageId(inner.next_id);
        inner.messages.insert(object.local_id.0, message.clone());
        inner.objects.insert(object.local_id.0, object.clone());
        Ok(object)
    }

    async fn message_for_push(&self, local_id: LocalMessageId) -> Result<ResolvedMessage> {
        self.inner
            .lock()
            .unwrap()
            .messages
            .get(&local_id.0)
            .cloned()
            .ok_or_else(|| anyhow!("no message {local_id}"))
    }

    async fn delete_message_content(&self, local_id: LocalMessageId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.messages.remove(&local_id.0);
        inner.content_deleted.insert(local_id.0);
        Ok(())
    }

    async fn purge_folder(&self, folder: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let ids: Vec<u64> = inner
            .objects
            .values()
            .filter(|o| o.folder == folder)
            .map(|o| o.local_id.0)
            .collect();
        for id in ids {
            inner.messages.remove(&id);
            inner.objects.remove(&id);
        }
        inner.markers.remove(folder);
        Ok(())
    }
}
