//! # Correlation of remote envelopes with local messages.
//!
//! Given a folder's fetched remote messages and the locally known
//! messages not yet bound to a remote UID, produce a matching plus two
//! residual sets: remote-only messages to create locally, and local-only
//! messages that still need a push.
//!
//! Matching runs in two rounds. Messages carrying a stable cross-store
//! identifier (IMDN message id, file-transfer id, MMS message id, group
//! descriptor ids) match directly. Legacy SMS/MMS without a reliable id
//! fall back to a heuristic: group by conversation, direction and a
//! content fingerprint, order both sides most recent first and pair them
//! positionally. Surplus oldest entries stay unmatched.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

use crate::constants::Direction;
use crate::cpim::Multipart;
use crate::headerdef::HeaderDef;
use crate::local::LocalMessageId;
use crate::message::ResolvedMessage;
use crate::resolver::MessageKind;

/// One remote message entering correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub uid: u32,
    pub kind: MessageKind,
    pub direction: Direction,
    pub conversation_id: String,
    pub stable_id: Option<String>,
    pub fingerprint: Option<String>,

    /// Epoch seconds; used only to order heuristic candidates.
    pub timestamp: i64,
}

impl RemoteItem {
    /// Extracts the correlation view of a decoded remote message.
    pub fn of(message: &ResolvedMessage, uid: u32) -> Self {
        RemoteItem {
            uid,
            kind: message.kind(),
            direction: message.meta.direction,
            conversation_id: message.meta.conversation_id.clone(),
            stable_id: message.stable_id().map(str::to_string),
            fingerprint: message.fingerprint(),
            timestamp: message.timestamp().map(|t| t.timestamp()).unwrap_or(0),
        }
    }
}

/// One locally known, not yet UID-bound message entering correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalItem {
    pub local_id: LocalMessageId,
    pub kind: MessageKind,
    pub direction: Direction,
    pub conversation_id: String,
    pub stable_id: Option<String>,
    pub fingerprint: Option<String>,
    pub timestamp: i64,
}

impl LocalItem {
    pub fn of(message: &ResolvedMessage, local_id: LocalMessageId) -> Self {
        LocalItem {
            local_id,
            kind: message.kind(),
            direction: message.meta.direction,
            conversation_id: message.meta.conversation_id.clone(),
            stable_id: message.stable_id().map(str::to_string),
            fingerprint: message.fingerprint(),
            timestamp: message.timestamp().map(|t| t.timestamp()).unwrap_or(0),
        }
    }
}

/// Outcome of one correlation round over a folder.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Correlation {
    /// Remote UID paired with the pre-existing local message.
    pub matched: Vec<(u32, LocalMessageId)>,

    /// Remote-only: to be created locally.
    pub new_remote: Vec<u32>,

    /// Local-only: stays `PushRequested` for a later push task.
    pub needs_push: Vec<LocalMessageId>,
}

#[derive(PartialEq, Eq, Hash)]
struct HeuristicKey<'a> {
    kind: MessageKind,
    direction: Direction,
    conversation_id: &'a str,
    fingerprint: &'a str,
}

/// Matches remote against local items. Pure and idempotent: the same
/// inputs always produce the same matching.
pub fn correlate(remote: &[RemoteItem], local: &[LocalItem]) -> Correlation {
    let mut outcome = Correlation::default();
    let mut used_local: HashSet<LocalMessageId> = HashSet::new();

    // Round 1: stable identifiers. First local occurrence of an id wins.
    let mut local_by_id: HashMap<&str, &LocalItem> = HashMap::new();
    for item in local {
        if let Some(id) = item.stable_id.as_deref() {
            local_by_id.entry(id).or_insert(item);
        }
    }

    let mut residual_remote: Vec<&RemoteItem> = Vec::new();
    for item in remote {
        let by_id = item
            .stable_id
            .as_deref()
            .and_then(|id| local_by_id.get(id))
            .filter(|candidate| !used_local.contains(&candidate.local_id));
        match by_id {
            Some(candidate) => {
                used_local.insert(candidate.local_id);
                outcome.matched.push((item.uid, candidate.local_id));
            }
            None => residual_remote.push(item),
        }
    }

    // Round 2: heuristic pairing on (kind, direction, conversation,
    // fingerprint) groups, most recent first.
    let mut groups: HashMap<HeuristicKey, (Vec<&RemoteItem>, Vec<&LocalItem>)> = HashMap::new();
    for &item in &residual_remote {
        if let Some(fingerprint) = item.fingerprint.as_deref() {
            let key = HeuristicKey {
                kind: item.kind,
                direction: item.direction,
                conversation_id: item.conversation_id.as_str(),
                fingerprint,
            };
            groups.entry(key).or_default().0.push(item);
        }
    }
    for item in local {
        if used_local.contains(&item.local_id) {
            continue;
        }
        if let Some(fingerprint) = item.fingerprint.as_deref() {
            let key = HeuristicKey {
                kind: item.kind,
                direction: item.direction,
                conversation_id: item.conversation_id.as_str(),
                fingerprint,
            };
            if let Some(group) = groups.get_mut(&key) {
                group.1.push(item);
            }
        }
    }

    for (_, (mut remote_group, mut local_group)) in groups {
        remote_group.sort_by(|a, b| (b.timestamp, b.uid).cmp(&(a.timestamp, a.uid)));
        local_group.sort_by(|a, b| (b.timestamp, b.local_id).cmp(&(a.timestamp, a.local_id)));
        for (remote_item, local_item) in remote_group.iter().zip(&local_group) {
            used_local.insert(local_item.local_id);
            outcome.matched.push((remote_item.uid, local_item.local_id));
        }
    }

    // Residuals: everything not paired above.
    let matched_uids: HashSet<u32> = outcome.matched.iter().map(|(uid, _)| *uid).collect();
    outcome.new_remote = remote
        .iter()
        .map(|item| item.uid)
        .filter(|uid| !matched_uids.contains(uid))
        .collect();
    outcome.needs_push = local
        .iter()
        .map(|item| item.local_id)
        .filter(|id| !used_local.contains(id))
        .collect();

    // Deterministic output order regardless of map iteration.
    outcome.matched.sort_unstable();
    outcome.new_remote.sort_unstable();
    outcome.needs_push.sort_unstable();
    outcome
}

/// Deterministic content fingerprint of an SMS body: hex of the first 8
/// bytes of SHA-256 over the trimmed text.
pub fn message_correlator(text: &str) -> String {
    let digest = Sha256::digest(text.trim().as_bytes());
    hex::encode(&digest[..8])
}

/// Fingerprint of MMS content, composed from each part's declared
/// content-type and content in order.
pub fn mms_fingerprint(parts: &Multipart) -> String {
    let mut hasher = Sha256::new();
    for part in &parts.parts {
        hasher.update(part.headers.get(HeaderDef::ContentType).unwrap_or_default());
        hasher.update([0u8]);
        hasher.update(&part.content);
        hasher.update([0xffu8]);
    }
    hex::encode(&hasher.finalize()[..8])
}
