//! # Typed message model.
//!
//! One variant per resolved message kind, constructed either from a
//! fetched remote envelope (immutable, read-only view for one pass) or
//! from a local record about to be pushed, in which case
//! [`ResolvedMessage::to_envelope`] populates the outgoing header block
//! and freezes it into wire form.

use chrono::{DateTime, FixedOffset};

use crate::constants::{
    CPIM_MEDIA_TYPE, CPM_SESSION_MEDIA_TYPE, Direction, FILE_TRANSFER_MEDIA_TYPE,
    GROUP_STATE_MEDIA_TYPE, IMDN_MEDIA_TYPE, MULTIMEDIA_MESSAGE, PAGER_MESSAGE,
};
use crate::cpim::{self, CpimBody, Multipart, Part, Payload};
use crate::envelope::Envelope;
use crate::error::ParseError;
use crate::file_transfer::{self, FileTransferInfo};
use crate::group::{self, GroupSessionInfo, GroupStateInfo};
use crate::headerdef::HeaderDef;
use crate::imdn::{self, DeliveryStatus, ImdnDocument};
use crate::remote::RemoteEnvelope;
use crate::resolver::{self, MessageKind};
use crate::tools::{format_cpim_date, format_imap_date, parse_cpim_date, parse_imap_date};

/// Attributes shared by all message kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMeta {
    pub folder: String,

    /// Remote sequence number; `None` until the remote store assigns one.
    pub uid: Option<u32>,
    pub seen: bool,
    pub deleted: bool,
    pub direction: Direction,
    pub conversation_id: String,

    /// Outer `From`/`To` values, kept verbatim for serialization.
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Whether the conversation is one-to-one; group chats carry a
    /// contribution id distinct from the conversation id.
    pub one_to_one: bool,
    pub contribution_id: String,

    /// Stable cross-store identifier of this chat message.
    pub imdn_message_id: String,
    pub text: String,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImdnMessage {
    /// Identifier of this notification itself.
    pub notification_id: String,

    /// Identifier of the chat message the receipt refers to.
    pub referenced_id: String,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferMessage {
    pub transfer_id: String,
    pub info: FileTransferInfo,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSessionMessage {
    pub contribution_id: String,
    pub info: GroupSessionInfo,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStateMessage {
    pub info: GroupStateInfo,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    /// Content fingerprint used for heuristic correlation.
    pub correlator: String,
    pub text: String,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MmsMessage {
    pub message_id: String,
    pub subject: Option<String>,
    pub parts: Multipart,
    pub timestamp: DateTime<FixedOffset>,
}

/// Kind-specific payload of a resolved message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageVariant {
    Chat(ChatMessage),
    Imdn(ImdnMessage),
    FileTransfer(FileTransferMessage),
    GroupSession(GroupSessionMessage),
    GroupState(GroupStateMessage),
    Sms(SmsMessage),
    Mms(MmsMessage),
}

/// A fully decoded message: shared attributes plus typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMessage {
    pub meta: MessageMeta,
    pub variant: MessageVariant,
}

impl ResolvedMessage {
    /// Decodes one fetched remote envelope: codec, resolver, then the
    /// kind-guided variant parse.
    pub fn from_remote(
        folder: &str,
        remote: &RemoteEnvelope,
        self_identity: Option<&str>,
    ) -> Result<Self, ParseError> {
        let envelope = Envelope::parse(&remote.raw)?;
        let kind = resolver::resolve(&envelope)?;
        Self::from_envelope(
            folder,
            Some(remote.uid),
            remote.flags.seen,
            remote.flags.deleted,
            &envelope,
            kind,
            self_identity,
        )
    }

    /// Second, kind-guided parse of an already classified envelope.
    #[allow(clippy::too_many_arguments)]
    pub fn from_envelope(
        folder: &str,
        uid: Option<u32>,
        seen: bool,
        deleted: bool,
        envelope: &Envelope,
        kind: MessageKind,
        self_identity: Option<&str>,
    ) -> Result<Self, ParseError> {
        let direction = match envelope.get(HeaderDef::MessageDirection) {
            Some(value) => value.trim().parse().map_err(|_| {
                ParseError::MalformedEnvelope(format!("bad message direction {value:?}"))
            })?,
            None => Direction::Incoming,
        };
        let meta = MessageMeta {
            folder: folder.to_string(),
            uid,
            seen,
            deleted,
            direction,
            conversation_id: envelope
                .get(HeaderDef::ConversationId)
                .unwrap_or_default()
                .to_string(),
            from: envelope.get(HeaderDef::From_).map(str::to_string),
            to: envelope.get(HeaderDef::To).map(str::to_string),
        };

        let variant = match kind {
            MessageKind::Chat => parse_chat(envelope, &meta)?,
            MessageKind::Imdn => parse_imdn_message(envelope)?,
            MessageKind::FileTransfer => parse_file_transfer(envelope)?,
            MessageKind::GroupSession => parse_group_session(envelope, self_identity)?,
            MessageKind::GroupState => parse_group_state(envelope, self_identity)?,
            MessageKind::Sms => parse_sms(envelope)?,
            MessageKind::Mms => parse_mms(envelope)?,
        };

        Ok(ResolvedMessage { meta, variant })
    }

    pub fn kind(&self) -> MessageKind {
        match &self.variant {
            MessageVariant::Chat(_) => MessageKind::Chat,
            MessageVariant::Imdn(_) => MessageKind::Imdn,
            MessageVariant::FileTransfer(_) => MessageKind::FileTransfer,
            MessageVariant::GroupSession(_) => MessageKind::GroupSession,
            MessageVariant::GroupState(_) => MessageKind::GroupState,
            MessageVariant::Sms(_) => MessageKind::Sms,
            MessageVariant::Mms(_) => MessageKind::Mms,
        }
    }

    /// Remote party of the conversation, if one is recorded.
    ///
    /// Incoming messages name it in `From`, outgoing ones in `To`;
    /// outgoing group messages have none.
    pub fn remote_party(&self) -> Option<&str> {
        match self.meta.direction {
            Direction::Incoming => self.meta.from.as_deref(),
            Direction::Outgoing => self.meta.to.as_deref(),
        }
    }

    /// Stable cross-store identifier, absent for legacy SMS.
    pub fn stable_id(&self) -> Option<&str> {
        match &self.variant {
            MessageVariant::Chat(chat) => Some(&chat.imdn_message_id),
            MessageVariant::Imdn(imdn) => Some(&imdn.notification_id),
            MessageVariant::FileTransfer(ft) => Some(&ft.transfer_id),
            MessageVariant::GroupSession(session) => Some(&session.contribution_id),
            MessageVariant::GroupState(state) => Some(&state.info.rejoin_id),
            MessageVariant::Mms(mms) => Some(&mms.message_id),
            MessageVariant::Sms(_) => None,
        }
    }

    /// Content fingerprint for heuristic correlation (legacy kinds only).
    pub fn fingerprint(&self) -> Option<String> {
        match &self.variant {
            MessageVariant::Sms(sms) => Some(sms.correlator.clone()),
            MessageVariant::Mms(mms) => Some(crate::correlate::mms_fingerprint(&mms.parts)),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        match &self.variant {
            MessageVariant::Chat(chat) => Some(chat.timestamp),
            MessageVariant::Imdn(imdn) => Some(imdn.timestamp),
            MessageVariant::FileTransfer(ft) => Some(ft.timestamp),
            MessageVariant::GroupSession(session) => session.timestamp,
            MessageVariant::GroupState(state) => state.timestamp,
            MessageVariant::Sms(sms) => Some(sms.timestamp),
            MessageVariant::Mms(mms) => Some(mms.timestamp),
        }
    }

    /// Header name and value to search the remote store by when the
    /// message has no recorded UID yet.
    pub fn search_key(&self) -> Option<(HeaderDef, &str)> {
        match &self.variant {
            MessageVariant::Chat(chat) => Some((HeaderDef::ImdnMessageId, &chat.imdn_message_id)),
            MessageVariant::Imdn(imdn) => Some((HeaderDef::ImdnMessageId, &imdn.notification_id)),
            MessageVariant::FileTransfer(ft) => Some((HeaderDef::ImdnMessageId, &ft.transfer_id)),
            MessageVariant::GroupSession(session) => {
                Some((HeaderDef::ContributionId, &session.contribution_id))
            }
            MessageVariant::GroupState(_) => None,
            MessageVariant::Sms(sms) => Some((HeaderDef::MessageCorrelator, &sms.correlator)),
            MessageVariant::Mms(mms) => Some((HeaderDef::MessageId, &mms.message_id)),
        }
    }

    /// Populates the outgoing header block for this message.
    pub fn to_envelope(&self) -> Envelope {
        let mut envelope = Envelope::new();
        if let Some(from) = &self.meta.from {
            envelope.set_header(HeaderDef::From_, from);
        }
        if let Some(to) = &self.meta.to {
            envelope.set_header(HeaderDef::To, to);
        }
        if let Some(timestamp) = self.timestamp() {
            envelope.set_header(HeaderDef::Date, format_imap_date(&timestamp));
        }
        if !self.meta.conversation_id.is_empty() {
            envelope.set_header(HeaderDef::ConversationId, &self.meta.conversation_id);
        }

        match &self.variant {
            MessageVariant::Chat(chat) => {
                envelope.set_header(HeaderDef::ContributionId, &chat.contribution_id);
                envelope.set_header(HeaderDef::ImdnMessageId, &chat.imdn_message_id);
                envelope.set_header(HeaderDef::MessageDirection, self.meta.direction.to_string());
                envelope.set_header(HeaderDef::ContentType, CPIM_MEDIA_TYPE);
                envelope.set_body(
                    self.cpim_wrap("text/plain; charset=utf-8", chat.text.clone(), chat.timestamp),
                );
            }
            MessageVariant::Imdn(imdn_msg) => {
                envelope.set_header(HeaderDef::ImdnMessageId, &imdn_msg.notification_id);
                envelope.set_header(HeaderDef::MessageDirection, self.meta.direction.to_string());
                envelope.set_header(HeaderDef::ContentType, CPIM_MEDIA_TYPE);
                let document = imdn::build_imdn(&ImdnDocument {
                    message_id: imdn_msg.referenced_id.clone(),
                    status: imdn_msg.status,
                    datetime: Some(imdn_msg.timestamp),
                });
                envelope.set_body(self.cpim_wrap(IMDN_MEDIA_TYPE, document, imdn_msg.timestamp));
            }
            MessageVariant::FileTransfer(ft) => {
                envelope.set_header(HeaderDef::ImdnMessageId, &ft.transfer_id);
                envelope.set_header(HeaderDef::MessageDirection, self.meta.direction.to_string());
                envelope.set_header(HeaderDef::ContentType, CPIM_MEDIA_TYPE);
                let document = file_transfer::build_file_transfer_info(&ft.info);
                envelope.set_body(self.cpim_wrap(FILE_TRANSFER_MEDIA_TYPE, document, ft.timestamp));
            }
            MessageVariant::GroupSession(session) => {
                envelope.set_header(HeaderDef::ContributionId, &session.contribution_id);
                envelope.set_header(HeaderDef::ContentType, CPM_SESSION_MEDIA_TYPE);
                envelope.set_body(group::build_group_session(&session.info));
            }
            MessageVariant::GroupState(state) => {
                envelope.set_header(HeaderDef::ContentType, GROUP_STATE_MEDIA_TYPE);
                envelope.set_body(group::build_group_state(&state.info));
            }
            MessageVariant::Sms(sms) => {
                envelope.set_header(HeaderDef::MessageContext, PAGER_MESSAGE);
                envelope.set_header(HeaderDef::MessageCorrelator, &sms.correlator);
                envelope.set_header(HeaderDef::MessageDirection, self.meta.direction.to_string());
                envelope.set_header(HeaderDef::ContentType, "text/plain; charset=utf-8");
                envelope.set_body(sms.text.clone());
            }
            MessageVariant::Mms(mms) => {
                if let Some(subject) = &mms.subject {
                    envelope.set_header(HeaderDef::Subject, subject);
                }
                envelope.set_header(HeaderDef::MessageContext, MULTIMEDIA_MESSAGE);
                envelope.set_header(HeaderDef::MessageId, &mms.message_id);
                envelope.set_header(HeaderDef::MessageDirection, self.meta.direction.to_string());
                envelope.set_header(
                    HeaderDef::ContentType,
                    format!("multipart/related; boundary=\"{}\"", mms.parts.boundary),
                );
                envelope.set_body(mms.parts.serialize());
            }
        }
        envelope
    }

    /// Freezes the message into wire text for a remote append.
    pub fn to_wire(&self) -> String {
        self.to_envelope().serialize()
    }

    fn cpim_wrap(
        &self,
        content_type: &str,
        content: String,
        timestamp: DateTime<FixedOffset>,
    ) -> String {
        let mut inner = Envelope::new();
        if let Some(from) = &self.meta.from {
            inner.set_header(HeaderDef::From_, from);
        }
        if let Some(to) = &self.meta.to {
            inner.set_header(HeaderDef::To, to);
        }
        inner.set_header(HeaderDef::DateTime, format_cpim_date(&timestamp));
        inner.set_header(HeaderDef::ContentType, content_type);
        CpimBody {
            headers: inner,
            payload: Payload::Text(content),
        }
        .serialize()
    }
}

fn parse_chat(envelope: &Envelope, meta: &MessageMeta) -> Result<MessageVariant, ParseError> {
    if meta.conversation_id.is_empty() {
        return Err(ParseError::MissingHeader(
            HeaderDef::ConversationId.to_string(),
        ));
    }
    let contribution_id = envelope.require(HeaderDef::ContributionId)?.to_string();
    let cpim = cpim::parse_cpim(envelope.require_body()?)?;
    let imdn_message_id = envelope
        .get(HeaderDef::ImdnMessageId)
        .or_else(|| cpim.headers.get(HeaderDef::ImdnMessageId))
        .ok_or_else(|| ParseError::MissingHeader(HeaderDef::ImdnMessageId.to_string()))?
        .to_string();
    let timestamp = timestamp_of(envelope, &cpim)?;
    let text = cpim.text_payload()?.to_string();

    Ok(MessageVariant::Chat(ChatMessage {
        one_to_one: meta.conversation_id == contribution_id,
        contribution_id,
        imdn_message_id,
        text,
        timestamp,
    }))
}

fn parse_imdn_message(envelope: &Envelope) -> Result<MessageVariant, ParseError> {
    let cpim = cpim::parse_cpim(envelope.require_body()?)?;
    let document = imdn::parse_imdn(cpim.text_payload()?)?;
    let notification_id = envelope
        .get(HeaderDef::ImdnMessageId)
        .or_else(|| cpim.headers.get(HeaderDef::ImdnMessageId))
        .ok_or_else(|| ParseError::MissingHeader(HeaderDef::ImdnMessageId.to_string()))?
        .to_string();

    Ok(MessageVariant::Imdn(ImdnMessage {
        notification_id,
        referenced_id: document.message_id,
        status: document.status,
        timestamp: timestamp_of(envelope, &cpim)?,
    }))
}

fn parse_file_transfer(envelope: &Envelope) -> Result<MessageVariant, ParseError> {
    let cpim = cpim::parse_cpim(envelope.require_body()?)?;
    let info = file_transfer::parse_file_transfer_info(cpim.text_payload()?)?;
    let transfer_id = envelope
        .get(HeaderDef::ImdnMessageId)
        .or_else(|| cpim.headers.get(HeaderDef::ImdnMessageId))
        .ok_or_else(|| ParseError::MissingHeader(HeaderDef::ImdnMessageId.to_string()))?
        .to_string();

    Ok(MessageVariant::FileTransfer(FileTransferMessage {
        transfer_id,
        info,
        timestamp: timestamp_of(envelope, &cpim)?,
    }))
}

fn parse_group_session(
    envelope: &Envelope,
    self_identity: Option<&str>,
) -> Result<MessageVariant, ParseError> {
    let info = group::parse_group_session(envelope.require_body()?, self_identity)?;
    Ok(MessageVariant::GroupSession(GroupSessionMessage {
        contribution_id: envelope.require(HeaderDef::ContributionId)?.to_string(),
        info,
        timestamp: outer_date(envelope)?,
    }))
}

fn parse_group_state(
    envelope: &Envelope,
    self_identity: Option<&str>,
) -> Result<MessageVariant, ParseError> {
    let info = group::parse_group_state(envelope.require_body()?, self_identity)?;
    Ok(MessageVariant::GroupState(GroupStateMessage {
        info,
        timestamp: outer_date(envelope)?,
    }))
}

fn parse_sms(envelope: &Envelope) -> Result<MessageVariant, ParseError> {
    let text = envelope.require_body()?.to_string();
    let correlator = match envelope.get(HeaderDef::MessageCorrelator) {
        Some(value) => value.trim().to_string(),
        None => crate::correlate::message_correlator(&text),
    };
    let timestamp = parse_imap_date(envelope.require(HeaderDef::Date)?)?;
    Ok(MessageVariant::Sms(SmsMessage {
        correlator,
        text,
        timestamp,
    }))
}

fn parse_mms(envelope: &Envelope) -> Result<MessageVariant, ParseError> {
    let message_id = envelope.require(HeaderDef::MessageId)?.to_string();
    let content_type = envelope.require(HeaderDef::ContentType)?;
    let boundary = cpim::boundary_param(content_type)?;
    let parts = cpim::parse_multipart(envelope.require_body()?, &boundary)?;
    let timestamp = parse_imap_date(envelope.require(HeaderDef::Date)?)?;
    Ok(MessageVariant::Mms(MmsMessage {
        message_id,
        subject: envelope.get(HeaderDef::Subject).map(str::to_string),
        parts,
        timestamp,
    }))
}

/// CPIM `DateTime` wins over the outer `Date`; one of the two must be
/// present.
fn timestamp_of(envelope: &Envelope, cpim: &CpimBody) -> Result<DateTime<FixedOffset>, ParseError> {
    if let Some(value) = cpim.headers.get(HeaderDef::DateTime) {
        return parse_cpim_date(value);
    }
    if let Some(value) = envelope.get(HeaderDef::Date) {
        return parse_imap_date(value);
    }
    Err(ParseError::MissingHeader(HeaderDef::Date.to_string()))
}

fn outer_date(envelope: &Envelope) -> Result<Option<DateTime<FixedOffset>>, ParseError> {
    envelope
        .get(HeaderDef::Date)
        .map(parse_imap_date)
        .transpose()
}

/// Convenience constructor for a text part of an outgoing MMS.
pub fn mms_text_part(text: &str) -> Part {
    let mut headers = Envelope::new();
    headers.set_header(HeaderDef::ContentType, "text/plain; charset=utf-8");
    Part {
        headers,
        content: text.to_string(),
    }
}

/// Convenience constructor for an encoded media part of an outgoing MMS.
pub fn mms_media_part(content_type: &str, encoding: &str, content: &str) -> Part {
    let mut headers = Envelope::new();
    headers.set_header(HeaderDef::ContentType, content_type);
    headers.set_header(HeaderDef::ContentTransferEncoding, encoding);
    Part {
        headers,
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::remote::RemoteFlags;

    fn remote(raw: &str, uid: u32) -> RemoteEnvelope {
        RemoteEnvelope {
            uid,
            flags: RemoteFlags::default(),
            raw: raw.to_string(),
        }
    }

    fn chat_wire(conversation: &str, contribution: &str, imdn_id: &str) -> String {
        format!(
            "From: tel:+33600000001\r\n\
             To: tel:+33600000002\r\n\
             Date: 21-Feb-2019 07:43:24 +0100\r\n\
             Conversation-ID: {conversation}\r\n\
             Contribution-ID: {contribution}\r\n\
             IMDN-Message-ID: {imdn_id}\r\n\
             Message-Direction: received\r\n\
             Content-Type: message/cpim\r\n\
             \r\n\
             From: tel:+33600000001\r\n\
             To: tel:+33600000002\r\n\
             DateTime: 2019-02-21T07:43:24+01:00\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             Hello"
        )
    }

    #[test]
    fn test_parse_one_to_one_chat() {
        let message =
            ResolvedMessage::from_remote("cv1", &remote(&chat_wire("C1", "C1", "id7"), 12), None)
                .unwrap();
        assert_eq!(message.kind(), MessageKind::Chat);
        assert_eq!(message.meta.uid, Some(12));
        assert_eq!(message.meta.conversation_id, "C1");
        assert_eq!(message.remote_party(), Some("tel:+33600000001"));
        assert_eq!(message.stable_id(), Some("id7"));
        match &message.variant {
            MessageVariant::Chat(chat) => {
                assert!(chat.one_to_one);
                assert_eq!(chat.text, "Hello");
                assert_eq!(chat.timestamp.timestamp(), 1_550_731_404);
            }
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn test_group_chat_has_distinct_contribution_id() {
        let message =
            ResolvedMessage::from_remote("cv1", &remote(&chat_wire("C1", "G9", "id8"), 13), None)
                .unwrap();
        match &message.variant {
            MessageVariant::Chat(chat) => assert!(!chat.one_to_one),
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn test_chat_round_trip() {
        let raw = chat_wire("C1", "C1", "id7");
        let message = ResolvedMessage::from_remote("cv1", &remote(&raw, 12), None).unwrap();
        assert_eq!(message.to_wire(), raw);
    }

    #[test]
    fn test_chat_without_imdn_id_is_missing_header() {
        let raw = chat_wire("C1", "C1", "id7").replace("IMDN-Message-ID: id7\r\n", "");
        let err = ResolvedMessage::from_remote("cv1", &remote(&raw, 1), None).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingHeader("IMDN-Message-ID".to_string())
        );
    }

    #[test]
    fn test_sms_round_trip_and_correlator() {
        let raw = concat!(
            "From: tel:+33600000001\r\n",
            "To: tel:+33600000002\r\n",
            "Date: 21-Feb-2019 07:43:24 +0100\r\n",
            "Conversation-ID: S1\r\n",
            "Message-Context: pager-message\r\n",
            "Message-Correlator: 51d5359d8527f473\r\n",
            "Message-Direction: received\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "on my way"
        );
        let message = ResolvedMessage::from_remote("cv1", &remote(raw, 3), None).unwrap();
        assert_eq!(message.kind(), MessageKind::Sms);
        assert_eq!(message.stable_id(), None);
        assert_eq!(message.fingerprint().as_deref(), Some("51d5359d8527f473"));
        assert_eq!(message.to_wire(), raw);
    }

    #[test]
    fn test_sms_without_correlator_computes_fingerprint() {
        let raw = concat!(
            "Date: 21-Feb-2019 07:43:24 +0100\r\n",
            "Message-Context: pager-message\r\n",
            "\r\n",
            "on my way"
        );
        let message = ResolvedMessage::from_remote("cv1", &remote(raw, 3), None).unwrap();
        let fingerprint = message.fingerprint().unwrap();
        assert_eq!(
            fingerprint,
            crate::correlate::message_correlator("on my way")
        );
    }

    #[test]
    fn test_mms_multipart_and_round_trip() {
        let body = concat!(
            "--m1\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "see attached\r\n",
            "--m1\r\n",
            "Content-Type: image/jpeg\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "/9j/4AAQSkZJRg==\r\n",
            "--m1--"
        );
        let raw = format!(
            concat!(
                "Date: 21-Feb-2019 07:43:24 +0100\r\n",
                "Subject: holiday\r\n",
                "Message-Context: multimedia-message\r\n",
                "Message-ID: mms41\r\n",
                "Message-Direction: sent\r\n",
                "Content-Type: multipart/related; boundary=\"m1\"\r\n",
                "\r\n",
                "{body}"
            ),
            body = body
        );
        let message = ResolvedMessage::from_remote("cv1", &remote(&raw, 9), None).unwrap();
        assert_eq!(message.kind(), MessageKind::Mms);
        assert_eq!(message.stable_id(), Some("mms41"));
        match &message.variant {
            MessageVariant::Mms(mms) => {
                assert_eq!(mms.parts.parts.len(), 2);
                assert_eq!(mms.subject.as_deref(), Some("holiday"));
            }
            other => panic!("expected mms, got {other:?}"),
        }
        assert_eq!(message.to_wire(), raw);
    }

    #[test]
    fn test_built_mms_parses_back() {
        let parts = Multipart {
            boundary: "m2".to_string(),
            parts: vec![
                mms_text_part("see attached"),
                mms_media_part("image/jpeg", "base64", "/9j/4AAQSkZJRg=="),
            ],
        };
        let message = ResolvedMessage {
            meta: MessageMeta {
                folder: "cv1".to_string(),
                uid: None,
                seen: false,
                deleted: false,
                direction: Direction::Outgoing,
                conversation_id: "cv1".to_string(),
                from: None,
                to: Some("tel:+33600000002".to_string()),
            },
            variant: MessageVariant::Mms(MmsMessage {
                message_id: "mms77".to_string(),
                subject: None,
                parts: parts.clone(),
                timestamp: parse_imap_date("21-Feb-2019 07:43:24 +0100").unwrap(),
            }),
        };
        let back =
            ResolvedMessage::from_remote("cv1", &remote(&message.to_wire(), 30), None).unwrap();
        match &back.variant {
            MessageVariant::Mms(mms) => {
                assert_eq!(mms.parts, parts);
                assert_eq!(mms.message_id, "mms77");
            }
            other => panic!("expected mms, got {other:?}"),
        }
    }

    #[test]
    fn test_imdn_message() {
        let document = imdn::build_imdn(&ImdnDocument {
            message_id: "id7".to_string(),
            status: DeliveryStatus::Displayed,
            datetime: Some(parse_cpim_date("2019-02-21T08:00:00+01:00").unwrap()),
        });
        let raw = format!(
            "IMDN-Message-ID: n1\r\nMessage-Direction: received\r\n\
             Content-Type: message/cpim\r\n\r\n\
             DateTime: 2019-02-21T08:00:00+01:00\r\n\
             Content-Type: message/imdn+xml\r\n\r\n{document}"
        );
        let message = ResolvedMessage::from_remote("cv1", &remote(&raw, 20), None).unwrap();
        match &message.variant {
            MessageVariant::Imdn(imdn_msg) => {
                assert_eq!(imdn_msg.notification_id, "n1");
                assert_eq!(imdn_msg.referenced_id, "id7");
                assert_eq!(imdn_msg.status, DeliveryStatus::Displayed);
            }
            other => panic!("expected imdn, got {other:?}"),
        }
    }

    #[test]
    fn test_file_transfer_message() {
        let info = FileTransferInfo {
            file: crate::file_transfer::FileDescriptor {
                name: Some("sample.txt".to_string()),
                size: 339,
                content_type: Some("text/plain".to_string()),
                url: "https://content.example/download?id=abb".to_string(),
                expiry: None,
            },
            thumbnail: None,
        };
        let document = file_transfer::build_file_transfer_info(&info);
        let raw = format!(
            "IMDN-Message-ID: ft5\r\nContent-Type: message/cpim\r\n\r\n\
             DateTime: 2019-02-21T08:00:00+01:00\r\n\
             Content-Type: application/vnd.gsma.rcs-ft-http+xml\r\n\r\n{document}"
        );
        let message = ResolvedMessage::from_remote("cv1", &remote(&raw, 21), None).unwrap();
        match &message.variant {
            MessageVariant::FileTransfer(ft) => {
                assert_eq!(ft.transfer_id, "ft5");
                assert_eq!(ft.info, info);
            }
            other => panic!("expected file transfer, got {other:?}"),
        }
    }

    #[test]
    fn test_group_descriptors() {
        let session_raw = format!(
            "Conversation-ID: C1\r\nContribution-ID: G9\r\n\
             Content-Type: application/x-cpm-session\r\n\r\n{}",
            group::build_group_session(&GroupSessionInfo {
                subject: Some("Friday trip".to_string()),
                participants: vec!["tel:+33600000002".to_string()],
            })
        );
        let message = ResolvedMessage::from_remote("cv1", &remote(&session_raw, 30), None).unwrap();
        assert_eq!(message.kind(), MessageKind::GroupSession);
        assert_eq!(message.stable_id(), Some("G9"));

        let state_raw = format!(
            "Content-Type: application/group-state-object+xml\r\n\r\n{}",
            group::build_group_state(&GroupStateInfo {
                rejoin_id: "sip:focus;id=g1".to_string(),
                participants: vec!["tel:+33600000002".to_string()],
            })
        );
        let message = ResolvedMessage::from_remote("cv1", &remote(&state_raw, 31), None).unwrap();
        assert_eq!(message.kind(), MessageKind::GroupState);
        assert_eq!(message.stable_id(), Some("sip:focus;id=g1"));
    }
}
