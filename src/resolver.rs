//! # Message type resolution.
//!
//! State-free classification of a decoded envelope into one of the seven
//! supported message kinds. Resolution inspects headers and, for CPIM
//! envelopes, peeks just far enough into the body to read the inner
//! content-type; it never mutates or consumes the envelope. The full
//! variant parse happens afterwards, guided by the returned kind.

use strum_macros::Display;

use crate::constants::{
    CPIM_MEDIA_TYPE, CPM_SESSION_MEDIA_TYPE, FILE_TRANSFER_MEDIA_TYPE, GROUP_STATE_MEDIA_TYPE,
    IMDN_MEDIA_TYPE, MULTIMEDIA_MESSAGE, PAGER_MESSAGE, TEXT_PLAIN,
};
use crate::envelope::Envelope;
use crate::error::ParseError;
use crate::headerdef::HeaderDef;

/// The seven supported message kinds.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Chat,
    Imdn,
    FileTransfer,
    GroupSession,
    GroupState,
    Sms,
    Mms,
}

/// Media type portion of a content-type value, parameters stripped.
pub(crate) fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// Classifies an envelope.
///
/// A `Message-Context` header short-circuits all further inspection;
/// otherwise classification runs on the outer content-type and, for
/// CPIM, on the inner one.
pub fn resolve(envelope: &Envelope) -> Result<MessageKind, ParseError> {
    if let Some(context) = envelope.get(HeaderDef::MessageContext) {
        let token = context.trim();
        if token.eq_ignore_ascii_case(PAGER_MESSAGE) {
            return Ok(MessageKind::Sms);
        }
        if token.eq_ignore_ascii_case(MULTIMEDIA_MESSAGE) {
            return Ok(MessageKind::Mms);
        }
        return Err(ParseError::UnsupportedMessageType {
            content_type: token.to_string(),
        });
    }

    let content_type = envelope.require(HeaderDef::ContentType)?;
    let lowered = content_type.to_lowercase();

    if media_type(&lowered) == CPIM_MEDIA_TYPE {
        let body = envelope.require_body()?;
        let inner = Envelope::parse(body)
            .map_err(|err| ParseError::MalformedBody(err.to_string()))?;
        let inner_type = inner
            .get(HeaderDef::ContentType)
            .ok_or_else(|| ParseError::MissingHeader(HeaderDef::ContentType.to_string()))?
            .to_lowercase();

        if inner_type.contains(TEXT_PLAIN) {
            return Ok(MessageKind::Chat);
        }
        if inner_type.contains(IMDN_MEDIA_TYPE) {
            return Ok(MessageKind::Imdn);
        }
        if inner_type.contains(FILE_TRANSFER_MEDIA_TYPE) {
            return Ok(MessageKind::FileTransfer);
        }
        return Err(ParseError::UnsupportedMessageType {
            content_type: inner_type,
        });
    }

    if lowered.contains(CPM_SESSION_MEDIA_TYPE) {
        return Ok(MessageKind::GroupSession);
    }
    if lowered.contains(GROUP_STATE_MEDIA_TYPE) {
        return Ok(MessageKind::GroupState);
    }

    Err(ParseError::UnsupportedMessageType {
        content_type: content_type.to_string(),
    })
}
