//! # Group-session and group-state descriptor payloads.
//!
//! Group descriptors are stored alongside the conversation's messages in
//! the remote folder. The session descriptor records how the group was
//! created (subject, invited participants); the state descriptor records
//! how to rejoin it and who is currently in it. The local user identity
//! is passed in explicitly so it can be excluded from participant lists.

use crate::constants::SESSION_TYPE_GROUP;
use crate::error::ParseError;

/// Decoded CPM group-session descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSessionInfo {
    pub subject: Option<String>,
    pub participants: Vec<String>,
}

/// Decoded group-state descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStateInfo {
    /// Focus session identifier used to rejoin the group.
    pub rejoin_id: String,
    pub participants: Vec<String>,
}

/// Parses an `x-cpm-session` document.
///
/// Only the `Group` session kind is supported; anything else is rejected
/// as unsupported. Participants equal to `self_identity` are dropped.
pub fn parse_group_session(
    xml: &str,
    self_identity: Option<&str>,
) -> Result<GroupSessionInfo, ParseError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut session_type = None;
    let mut subject = None;
    let mut participants = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Start(ref event)) => {
                current = event.local_name().as_ref().to_vec();
            }
            Ok(quick_xml::events::Event::End(_)) => current.clear(),
            Ok(quick_xml::events::Event::Text(ref event)) => {
                let text = event
                    .unescape()
                    .map_err(|err| ParseError::MalformedBody(err.to_string()))?;
                let text = text.trim();
                match current.as_slice() {
                    b"session-type" => session_type = Some(text.to_string()),
                    b"subject" => subject = Some(text.to_string()),
                    b"participant" => participants.push(text.to_string()),
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(err) => {
                return Err(ParseError::MalformedBody(format!(
                    "invalid session xml: {err}"
                )));
            }
            Ok(_) => {}
        }
    }

    let session_type = session_type
        .ok_or_else(|| ParseError::MalformedBody("session without session-type".into()))?;
    if session_type != SESSION_TYPE_GROUP {
        return Err(ParseError::UnsupportedMessageType {
            content_type: format!("session-type {session_type}"),
        });
    }

    Ok(GroupSessionInfo {
        subject,
        participants: exclude_self(participants, self_identity),
    })
}

/// Parses a group-state document.
///
/// The participant list must be non-empty after parsing (excluding the
/// local user); an empty group state is meaningless and rejected.
pub fn parse_group_state(
    xml: &str,
    self_identity: Option<&str>,
) -> Result<GroupStateInfo, ParseError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut rejoin_id = None;
    let mut participants = Vec::new();

    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Start(ref event))
            | Ok(quick_xml::events::Event::Empty(ref event)) => {
                match event.local_name().as_ref() {
                    b"groupstate" => {
                        rejoin_id = attribute(event, b"lastfocussessionid")?;
                    }
                    b"participant" => {
                        if let Some(addr) = attribute(event, b"comm-addr")? {
                            participants.push(addr);
                        }
                    }
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(err) => {
                return Err(ParseError::MalformedBody(format!(
                    "invalid groupstate xml: {err}"
                )));
            }
            Ok(_) => {}
        }
    }

    let participants = exclude_self(participants, self_identity);
    if participants.is_empty() {
        return Err(ParseError::MalformedBody(
            "groupstate without participants".into(),
        ));
    }

    Ok(GroupStateInfo {
        rejoin_id: rejoin_id
            .ok_or_else(|| ParseError::MalformedBody("groupstate without rejoin id".into()))?,
        participants,
    })
}

fn exclude_self(participants: Vec<String>, self_identity: Option<&str>) -> Vec<String> {
    match self_identity {
        Some(me) => participants.into_iter().filter(|p| p != me).collect(),
        None => participants,
    }
}

fn attribute(
    event: &quick_xml::events::BytesStart<'_>,
    name: &[u8],
) -> Result<Option<String>, ParseError> {
    for attr in event.attributes() {
        let attr = attr.map_err(|err| ParseError::MalformedBody(err.to_string()))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| ParseError::MalformedBody(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Builds the session descriptor used when pushing group metadata.
pub fn build_group_session(info: &GroupSessionInfo) -> String {
    let subject = info
        .subject
        .as_ref()
        .map(|s| format!("<subject>{s}</subject>"))
        .unwrap_or_default();
    let participants: String = info
        .participants
        .iter()
        .map(|p| format!("<participant>{p}</participant>"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <session><session-type>{SESSION_TYPE_GROUP}</session-type>{subject}\
         <participants>{participants}</participants></session>"
    )
}

/// Builds the group-state descriptor.
pub fn build_group_state(info: &GroupStateInfo) -> String {
    let participants: String = info
        .participants
        .iter()
        .map(|p| format!("<participant comm-addr=\"{p}\"/>"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <groupstate lastfocussessionid=\"{}\">{participants}</groupstate>",
        info.rejoin_id
    )
}
