//! # IMDN payload parsing and building.
//!
//! Instant Message Disposition Notifications carry a delivery or display
//! receipt for a referenced chat message as a small XML document inside
//! the CPIM layer (`message/imdn+xml`).

use chrono::{DateTime, FixedOffset};
use strum_macros::Display;

use crate::error::ParseError;
use crate::tools::{format_cpim_date, parse_cpim_date};

/// Disposition reported by an IMDN document.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Displayed,
    Error,
}

/// Decoded `message/imdn+xml` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImdnDocument {
    /// Identifier of the chat message this receipt refers to.
    pub message_id: String,
    pub status: DeliveryStatus,
    pub datetime: Option<DateTime<FixedOffset>>,
}

/// Parses an IMDN XML document.
pub fn parse_imdn(xml: &str) -> Result<ImdnDocument, ParseError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut message_id = None;
    let mut datetime = None;
    let mut status = None;
    let mut in_status = false;
    let mut current: Vec<u8> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Start(ref event)) => {
                current = event.local_name().as_ref().to_vec();
                match current.as_slice() {
                    b"status" => in_status = true,
                    tag if in_status => status = status.or_else(|| status_from_tag(tag)),
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Empty(ref event)) => {
                if in_status {
                    let tag = event.local_name();
                    status = status.or_else(|| status_from_tag(tag.as_ref()));
                }
            }
            Ok(quick_xml::events::Event::End(ref event)) => {
                if event.local_name().as_ref() == b"status" {
                    in_status = false;
                }
                current.clear();
            }
            Ok(quick_xml::events::Event::Text(ref event)) => {
                let text = event
                    .unescape()
                    .map_err(|err| ParseError::MalformedBody(err.to_string()))?;
                match current.as_slice() {
                    b"message-id" => message_id = Some(text.trim().to_string()),
                    b"datetime" => datetime = Some(parse_cpim_date(&text)?),
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(err) => {
                return Err(ParseError::MalformedBody(format!("invalid imdn xml: {err}")));
            }
            Ok(_) => {}
        }
    }

    Ok(ImdnDocument {
        message_id: message_id
            .ok_or_else(|| ParseError::MalformedBody("imdn without message-id".to_string()))?,
        status: status
            .ok_or_else(|| ParseError::MalformedBody("imdn without status".to_string()))?,
        datetime,
    })
}

fn status_from_tag(tag: &[u8]) -> Option<DeliveryStatus> {
    match tag {
        b"delivered" => Some(DeliveryStatus::Delivered),
        b"displayed" => Some(DeliveryStatus::Displayed),
        b"error" | b"failed" => Some(DeliveryStatus::Error),
        _ => None,
    }
}

/// Builds the XML form used when pushing a notification to the remote
/// store. [`parse_imdn`] accepts its own output.
pub fn build_imdn(doc: &ImdnDocument) -> String {
    let (notification, leaf) = match doc.status {
        DeliveryStatus::Delivered => ("delivery-notification", "delivered"),
        DeliveryStatus::Displayed => ("display-notification", "displayed"),
        DeliveryStatus::Error => ("delivery-notification", "error"),
    };
    let datetime = doc
        .datetime
        .as_ref()
        .map(|dt| format!("<datetime>{}</datetime>", format_cpim_date(dt)))
        .unwrap_or_default();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <imdn xmlns=\"urn:ietf:params:xml:ns:imdn\">\
         <message-id>{}</message-id>{datetime}\
         <{notification}><status><{leaf}/></status></{notification}>\
         </imdn>",
        doc.message_id
    )
}
