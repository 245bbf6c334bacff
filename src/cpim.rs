//! # CPIM and multipart body parsing.
//!
//! The outer envelope body of chat, IMDN and file-transfer messages is a
//! CPIM layer: its own header block, one blank line, then the content.
//! The content is either a single typed payload or, for legacy MMS, a
//! multipart list delimited by a boundary marker. The same multipart
//! parser also runs directly on the outer body of an MMS envelope.

use crate::constants::MULTIPART_RELATED;
use crate::envelope::Envelope;
use crate::error::ParseError;
use crate::headerdef::HeaderDef;
use crate::tools::truncate;

/// Parsed CPIM layer: inner header block plus typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpimBody {
    pub headers: Envelope,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Single typed payload; the inner `Content-Type` says what it is.
    Text(String),

    /// Boundary-delimited part list (legacy MMS).
    Multipart(Multipart),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    pub boundary: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub headers: Envelope,
    pub content: String,
}

/// Parses the CPIM layer nested inside an outer envelope body.
///
/// Applies the same blank-line-split discipline as [`Envelope::parse`];
/// CPIM structurally requires the separator, so a headers-only block is
/// malformed here.
pub fn parse_cpim(text: &str) -> Result<CpimBody, ParseError> {
    let mut headers = Envelope::parse(text)
        .map_err(|err| ParseError::MalformedBody(err.to_string()))?;
    let content = headers
        .take_body()
        .ok_or_else(|| ParseError::MalformedBody("cpim block without separator".to_string()))?;

    let content_type = headers
        .get(HeaderDef::ContentType)
        .ok_or_else(|| ParseError::MissingHeader(HeaderDef::ContentType.to_string()))?;

    let payload = if content_type.to_lowercase().contains(MULTIPART_RELATED) {
        let boundary = boundary_param(content_type)?;
        Payload::Multipart(parse_multipart(&content, &boundary)?)
    } else {
        Payload::Text(content)
    };

    Ok(CpimBody { headers, payload })
}

impl CpimBody {
    /// Inverse of [`parse_cpim`], byte-identical given the same boundary.
    pub fn serialize(&self) -> String {
        let mut envelope = self.headers.clone();
        match &self.payload {
            Payload::Text(text) => envelope.set_body(text.clone()),
            Payload::Multipart(multipart) => envelope.set_body(multipart.serialize()),
        }
        envelope.serialize()
    }

    /// Inner `Content-Type`, if declared.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(HeaderDef::ContentType)
    }

    /// The single text payload, or `MalformedBody` for multipart content.
    pub fn text_payload(&self) -> Result<&str, ParseError> {
        match &self.payload {
            Payload::Text(text) => Ok(text),
            Payload::Multipart(_) => Err(ParseError::MalformedBody(
                "expected single payload, found multipart".to_string(),
            )),
        }
    }
}

/// Extracts the `boundary` parameter from a content-type value.
pub fn boundary_param(content_type: &str) -> Result<String, ParseError> {
    for param in content_type.split(';').skip(1) {
        if let Some((name, value)) = param.split_once('=') {
            if name.trim().eq_ignore_ascii_case("boundary") {
                let value = value.trim().trim_matches('"');
                if !value.is_empty() {
                    return Ok(value.to_string());
                }
            }
        }
    }
    Err(ParseError::MalformedBody(format!(
        "no boundary parameter in {:?}",
        truncate(content_type, 60)
    )))
}

/// Splits boundary-delimited content into parts.
///
/// Content before the first `--boundary` marker is ignored; the list is
/// terminated by `--boundary--`. Each segment is re-parsed as its own
/// mini header block plus content.
pub fn parse_multipart(content: &str, boundary: &str) -> Result<Multipart, ParseError> {
    let open = format!("--{boundary}\r\n");
    let next_open = format!("\r\n--{boundary}\r\n");
    let terminator = format!("\r\n--{boundary}--");

    let start = content.find(&open).ok_or_else(|| {
        ParseError::MalformedBody(format!("declared boundary {boundary:?} absent from content"))
    })?;

    let mut parts = Vec::new();
    let mut rest = &content[start + open.len()..];
    loop {
        let at_open = rest.find(&next_open);
        let at_end = rest.find(&terminator);
        match (at_open, at_end) {
            (Some(open_pos), end) if end.map_or(true, |e| open_pos < e) => {
                parts.push(parse_part(&rest[..open_pos])?);
                rest = &rest[open_pos + next_open.len()..];
            }
            (_, Some(end_pos)) => {
                parts.push(parse_part(&rest[..end_pos])?);
                break;
            }
            _ => {
                return Err(ParseError::MalformedBody(format!(
                    "multipart content not terminated by --{boundary}--"
                )));
            }
        }
    }

    Ok(Multipart {
        boundary: boundary.to_string(),
        parts,
    })
}

fn parse_part(segment: &str) -> Result<Part, ParseError> {
    let mut headers = Envelope::parse(segment)
        .map_err(|err| ParseError::MalformedBody(err.to_string()))?;
    let content = headers.take_body().ok_or_else(|| {
        ParseError::MalformedBody("part without header/content separator".to_string())
    })?;
    Ok(Part { headers, content })
}

impl Multipart {
    /// Re-emits the original boundary string around each part.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            out.push_str(&format!("--{}\r\n", self.boundary));
            for (key, value) in part.headers.headers() {
                out.push_str(&format!("{key}: {value}\r\n"));
            }
            out.push_str("\r\n");
            out.push_str(&part.content);
            out.push_str("\r\n");
        }
        out.push_str(&format!("--{}--", self.boundary));
        out
    }
}
