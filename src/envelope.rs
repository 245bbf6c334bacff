//! # Envelope codec.
//!
//! An envelope is the RFC-822-like outer layer stored in the remote
//! message archive: an ordered header block, one blank line, then an
//! opaque body. Header keys are compared case-insensitively on read but
//! preserved verbatim on write; duplicate keys stay in sequence while
//! lookup returns the first occurrence.
//!
//! The wire form is strict about line endings: every header line and the
//! block separator use `CRLF`.

use std::collections::HashMap;

use crate::error::ParseError;
use crate::headerdef::HeaderDef;
use crate::tools::truncate;

pub(crate) const CRLF: &str = "\r\n";

/// Ordered header block plus optional opaque body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    headers: Vec<(String, String)>,

    /// Lower-cased key to first position in `headers`.
    index: HashMap<String, usize>,

    body: Option<String>,
}

impl Envelope {
    pub fn new() -> Self {
        Default::default()
    }

    /// Splits `raw` on the first blank line into header block and body.
    ///
    /// Input without a blank-line separator parses as a headers-only
    /// envelope; whether that is acceptable depends on the message kind
    /// and is checked by the second-stage variant parse.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let (head, body) = match raw.split_once("\r\n\r\n") {
            Some((head, body)) => (head, Some(body)),
            None => (raw, None),
        };

        let mut envelope = Envelope::new();
        for line in head.split(CRLF) {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once(':').ok_or_else(|| {
                ParseError::MalformedEnvelope(format!(
                    "header line without colon: {:?}",
                    truncate(line, 60)
                ))
            })?;
            envelope.add_header(key, value.trim_start());
        }
        if let Some(body) = body {
            envelope.set_body(body);
        }
        Ok(envelope)
    }

    /// Deterministic wire form: headers in insertion order, each
    /// `Key: Value` terminated by CRLF, one blank CRLF, then the body.
    /// A headers-only envelope serializes without the blank line.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.headers {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push_str(CRLF);
        }
        if let Some(body) = &self.body {
            out.push_str(CRLF);
            out.push_str(body);
        }
        out
    }

    /// Appends a header, keeping the key verbatim for serialization.
    ///
    /// The fast-lookup index is fed the lower-cased key; a duplicate key
    /// is retained in sequence but does not displace the first entry.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let lookup = key.to_lowercase();
        self.headers.push((key, value.into()));
        self.index.entry(lookup).or_insert(self.headers.len() - 1);
    }

    pub fn set_header(&mut self, def: HeaderDef, value: impl Into<String>) {
        self.add_header(def.to_string(), value);
    }

    /// Case-insensitive lookup returning the first occurrence.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.index
            .get(&name.to_lowercase())
            .map(|&pos| self.headers[pos].1.as_str())
    }

    pub fn get(&self, def: HeaderDef) -> Option<&str> {
        self.index
            .get(&def.lookup_key())
            .map(|&pos| self.headers[pos].1.as_str())
    }

    pub fn require(&self, def: HeaderDef) -> Result<&str, ParseError> {
        self.get(def)
            .ok_or_else(|| ParseError::MissingHeader(def.to_string()))
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    pub fn require_body(&self) -> Result<&str, ParseError> {
        self.body
            .as_deref()
            .ok_or_else(|| ParseError::MalformedEnvelope("missing body separator".to_string()))
    }

    pub(crate) fn take_body(&mut self) -> Option<String> {
        self.body.take()
    }
}
