//! # File-transfer-over-HTTP descriptor payloads.
//!
//! A file-transfer notification carries no file content; its CPIM payload
//! is an `application/vnd.gsma.rcs-ft-http+xml` document describing where
//! the file (and optionally a thumbnail) can be downloaded, how large it
//! is and until when the link stays valid.

use chrono::{DateTime, FixedOffset};

use crate::error::ParseError;
use crate::tools::{format_cpim_date, parse_cpim_date};

/// One downloadable entity: the file itself or its thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: Option<String>,
    pub size: u64,
    pub content_type: Option<String>,
    pub url: String,
    pub expiry: Option<DateTime<FixedOffset>>,
}

/// Decoded file-transfer descriptor document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferInfo {
    pub file: FileDescriptor,
    pub thumbnail: Option<FileDescriptor>,
}

#[derive(Default)]
struct DescriptorBuilder {
    name: Option<String>,
    size: Option<u64>,
    content_type: Option<String>,
    url: Option<String>,
    expiry: Option<DateTime<FixedOffset>>,
}

impl DescriptorBuilder {
    fn build(self) -> Result<FileDescriptor, ParseError> {
        Ok(FileDescriptor {
            name: self.name,
            size: self
                .size
                .ok_or_else(|| ParseError::MalformedBody("file-info without file-size".into()))?,
            content_type: self.content_type,
            url: self
                .url
                .ok_or_else(|| ParseError::MalformedBody("file-info without data url".into()))?,
            expiry: self.expiry,
        })
    }
}

/// Parses a `rcs-ft-http+xml` document.
///
/// Exactly one `file-info type="file"` entry is required; a
/// `type="thumbnail"` entry is optional.
pub fn parse_file_transfer_info(xml: &str) -> Result<FileTransferInfo, ParseError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut file = None;
    let mut thumbnail = None;
    let mut builder: Option<(bool, DescriptorBuilder)> = None;
    let mut current: Vec<u8> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Start(ref event)) => {
                current = event.local_name().as_ref().to_vec();
                if current == b"file-info" {
                    let is_thumbnail = attribute(event, b"type")?
                        .map(|kind| kind.eq_ignore_ascii_case("thumbnail"))
                        .unwrap_or(false);
                    builder = Some((is_thumbnail, DescriptorBuilder::default()));
                }
            }
            Ok(quick_xml::events::Event::Empty(ref event)) => {
                if event.local_name().as_ref() == b"data" {
                    if let Some((_, builder)) = builder.as_mut() {
                        builder.url = attribute(event, b"url")?;
                        if let Some(until) = attribute(event, b"until")? {
                            builder.expiry = Some(parse_cpim_date(&until)?);
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::Text(ref event)) => {
                let text = event
                    .unescape()
                    .map_err(|err| ParseError::MalformedBody(err.to_string()))?;
                if let Some((_, builder)) = builder.as_mut() {
                    match current.as_slice() {
                        b"file-size" => {
                            builder.size = Some(text.trim().parse().map_err(|_| {
                                ParseError::MalformedBody(format!("bad file-size {text:?}"))
                            })?);
                        }
                        b"file-name" => builder.name = Some(text.trim().to_string()),
                        b"content-type" => builder.content_type = Some(text.trim().to_string()),
                        _ => {}
                    }
                }
            }
            Ok(quick_xml::events::Event::End(ref event)) => {
                if event.local_name().as_ref() == b"file-info" {
                    if let Some((is_thumbnail, done)) = builder.take() {
                        if is_thumbnail {
                            thumbnail = Some(done.build()?);
                        } else {
                            file = Some(done.build()?);
                        }
                    }
                }
                current.clear();
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(err) => {
                return Err(ParseError::MalformedBody(format!(
                    "invalid file-transfer xml: {err}"
                )));
            }
            Ok(_) => {}
        }
    }

    Ok(FileTransferInfo {
        file: file.ok_or_else(|| {
            ParseError::MalformedBody("descriptor without file-info type=\"file\"".into())
        })?,
        thumbnail,
    })
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

/// Builds a descriptor document; [`parse_file_transfer_info`] accepts its
/// own output.
pub fn build_file_transfer_info(info: &FileTransferInfo) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><file>");
    if let Some(thumbnail) = &info.thumbnail {
        append_file_info(&mut out, thumbnail, "thumbnail");
    }
    append_file_info(&mut out, &info.file, "file");
    out.push_str("</file>");
    out
}

fn append_file_info(out: &mut String, descriptor: &FileDescriptor, kind: &str) {
    out.push_str(&format!("<file-info type=\"{kind}\">"));
    out.push_str(&format!("<file-size>{}</file-size>", descriptor.size));
    if let Some(name) = &descriptor.name {
        out.push_str(&format!("<file-name>{name}</file-name>"));
    }
    if let Some(content_type) = &descriptor.content_type {
        out.push_str(&format!("<content-type>{content_type}</content-type>"));
    }
    match &descriptor.expiry {
        Some(expiry) => out.push_str(&format!(
            "<data url=\"{}\" until=\"{}\"/>",
            descriptor.url,
            format_cpim_date(expiry)
        )),
        None => out.push_str(&format!("<data url=\"{}\"/>", descriptor.url)),
    }
    out.push_str("</file-info>");
}
