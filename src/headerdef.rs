//! # Known envelope and CPIM header names.

use strum_macros::Display;

/// Headers recognized on the outer envelope and on the CPIM inner block.
///
/// Lookup is case-insensitive, but serialization emits exactly the names
/// given here, so the `Display` form is the canonical wire spelling.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDef {
    #[strum(serialize = "From")]
    From_,
    #[strum(serialize = "To")]
    To,
    #[strum(serialize = "Date")]
    Date,
    #[strum(serialize = "Subject")]
    Subject,
    #[strum(serialize = "Conversation-ID")]
    ConversationId,
    #[strum(serialize = "Contribution-ID")]
    ContributionId,
    #[strum(serialize = "Message-ID")]
    MessageId,
    #[strum(serialize = "IMDN-Message-ID")]
    ImdnMessageId,
    #[strum(serialize = "Message-Direction")]
    MessageDirection,
    #[strum(serialize = "Message-Correlator")]
    MessageCorrelator,
    #[strum(serialize = "Message-Context")]
    MessageContext,
    #[strum(serialize = "Content-Type")]
    ContentType,
    #[strum(serialize = "Content-Transfer-Encoding")]
    ContentTransferEncoding,

    /// CPIM inner timestamp, RFC 3339 formatted.
    #[strum(serialize = "DateTime")]
    DateTime,
}

impl HeaderDef {
    /// Lower-cased key used for index lookups.
    pub fn lookup_key(self) -> String {
        self.to_string().to_lowercase()
    }
}
