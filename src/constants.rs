//! # Wire constants.

use strum_macros::{Display, EnumString};

/// Media type of the outer envelope body wrapping RCS chat, IMDN and
/// file-transfer payloads.
pub const CPIM_MEDIA_TYPE: &str = "message/cpim";

/// Inner media type of a delivery/display notification payload.
pub const IMDN_MEDIA_TYPE: &str = "message/imdn+xml";

/// Inner media type of a file-transfer-over-HTTP descriptor payload.
pub const FILE_TRANSFER_MEDIA_TYPE: &str = "application/vnd.gsma.rcs-ft-http+xml";

/// Outer media type of a CPM group-session descriptor.
pub const CPM_SESSION_MEDIA_TYPE: &str = "application/x-cpm-session";

/// Outer media type of a group-state descriptor.
pub const GROUP_STATE_MEDIA_TYPE: &str = "application/group-state-object+xml";

pub const TEXT_PLAIN: &str = "text/plain";
pub const MULTIPART_RELATED: &str = "multipart/related";

/// `Message-Context` token marking a legacy SMS envelope.
pub const PAGER_MESSAGE: &str = "pager-message";

/// `Message-Context` token marking a legacy MMS envelope.
pub const MULTIMEDIA_MESSAGE: &str = "multimedia-message";

/// The only session kind accepted in a CPM group-session descriptor.
pub const SESSION_TYPE_GROUP: &str = "Group";

/// Direction of a message relative to the local user.
///
/// On the wire this is the `Message-Direction` header with the values
/// `received` and `sent`.
#[derive(Debug, Default, Display, EnumString, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    #[strum(serialize = "received")]
    Incoming,
    #[strum(serialize = "sent")]
    Outgoing,
}
