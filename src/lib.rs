//! # Converged message store synchronization core.
//!
//! Keeps a device-local database of RCS chat messages, delivery
//! notifications, file transfers, group conversation descriptors and
//! legacy SMS/MMS consistent with a network-side message store exposed
//! through an IMAP-like session.
//!
//! The crate is transport- and storage-agnostic: callers plug the two
//! collaborators in through [`remote::RemoteSession`] and
//! [`local::LocalStore`], then run passes via [`strategy::sync_all`].
//! A pass fetches new remote messages, decodes them through the
//! envelope codec and type resolver, correlates them with locally
//! known messages, reconciles read/delete state in both directions and
//! pushes local-only messages up.

#![recursion_limit = "256"]
#![warn(
    unused,
    clippy::correctness,
    missing_debug_implementations,
    clippy::all,
    clippy::wildcard_imports,
    clippy::needless_borrow,
    clippy::cast_lossless,
    clippy::unused_async,
    clippy::explicit_iter_loop,
    clippy::cloned_instead_of_copied
)]

pub mod constants;
pub mod correlate;
pub mod cpim;
pub mod envelope;
pub mod error;
pub mod file_transfer;
pub mod group;
pub mod headerdef;
pub mod imdn;
pub mod local;
pub mod message;
pub mod remote;
pub mod resolver;
pub mod strategy;
pub mod sync;
pub mod task;
mod tools;

#[cfg(test)]
mod test_utils;

pub use self::error::{ParseError, RemoteError, SyncError};
pub use self::message::ResolvedMessage;
pub use self::resolver::MessageKind;
pub use self::strategy::{sync_all, SyncReport, SyncSettings};
