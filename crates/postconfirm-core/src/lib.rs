//! # postconfirm-core
//!
//! Sender disposition core for a challenge-response mail gateway.
//!
//! This crate provides:
//! - **Action resolution** - cached, record-first, then first-match pattern rules
//! - **Confirmation references** - minted once per sender, validated by equality
//! - **Stash / unstash** - hold mail until the sender confirms, release it once
//! - **Handlers** - the storage seam, with in-memory and `SQLite` implementations
//!
//! Composing confirmation requests, re-injecting released mail and loading
//! configuration files belong to the embedding gateway.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod handler;
pub mod sender;

pub use config::{AddressCase, ReferenceScheme, SenderConfig};
pub use error::{Error, Result};
pub use handler::{Handler, MemoryHandler, SqliteHandler};
pub use sender::{
    Action, PatternRule, PatternSet, PendingDelivery, Reference, Sender, SenderRecord, StashEntry,
    StashId, Unstash,
};
