//! Senders - the per-address state machine of the gateway.
//!
//! A sender starts as `unknown`. When it first writes to a protected address
//! its message is stashed and it moves to `confirm`; it is then expected to
//! confirm using its reference. Once confirmed, it is typically moved to
//! `accept` and the stashed mail is released. `reject` and `discard` are
//! terminal decisions applied by the MTA.
//!
//! # Resolution order
//!
//! 1. The action cached on the [`Sender`] object
//! 2. The explicit record held by the handler
//! 3. The first [`PatternRule`] matching the whole address, ignoring case
//! 4. [`Action::Unknown`]
//!
//! A `confirm` pattern with a reference lets matching senders confirm
//! without waiting for a confirmation request.
//!
//! # Example
//!
//! ```ignore
//! use postconfirm_core::{Action, MemoryHandler, Sender};
//!
//! let handler = MemoryHandler::new();
//! let mut sender = Sender::new("someone@example.com", &handler);
//!
//! if sender.action().await? == Action::Unknown {
//!     let reference = sender.stash(&raw_message, &recipients).await?;
//!     // send a confirmation request carrying `reference`
//! }
//!
//! // later, when the confirmation arrives
//! if sender.validate_reference(&candidate) {
//!     sender.set_action(Action::Accept).await?;
//!     let mut pass = sender.unstash().await?;
//!     while let Some(entry) = pass.next().await? {
//!         // re-inject entry.message to entry.recipients
//!     }
//! }
//! ```

mod model;
mod pattern;
pub mod reference;
mod state;
mod unstash;

pub use model::{Action, Reference, SenderRecord, StashEntry, StashId};
pub use pattern::{PatternRule, PatternSet};
pub use state::Sender;
pub use unstash::{PendingDelivery, Unstash};
