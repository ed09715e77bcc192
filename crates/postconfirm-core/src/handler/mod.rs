//! Storage collaborator for senders.
//!
//! A [`Handler`] owns every piece of durable state the sender logic needs:
//! explicit per-sender records, the ordered pattern rules, and stashed mail.
//! Two implementations ship with the crate:
//!
//! - [`MemoryHandler`] keeps everything in process, for tests and embedding
//! - [`SqliteHandler`] persists to `SQLite` through `sqlx`
//!
//! # Consistency
//!
//! Implementations are expected to make [`Handler::set_action_for_sender`]
//! an atomic upsert that never replaces a stored reference, and
//! [`Handler::take_stashed`] an atomic load-and-remove.
//! The sender logic performs no retries; errors surface unchanged.

use std::future::Future;

mod memory;
mod sqlite;

pub use memory::MemoryHandler;
pub use sqlite::SqliteHandler;

use crate::Result;
use crate::sender::{Action, PatternRule, Reference, SenderRecord, StashEntry, StashId};

/// Persistence capabilities consumed by [`Sender`](crate::Sender).
pub trait Handler: Send + Sync {
    /// Look up the explicit record for `email`.
    ///
    /// Returns `None` if no record exists.
    fn get_action_for_sender(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<SenderRecord>>> + Send;

    /// All pattern rules, in declaration order.
    fn get_patterns(&self) -> impl Future<Output = Result<Vec<PatternRule>>> + Send;

    /// Create the record for `email` or update its action.
    ///
    /// `reference` is only stored if the record has none yet. Returns the
    /// reference that is stored once the call completes.
    fn set_action_for_sender(
        &self,
        email: &str,
        action: Action,
        reference: &Reference,
    ) -> impl Future<Output = Result<Reference>> + Send;

    /// Store a message for `email`. Returns the ID of the new entry.
    fn stash_message_for_sender(
        &self,
        email: &str,
        message: &str,
        recipients: &[String],
    ) -> impl Future<Output = Result<StashId>> + Send;

    /// IDs of every entry currently stashed for `email`, in stash order.
    fn stashed_ids_for_sender(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Vec<StashId>>> + Send;

    /// Load an entry without removing it.
    ///
    /// Returns `None` if the entry no longer exists.
    fn peek_stashed(&self, id: StashId) -> impl Future<Output = Result<Option<StashEntry>>> + Send;

    /// Remove an entry. Returns `true` if it existed.
    fn remove_stashed(&self, id: StashId) -> impl Future<Output = Result<bool>> + Send;

    /// Load and remove an entry in one step.
    ///
    /// Returns `None` if the entry was already taken.
    fn take_stashed(&self, id: StashId) -> impl Future<Output = Result<Option<StashEntry>>> + Send;
}
