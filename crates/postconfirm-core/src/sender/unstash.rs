//! Forward-only consumption of stashed messages.

use std::collections::VecDeque;

use tracing::debug;

use super::model::{StashEntry, StashId};
use crate::Result;
use crate::handler::Handler;

/// A stashed message loaded but not yet removed from the store.
///
/// Hand it back to [`Unstash::acknowledge`] once the message is safely
/// delivered; until then it stays in the stash.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an unacknowledged delivery stays in the stash"]
pub struct PendingDelivery {
    id: StashId,
    entry: StashEntry,
}

impl PendingDelivery {
    /// The stash ID of the entry.
    #[must_use]
    pub const fn id(&self) -> StashId {
        self.id
    }

    /// The stashed message.
    #[must_use]
    pub const fn entry(&self) -> &StashEntry {
        &self.entry
    }
}

/// Cursor over the entries stashed for one sender.
///
/// The set of entries is fixed when the cursor is created; anything stashed
/// afterwards is left for the next pass. Entries are loaded one at a time.
pub struct Unstash<'h, H: Handler> {
    handler: &'h H,
    email: String,
    pending: VecDeque<StashId>,
}

impl<'h, H: Handler> Unstash<'h, H> {
    pub(crate) fn new(handler: &'h H, email: String, ids: Vec<StashId>) -> Self {
        Self {
            handler,
            email,
            pending: ids.into(),
        }
    }

    /// Produce the next entry, removing it from the stash.
    ///
    /// Entries removed by someone else since the cursor was created are
    /// skipped. Returns `None` once the cursor is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails. The failed entry is not retried
    /// by this cursor.
    pub async fn next(&mut self) -> Result<Option<StashEntry>> {
        while let Some(id) = self.pending.pop_front() {
            if let Some(entry) = self.handler.take_stashed(id).await? {
                debug!("Unstashing message {id} for {}", self.email);
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Produce the next entry without removing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails.
    pub async fn next_pending(&mut self) -> Result<Option<PendingDelivery>> {
        while let Some(id) = self.pending.pop_front() {
            if let Some(entry) = self.handler.peek_stashed(id).await? {
                debug!("Delivering message {id} for {} pending acknowledgement", self.email);
                return Ok(Some(PendingDelivery { id, entry }));
            }
        }
        Ok(None)
    }

    /// Remove a delivered entry from the stash.
    ///
    /// Returns `false` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails.
    pub async fn acknowledge(&self, delivery: PendingDelivery) -> Result<bool> {
        debug!("Acknowledged message {} for {}", delivery.id, self.email);
        self.handler.remove_stashed(delivery.id).await
    }

    /// Drain every remaining entry, removing each from the stash.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails. Entries produced before the
    /// failure are already removed and are lost to the caller.
    pub async fn collect_all(mut self) -> Result<Vec<StashEntry>> {
        let mut entries = Vec::with_capacity(self.pending.len());
        while let Some(entry) = self.next().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Number of snapshot IDs not yet visited.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}
