//! In-process handler.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::Handler;
use crate::sender::{Action, PatternRule, Reference, SenderRecord, StashEntry, StashId};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct State {
    senders: HashMap<String, SenderRecord>,
    patterns: Vec<PatternRule>,
    stash: BTreeMap<StashId, (String, StashEntry)>,
    next_id: i64,
}

/// Handler that keeps all state in memory.
///
/// Nothing survives the process. Useful for tests and for gateways that
/// rebuild their state from elsewhere on start.
#[derive(Debug, Default)]
pub struct MemoryHandler {
    state: Mutex<State>,
}

impl MemoryHandler {
    /// Creates an empty handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler preloaded with pattern rules.
    #[must_use]
    pub fn with_patterns(patterns: Vec<PatternRule>) -> Self {
        Self {
            state: Mutex::new(State {
                patterns,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| Error::Handler(format!("lock poisoned: {e}")))
    }

    /// Append a pattern rule after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn add_pattern(&self, rule: PatternRule) -> Result<()> {
        self.lock()?.patterns.push(rule);
        Ok(())
    }

    /// Insert or replace an explicit record without going through a sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn insert_record(&self, email: &str, record: SenderRecord) -> Result<()> {
        self.lock()?.senders.insert(email.to_string(), record);
        Ok(())
    }

    /// Delete the explicit record for `email`. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn clear_sender(&self, email: &str) -> Result<bool> {
        Ok(self.lock()?.senders.remove(email).is_some())
    }

    /// Number of entries stashed for `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn stash_count(&self, email: &str) -> Result<usize> {
        Ok(self
            .lock()?
            .stash
            .values()
            .filter(|(owner, _)| owner == email)
            .count())
    }
}

impl Handler for MemoryHandler {
    async fn get_action_for_sender(&self, email: &str) -> Result<Option<SenderRecord>> {
        Ok(self.lock()?.senders.get(email).cloned())
    }

    async fn get_patterns(&self) -> Result<Vec<PatternRule>> {
        Ok(self.lock()?.patterns.clone())
    }

    async fn set_action_for_sender(
        &self,
        email: &str,
        action: Action,
        reference: &Reference,
    ) -> Result<Reference> {
        let mut state = self.lock()?;
        let record = state
            .senders
            .entry(email.to_string())
            .or_default();
        record.action = action;
        Ok(record.reference.get_or_insert_with(|| reference.clone()).clone())
    }

    async fn stash_message_for_sender(
        &self,
        email: &str,
        message: &str,
        recipients: &[String],
    ) -> Result<StashId> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let id = StashId::new(state.next_id);
        state.stash.insert(
            id,
            (
                email.to_string(),
                StashEntry::new(message, recipients.to_vec()),
            ),
        );
        Ok(id)
    }

    async fn stashed_ids_for_sender(&self, email: &str) -> Result<Vec<StashId>> {
        Ok(self
            .lock()?
            .stash
            .iter()
            .filter(|(_, (owner, _))| owner == email)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn peek_stashed(&self, id: StashId) -> Result<Option<StashEntry>> {
        Ok(self.lock()?.stash.get(&id).map(|(_, entry)| entry.clone()))
    }

    async fn remove_stashed(&self, id: StashId) -> Result<bool> {
        Ok(self.lock()?.stash.remove(&id).is_some())
    }

    async fn take_stashed(&self, id: StashId) -> Result<Option<StashEntry>> {
        Ok(self.lock()?.stash.remove(&id).map(|(_, entry)| entry))
    }
}
