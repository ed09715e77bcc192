//! Per-address action resolution and stash management.

use tracing::debug;

use super::model::{Action, Reference, SenderRecord};
use super::pattern::PatternSet;
use super::reference;
use super::unstash::Unstash;
use crate::Result;
use crate::config::SenderConfig;
use crate::handler::Handler;

/// A mail sender and its cached disposition.
///
/// The action and reference are resolved at most once per `Sender`; later
/// calls trust the cache. Not meant to be shared between tasks.
pub struct Sender<'h, H: Handler> {
    email: String,
    action: Option<Action>,
    reference: Option<Reference>,
    config: SenderConfig,
    handler: &'h H,
}

impl<'h, H: Handler> Sender<'h, H> {
    /// Creates a sender with the default configuration.
    #[must_use]
    pub fn new(email: &str, handler: &'h H) -> Self {
        Self::with_config(email, handler, SenderConfig::default())
    }

    /// Creates a sender with an explicit configuration.
    ///
    /// The address is keyed according to `config.address_case`.
    #[must_use]
    pub fn with_config(email: &str, handler: &'h H, config: SenderConfig) -> Self {
        Self {
            email: config.address_case.apply(email),
            action: None,
            reference: None,
            config,
            handler,
        }
    }

    /// The sender address, after the case policy was applied.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The cached action, without resolving.
    #[must_use]
    pub const fn cached_action(&self) -> Option<Action> {
        self.action
    }

    /// The cached reference, without resolving or minting.
    #[must_use]
    pub const fn cached_reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    /// Resolve the action for mail from this sender.
    ///
    /// An explicit record wins; otherwise the first matching pattern rule;
    /// otherwise [`Action::Unknown`]. The result is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails or a pattern rule is malformed.
    pub async fn action(&mut self) -> Result<Action> {
        if let Some(action) = self.action {
            debug!("Action for {} already defined: {action}", self.email);
            return Ok(action);
        }

        let mut record = self.handler.get_action_for_sender(&self.email).await?;
        debug!("Stored action for {}: {record:?}", self.email);

        if record.is_none() {
            let patterns = PatternSet::compile(&self.handler.get_patterns().await?)?;
            record = patterns.first_match(&self.email).cloned();
            if let Some(ref matched) = record {
                debug!("Matched pattern for {}: {}", self.email, matched.action);
            }
        }

        let SenderRecord { action, reference } = record.unwrap_or_default();
        self.action = Some(action);
        self.reference = reference;

        debug!("Action for {} determined: {action}", self.email);
        Ok(action)
    }

    /// Persist a new action and return the sender's reference.
    ///
    /// Mints a reference first if the sender has none. If the handler
    /// already holds a reference for the address, that one is kept and
    /// becomes the cached reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails or a pattern rule is malformed.
    /// The cached action is unchanged on failure.
    pub async fn set_action(&mut self, action: Action) -> Result<Reference> {
        debug!("Setting action for {} to {action}", self.email);

        let candidate = self.reference().await?;
        let stored = self
            .handler
            .set_action_for_sender(&self.email, action, &candidate)
            .await?;
        if stored != candidate {
            debug!("Keeping stored reference for {}", self.email);
        }
        self.action = Some(action);
        self.reference = Some(stored.clone());

        Ok(stored)
    }

    /// The reference used for confirmation.
    ///
    /// Resolves first, since an explicit record may already carry one, and
    /// mints a new one only if none exists. Minting does not persist; see
    /// [`Sender::set_action`].
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails or a pattern rule is malformed.
    pub async fn reference(&mut self) -> Result<Reference> {
        if self.action.is_none() {
            self.action().await?;
        }

        if let Some(reference) = &self.reference {
            return Ok(reference.clone());
        }

        debug!("Calculating reference for {}", self.email);
        let minted = reference::mint(&self.email, self.config.reference_scheme);
        self.reference = Some(minted.clone());
        Ok(minted)
    }

    /// True if `candidate` is this sender's current reference.
    ///
    /// Compares against the cached reference only; a sender with no
    /// reference yet validates nothing.
    #[must_use]
    pub fn validate_reference(&self, candidate: &str) -> bool {
        self.reference
            .as_ref()
            .is_some_and(|reference| reference.as_str() == candidate)
    }

    /// Hold a message until the sender confirms.
    ///
    /// The message is always stored. A sender not yet in
    /// [`Action::Confirm`], or in it through a pattern rule without a
    /// reference, is persisted as `confirm` with its reference. Returns the
    /// reference the sender must confirm with.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails or a pattern rule is malformed.
    /// The message is stored before the action is resolved, so on such an
    /// error it stays stashed while the sender keeps its previous action.
    pub async fn stash(&mut self, message: &str, recipients: &[String]) -> Result<Reference> {
        debug!("Stashing message for {}", self.email);

        let id = self
            .handler
            .stash_message_for_sender(&self.email, message, recipients)
            .await?;
        debug!("Stashed message {id} for {}", self.email);

        if self.action().await? == Action::Confirm
            && let Some(reference) = &self.reference
        {
            return Ok(reference.clone());
        }
        self.set_action(Action::Confirm).await
    }

    /// Start a pass over the messages stashed for this sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails.
    pub async fn unstash(&self) -> Result<Unstash<'h, H>> {
        let ids = self.handler.stashed_ids_for_sender(&self.email).await?;
        debug!("Unstashing {} messages for {}", ids.len(), self.email);
        Ok(Unstash::new(self.handler, self.email.clone(), ids))
    }
}

impl<H: Handler> std::fmt::Debug for Sender<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("email", &self.email)
            .field("action", &self.action)
            .field("reference", &self.reference)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
