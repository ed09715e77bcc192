//! Sender data models.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The disposition applied to mail from a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// No record and no pattern matched.
    #[default]
    Unknown,
    /// Mail is stashed until the sender confirms.
    Confirm,
    /// Mail is delivered.
    Accept,
    /// Mail is rejected by the MTA.
    Reject,
    /// Mail is accepted and silently dropped.
    Discard,
}

impl Action {
    /// Every action, in state machine order.
    pub const ALL: [Self; 5] = [
        Self::Unknown,
        Self::Confirm,
        Self::Accept,
        Self::Reject,
        Self::Discard,
    ];

    /// Parse from the storage representation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unknown" => Some(Self::Unknown),
            "confirm" => Some(Self::Confirm),
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            "discard" => Some(Self::Discard),
            _ => None,
        }
    }

    /// Convert to the storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Confirm => "confirm",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Discard => "discard",
        }
    }

    /// True while mail from the sender is being held.
    #[must_use]
    pub const fn holds_mail(&self) -> bool {
        matches!(self, Self::Confirm)
    }

    /// True once a final decision (accept, reject or discard) exists.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        matches!(self, Self::Accept | Self::Reject | Self::Discard)
    }
}

impl std::str::FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque token tying a confirmation attempt to a sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// Wrap an existing token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Reference {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Reference {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// An explicit per-sender record held by the handler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderRecord {
    /// Stored action.
    pub action: Action,
    /// Stored reference, if one was ever minted.
    pub reference: Option<Reference>,
}

impl SenderRecord {
    /// Creates a new record.
    #[must_use]
    pub const fn new(action: Action, reference: Option<Reference>) -> Self {
        Self { action, reference }
    }
}

/// Identifier of a stashed message. Ordering follows stash order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StashId(pub i64);

impl StashId {
    /// Creates a new stash ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StashId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message held until its sender confirms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    /// Raw message body.
    pub message: String,
    /// Envelope recipients, in the order they were given.
    pub recipients: Vec<String>,
}

impl StashEntry {
    /// Creates a new stash entry.
    #[must_use]
    pub fn new(message: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            message: message.into(),
            recipients,
        }
    }
}
