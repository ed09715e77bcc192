//! Sender configuration.
//!
//! Loading is left to the embedding application; this module only defines
//! the shape and defaults so the struct can be deserialized from whatever
//! source the gateway uses.

use serde::{Deserialize, Serialize};

/// How sender addresses are keyed before they reach the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressCase {
    /// Use the address exactly as given.
    #[default]
    Preserve,
    /// Lowercase the whole address, so `A@X.org` and `a@x.org` share a record.
    Lowercase,
}

impl AddressCase {
    /// Apply the policy to an address.
    #[must_use]
    pub fn apply(self, email: &str) -> String {
        match self {
            Self::Preserve => email.to_string(),
            Self::Lowercase => email.to_lowercase(),
        }
    }
}

/// How new confirmation references are minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceScheme {
    /// SHA-256 of the address and the current time.
    #[default]
    Timestamp,
    /// SHA-256 of the address and 32 random bytes.
    Random,
}

/// Configuration for [`Sender`](crate::Sender).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Case policy for record and stash lookups.
    pub address_case: AddressCase,
    /// Reference minting scheme.
    pub reference_scheme: ReferenceScheme,
}

impl SenderConfig {
    /// Set the address case policy.
    #[must_use]
    pub const fn with_address_case(mut self, address_case: AddressCase) -> Self {
        self.address_case = address_case;
        self
    }

    /// Set the reference scheme.
    #[must_use]
    pub const fn with_reference_scheme(mut self, reference_scheme: ReferenceScheme) -> Self {
        self.reference_scheme = reference_scheme;
        self
    }
}
