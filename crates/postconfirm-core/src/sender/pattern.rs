//! Fallback pattern rules.
//!
//! Patterns are regular expressions matched against the whole address,
//! ignoring case. They only apply when the handler has no explicit record
//! for the sender, and the first matching rule in declaration order wins.

use regex::{Regex, RegexBuilder};

use super::model::{Action, Reference, SenderRecord};
use crate::{Error, Result};

/// A pattern rule as stored by the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    /// Regular expression source.
    pub pattern: String,
    /// Action applied to matching senders.
    pub action: Action,
    /// Reference handed to matching senders, if any.
    pub reference: Option<Reference>,
}

impl PatternRule {
    /// Creates a new rule without a reference.
    #[must_use]
    pub fn new(pattern: impl Into<String>, action: Action) -> Self {
        Self {
            pattern: pattern.into(),
            action,
            reference: None,
        }
    }

    /// Attach a reference to the rule.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<Reference>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// An ordered list of compiled pattern rules.
#[derive(Debug)]
pub struct PatternSet {
    compiled: Vec<(Regex, SenderRecord)>,
}

impl PatternSet {
    /// Compile every rule, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first rule that fails to
    /// compile. No partial set is ever returned.
    pub fn compile(rules: &[PatternRule]) -> Result<Self> {
        let compiled = rules
            .iter()
            .map(|rule| {
                let regex = compile_full_match(&rule.pattern)?;
                Ok((regex, SenderRecord::new(rule.action, rule.reference.clone())))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { compiled })
    }

    /// Returns the record of the first rule matching `email`.
    #[must_use]
    pub fn first_match(&self, email: &str) -> Option<&SenderRecord> {
        self.compiled
            .iter()
            .find(|(regex, _)| regex.is_match(email))
            .map(|(_, record)| record)
    }

    /// Number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    /// True if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// Anchor `pattern` at both ends so only whole-address matches count.
fn compile_full_match(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(&format!(r"\A(?:{pattern})\z"))
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}
