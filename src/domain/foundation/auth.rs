//! Verified caller identity.
//!
//! Authentication is enforced by a collaborator before the engine is
//! invoked; the engine only distinguishes "a verified identity was
//! supplied" from "none was". Operations that require one treat absence
//! as a precondition failure, never as something to authenticate here.

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Identity of a verified caller, as supplied by the authentication
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    subject: String,
}

impl CallerIdentity {
    /// Wraps a verified subject identifier.
    pub fn new(subject: impl Into<String>) -> Result<Self, DomainError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(DomainError::invalid_argument(
                "subject",
                "Caller subject cannot be empty",
            ));
        }
        Ok(Self { subject })
    }

    /// Returns the subject identifier.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subject)
    }
}

/// Requires a verified identity, failing closed with `Unauthenticated`.
pub fn require_identity(
    caller: Option<&CallerIdentity>,
) -> Result<&CallerIdentity, DomainError> {
    caller.ok_or_else(|| DomainError::unauthenticated("A verified caller identity is required"))
}
