//! State name token.
//!
//! States in a declarative machine are plain identifiers, so they are
//! represented by an opaque string token rather than a user enum.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier for a machine state.
///
/// The distinguished value [`StateName::NONE`] (`"none"`) denotes a machine
/// that has not been initialized yet.
///
/// # Example
///
/// ```rust
/// use turnstile::core::StateName;
///
/// let green = StateName::from("green");
/// assert_eq!(green.as_str(), "green");
/// assert!(!green.is_none());
/// assert!(StateName::none().is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateName(String);

impl StateName {
    /// Name of the uninitialized state.
    pub const NONE: &'static str = "none";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The uninitialized state.
    pub fn none() -> Self {
        Self(Self::NONE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the uninitialized state.
    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE
    }

    /// Check that the name is usable as an identifier: non-empty, without
    /// whitespace and without the `:` slot separator.
    pub fn is_valid_identifier(name: &str) -> bool {
        !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c == ':')
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for StateName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for StateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StateName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StateName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StateName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_distinguished() {
        assert!(StateName::none().is_none());
        assert_eq!(StateName::none().as_str(), "none");
        assert!(!StateName::from("green").is_none());
    }

    #[test]
    fn identifier_validation() {
        assert!(StateName::is_valid_identifier("green"));
        assert!(StateName::is_valid_identifier("in_progress"));
        assert!(!StateName::is_valid_identifier(""));
        assert!(!StateName::is_valid_identifier("two words"));
        assert!(!StateName::is_valid_identifier("enter:green"));
    }

    #[test]
    fn compares_with_str() {
        let state = StateName::from("red");
        assert_eq!(state, "red");
        assert_ne!(state, "green");
    }

    #[test]
    fn serializes_as_plain_string() {
        let state = StateName::from("yellow");
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"yellow\"");

        let deserialized: StateName = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }

    #[test]
    fn state_is_cloneable() {
        let state = StateName::from("hungry");
        let cloned = state.clone();
        assert_eq!(state, cloned);
    }
}
