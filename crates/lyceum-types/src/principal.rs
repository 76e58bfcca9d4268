//! Opaque caller identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a principal from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("principal is empty")]
    Empty,

    #[error("principal contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Opaque identity token representing an authenticated caller.
///
/// The client never interprets the contents; it only carries the textual
/// form to the backend and compares principals for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Parse a principal from its textual form.
    pub fn parse(text: impl Into<String>) -> Result<Self, PrincipalError> {
        let text = text.into();
        if text.is_empty() {
            return Err(PrincipalError::Empty);
        }
        if let Some(c) = text
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(PrincipalError::InvalidChar(c));
        }
        Ok(Self(text))
    }

    /// The textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display (`abcde...vwxyz`).
    pub fn short(&self) -> String {
        if self.0.len() <= 12 {
            self.0.clone()
        } else {
            format!("{}...{}", &self.0[..5], &self.0[self.0.len() - 5..])
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let p = Principal::parse("rrkah-fqaaa-aaaaa").unwrap();
        assert_eq!(p.as_str(), "rrkah-fqaaa-aaaaa");
        assert_eq!(p.to_string(), "rrkah-fqaaa-aaaaa");
    }

    #[test]
    fn test_parse_rejects_empty_and_spaces() {
        assert_eq!(Principal::parse(""), Err(PrincipalError::Empty));
        assert_eq!(
            Principal::parse("has space"),
            Err(PrincipalError::InvalidChar(' '))
        );
    }

    #[test]
    fn test_short() {
        let p = Principal::parse("abcdefghijklmnopqrstuvwxyz").unwrap();
        assert_eq!(p.short(), "abcde...vwxyz");
        let p = Principal::parse("short").unwrap();
        assert_eq!(p.short(), "short");
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let ok: Principal = serde_json::from_str("\"user-1\"").unwrap();
        assert_eq!(ok.as_str(), "user-1");
        assert!(serde_json::from_str::<Principal>("\"\"").is_err());
    }
}
