//! Structural cache keys.

use std::fmt;

/// Ordered tuple of strings identifying one logical remote read, e.g.
/// `("courseReviews", "course-42")`.
///
/// Equality and hashing are structural, so the same read issued from two
/// call sites lands on the same entry. A shorter key acts as a prefix that
/// matches every key it starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Build a key from its parts.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Extend the key with one more part.
    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    /// The key parts.
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` matches this key. Every key matches itself.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for QueryKey {
    fn from(parts: [S; N]) -> Self {
        Self::new(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = QueryKey::new(["course", "42"]);
        let b = QueryKey::from(["course".to_string(), "42".to_string()]);
        assert_eq!(a, b);

        let set: HashSet<_> = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_prefix_matching() {
        let reviews = QueryKey::new(["courseReviews", "42"]);
        assert!(reviews.starts_with(&QueryKey::new(["courseReviews"])));
        assert!(reviews.starts_with(&reviews));
        assert!(!reviews.starts_with(&QueryKey::new(["courseRating"])));
        assert!(!QueryKey::new(["courseReviews"]).starts_with(&reviews));
        // Prefixes compare whole parts, not characters.
        assert!(!QueryKey::new(["courses"]).starts_with(&QueryKey::new(["course"])));
    }

    #[test]
    fn test_display() {
        let key = QueryKey::new(["instructor"]).with("inst-1");
        assert_eq!(key.to_string(), "instructor/inst-1");
    }
}
