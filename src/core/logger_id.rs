//! Opaque logger identities

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Process-unique logger identity
///
/// A random (version 4) UUID in its hyphenated text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoggerId(String);

impl LoggerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LoggerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LoggerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LoggerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LoggerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_format() {
        let id = LoggerId::generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();

        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert!(parts[2].starts_with('4'));
        assert!(matches!(parts[3].chars().next(), Some('8' | '9' | 'a' | 'b')));

        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<LoggerId> = (0..10_000).map(|_| LoggerId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_borrow_lookup() {
        let id = LoggerId::generate();
        let mut set = HashSet::new();
        set.insert(id.clone());
        assert!(set.contains(id.as_str()));
    }
}
