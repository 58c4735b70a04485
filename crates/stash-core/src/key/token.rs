//! Key tokens and key tuples.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One segment of a [`QueryKey`].
///
/// Serializes untagged, so a key tuple renders as the familiar JSON
/// array form: `["todos","list",{"filters":"limit:30,skip:0"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyToken {
    /// Numeric segment, e.g. a todo id.
    Number(i64),
    /// Text segment: resource names, scopes and string ids.
    Text(String),
    /// Filter descriptor of a list query.
    Filters {
        /// Canonical filter description, e.g. `limit:30,skip:0`.
        filters: String,
    },
}

impl KeyToken {
    /// Creates a filter descriptor token.
    pub fn filters(description: impl Into<String>) -> Self {
        Self::Filters {
            filters: description.into(),
        }
    }

    /// Returns the text of a `Text` token.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(text) => write!(f, "{}", text),
            Self::Filters { filters } => write!(f, "{{filters:{}}}", filters),
        }
    }
}

impl From<&str> for KeyToken {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyToken {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for KeyToken {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for KeyToken {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for KeyToken {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u32> for KeyToken {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<Uuid> for KeyToken {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered tuple of tokens identifying the scope of one cache entry.
///
/// Equality and hashing are structural: two keys built independently
/// from the same tokens address the same entry.
///
/// # Examples
///
/// ```
/// use stash_core::{KeyToken, QueryKey};
///
/// let list = QueryKey::from_iter(["todos", "list"])
///     .child(KeyToken::filters("limit:30,skip:0"));
/// let root = QueryKey::from_iter(["todos"]);
///
/// assert!(list.starts_with(&root));
/// assert_eq!(list.to_string(), "todos/list/{filters:limit:30,skip:0}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeyToken>);

impl QueryKey {
    /// Creates an empty key. The empty key is a prefix of every key.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns a new key with `token` appended.
    pub fn child(&self, token: impl Into<KeyToken>) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(token.into());
        Self(tokens)
    }

    /// Returns the tokens of this key.
    pub fn tokens(&self) -> &[KeyToken] {
        &self.0
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key has no tokens.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the resource name (first token), if it is text.
    pub fn resource(&self) -> Option<&str> {
        self.0.first().and_then(KeyToken::as_text)
    }

    /// Returns true if `prefix` is a leading sub-sequence of this key.
    ///
    /// Every key starts with itself.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl<T: Into<KeyToken>> FromIterator<T> for QueryKey {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<KeyToken>> for QueryKey {
    fn from(tokens: Vec<KeyToken>) -> Self {
        Self(tokens)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}
