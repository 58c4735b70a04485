//! Per-resource key builders.

use super::{KeyToken, QueryKey};

const LIST_SCOPE: &str = "list";
const DETAIL_SCOPE: &str = "detail";

/// Builds the key hierarchy for one resource.
///
/// # Examples
///
/// ```
/// use stash_core::KeyFactory;
///
/// let keys = KeyFactory::new("todos");
/// assert_eq!(keys.all().to_string(), "todos");
/// assert_eq!(keys.list("limit:30,skip:0").to_string(), "todos/list/{filters:limit:30,skip:0}");
/// assert_eq!(keys.detail(5).to_string(), "todos/detail/5");
/// assert!(keys.detail(5).starts_with(&keys.details()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFactory {
    root: QueryKey,
}

impl KeyFactory {
    /// Creates the key builders for `resource`.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            root: QueryKey::from_iter([KeyToken::Text(resource.into())]),
        }
    }

    /// Returns the resource name.
    pub fn resource(&self) -> &str {
        self.root.resource().unwrap_or_default()
    }

    /// `[resource]`
    pub fn all(&self) -> QueryKey {
        self.root.clone()
    }

    /// `[resource, "list"]`
    pub fn lists(&self) -> QueryKey {
        self.root.child(LIST_SCOPE)
    }

    /// `[resource, "list", {filters}]`
    pub fn list(&self, filters: impl Into<String>) -> QueryKey {
        self.lists().child(KeyToken::filters(filters))
    }

    /// `[resource, "detail"]`
    pub fn details(&self) -> QueryKey {
        self.root.child(DETAIL_SCOPE)
    }

    /// `[resource, "detail", id]`
    pub fn detail(&self, id: impl Into<KeyToken>) -> QueryKey {
        self.details().child(id)
    }

    /// `[resource, scope]` for one-off queries outside list/detail.
    pub fn scoped(&self, scope: impl Into<KeyToken>) -> QueryKey {
        self.root.child(scope)
    }
}
