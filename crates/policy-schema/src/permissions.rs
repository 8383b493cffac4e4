//! # Permissions
//!
//! A permission names an action on a resource type, written `resource:action`.
//! Roles list the permissions they grant and condition-set rules grant exactly
//! one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `resource:action` pair.
///
/// # Example
///
/// ```
/// use policy_schema::permissions::PermissionRef;
///
/// let perm = PermissionRef::new("document", "read");
/// assert_eq!(perm.to_string(), "document:read");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionRef {
    /// Key of the resource type.
    pub resource: String,
    /// Key of the action on that resource.
    pub action: String,
}

impl PermissionRef {
    /// Create a permission reference from its parts.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Parse from string (e.g., "document:read").
    ///
    /// Both parts must be non-empty and the action may not contain a further
    /// colon.
    ///
    /// # Returns
    ///
    /// `Some(PermissionRef)` if valid, `None` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use policy_schema::permissions::PermissionRef;
    ///
    /// let perm = PermissionRef::parse("document:write").unwrap();
    /// assert_eq!(perm.action, "write");
    ///
    /// assert!(PermissionRef::parse("document").is_none());
    /// assert!(PermissionRef::parse("document:read:doc-1").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let (resource, action) = s.trim().split_once(':')?;
        if resource.is_empty() || action.is_empty() || action.contains(':') {
            return None;
        }
        Some(Self::new(resource, action))
    }

    /// Key under which the action is registered for identifier lookups.
    pub fn action_key(&self) -> String {
        self.to_string()
    }
}

impl TryFrom<String> for PermissionRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
            .ok_or_else(|| format!("malformed permission `{}`, expected `resource:action`", value))
    }
}

impl From<PermissionRef> for String {
    fn from(value: PermissionRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PermissionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}
