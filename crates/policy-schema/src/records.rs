//! # Records
//!
//! Strict, per-kind shapes for policy objects.
//!
//! The remote service returns loosely shaped JSON. Each kind has a record type
//! here that the JSON is normalized into; anything that does not fit fails
//! closed with a [`ValidationError`] instead of producing a partial object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::kinds::EntityKind;
use crate::permissions::PermissionRef;

/// Prefix the service puts on user sets and resource sets it creates implicitly.
pub const AUTOGEN_PREFIX: &str = "__autogen_";

/// Normalization errors for a single raw record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The raw value is not a JSON object.
    #[error("expected an object, got {0}")]
    NotAnObject(&'static str),

    /// The object is missing fields or has fields of the wrong type.
    #[error("unexpected shape: {0}")]
    Shape(String),

    /// A required field is present but blank.
    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
}

/// A strict record that raw remote entities are normalized into.
pub trait Record: DeserializeOwned + Sized {
    /// Kind this record belongs to.
    const KIND: EntityKind;

    /// Stable key identifying the record within its kind.
    fn key(&self) -> String;

    /// Check invariants serde cannot express.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Normalize a raw remote entity into this record.
    fn from_raw(raw: &Value) -> Result<Self, ValidationError> {
        if !raw.is_object() {
            return Err(ValidationError::NotAnObject(json_type_name(raw)));
        }
        let record: Self = serde_json::from_value(raw.clone())
            .map_err(|e| ValidationError::Shape(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }
}

/// Best-effort label for a raw entity, for use in warnings.
///
/// Uses the `key` field when there is one, otherwise a compact JSON excerpt.
pub fn describe_raw(raw: &Value) -> String {
    if let Some(key) = raw.get("key").and_then(Value::as_str) {
        return key.to_string();
    }
    let text = raw.to_string();
    if text.chars().count() > 60 {
        let head: String = text.chars().take(57).collect();
        format!("{}...", head)
    } else {
        text
    }
}

/// Strip the autogeneration prefix from a user-set or resource-set token.
pub fn strip_autogen(token: &str) -> &str {
    token.strip_prefix(AUTOGEN_PREFIX).unwrap_or(token)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

/// Reference to a resource, given either as its key or as an embedded object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResourceKeyRef {
    /// Bare resource key.
    Key(String),
    /// Embedded resource object; only its key is used.
    Object {
        /// Resource key.
        key: String,
    },
}

impl ResourceKeyRef {
    /// Get the referenced resource key.
    pub fn key(&self) -> &str {
        match self {
            ResourceKeyRef::Key(key) | ResourceKeyRef::Object { key } => key,
        }
    }
}

/// Declared attribute of a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeSpec {
    /// Attribute type (string, number, bool, array, json, time).
    #[serde(rename = "type")]
    pub attribute_type: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A resource type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRecord {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSpec>,
}

impl Record for ResourceRecord {
    const KIND: EntityKind = EntityKind::Resource;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("key", &self.key)?;
        require("name", &self.name)
    }
}

/// An action on a resource type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionRecord {
    pub key: String,
    pub resource: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ActionRecord {
    /// The `resource:action` permission this action grants.
    pub fn permission(&self) -> PermissionRef {
        PermissionRef::new(self.resource.clone(), self.key.clone())
    }
}

impl Record for ActionRecord {
    const KIND: EntityKind = EntityKind::Action;

    fn key(&self) -> String {
        self.permission().action_key()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("key", &self.key)?;
        require("resource", &self.resource)?;
        if self.key.contains(':') || self.resource.contains(':') {
            return Err(ValidationError::Shape(format!(
                "action `{}` on `{}` contains a colon",
                self.key, self.resource
            )));
        }
        Ok(())
    }
}

/// A custom attribute declared on users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAttributeRecord {
    pub key: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for UserAttributeRecord {
    const KIND: EntityKind = EntityKind::UserAttribute;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("key", &self.key)?;
        require("type", &self.attribute_type)
    }
}

/// A role and the permissions it grants.
///
/// Roles with a `resource` are resource roles, only meaningful on instances
/// of that resource type. Their permissions may name bare action keys, which
/// refer to actions of that resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRecord {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

impl RoleRecord {
    /// Permissions as `resource:action` pairs, sorted and de-duplicated.
    pub fn permission_refs(&self) -> Result<Vec<PermissionRef>, ValidationError> {
        let mut refs = Vec::with_capacity(self.permissions.len());
        for permission in &self.permissions {
            let parsed = match (&self.resource, permission.contains(':')) {
                (Some(resource), false) if !permission.trim().is_empty() => {
                    Some(PermissionRef::new(resource.clone(), permission.trim()))
                }
                _ => PermissionRef::parse(permission),
            };
            let parsed = parsed.ok_or_else(|| {
                ValidationError::Shape(format!(
                    "malformed permission `{}`, expected `resource:action`",
                    permission
                ))
            })?;
            refs.push(parsed);
        }
        refs.sort();
        refs.dedup();
        Ok(refs)
    }

    /// Name the role's identifier is derived from.
    pub fn name_hint(&self) -> String {
        match &self.resource {
            Some(resource) => format!("{}_{}", resource, self.key),
            None => self.key.clone(),
        }
    }
}

impl Record for RoleRecord {
    const KIND: EntityKind = EntityKind::Role;

    /// Global roles are keyed by their key, resource roles by `resource#key`.
    fn key(&self) -> String {
        match &self.resource {
            Some(resource) => format!("{}#{}", resource, self.key),
            None => self.key.clone(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("key", &self.key)?;
        require("name", &self.name)?;
        if let Some(resource) = &self.resource {
            require("resource", resource)?;
        }
        self.permission_refs().map(|_| ())
    }
}

/// An attribute-based set of resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSetRecord {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub resource: ResourceKeyRef,
    pub conditions: Value,
}

impl Record for ResourceSetRecord {
    const KIND: EntityKind = EntityKind::ResourceSet;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("key", &self.key)?;
        require("name", &self.name)?;
        require("resource", self.resource.key())
    }
}

/// An attribute-based set of users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSetRecord {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub conditions: Value,
}

impl Record for UserSetRecord {
    const KIND: EntityKind = EntityKind::UserSet;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("key", &self.key)?;
        require("name", &self.name)
    }
}

/// A relation from a subject resource type to an object resource type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationRecord {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub subject_resource: String,
    pub object_resource: String,
}

impl Record for RelationRecord {
    const KIND: EntityKind = EntityKind::Relation;

    fn key(&self) -> String {
        format!("{}:{}:{}", self.subject_resource, self.key, self.object_resource)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("key", &self.key)?;
        require("name", &self.name)?;
        require("subject_resource", &self.subject_resource)?;
        require("object_resource", &self.object_resource)
    }
}

/// A rule granting a user set one permission on a resource set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConditionSetRuleRecord {
    pub user_set: String,
    pub resource_set: String,
    pub permission: PermissionRef,
}

impl ConditionSetRuleRecord {
    /// User-set token without the autogeneration prefix.
    pub fn user_set_key(&self) -> &str {
        strip_autogen(&self.user_set)
    }

    /// Resource-set token without the autogeneration prefix.
    pub fn resource_set_key(&self) -> &str {
        strip_autogen(&self.resource_set)
    }
}

impl Record for ConditionSetRuleRecord {
    const KIND: EntityKind = EntityKind::ConditionSetRule;

    fn key(&self) -> String {
        format!("{}/{}/{}", self.user_set, self.permission, self.resource_set)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("user_set", self.user_set_key())?;
        require("resource_set", self.resource_set_key())
    }
}
