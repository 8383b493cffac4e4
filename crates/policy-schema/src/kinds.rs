//! # Entity Kinds
//!
//! Defines every category of policy object that can be exported, and the
//! order in which they have to be generated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A category of policy object.
///
/// Variants are declared in dependency order, so the derived `Ord` matches
/// [`EntityKind::DEPENDENCY_ORDER`]: a kind only ever references kinds that
/// compare less than itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Resource types (documents, folders, ...).
    Resource,
    /// Actions that can be performed on a resource.
    Action,
    /// Custom attributes declared on users.
    UserAttribute,
    /// Roles, optionally scoped to a resource.
    Role,
    /// Attribute-based sets of resources.
    ResourceSet,
    /// Attribute-based sets of users.
    UserSet,
    /// Relations between two resource types.
    Relation,
    /// Rules granting a user set a permission on a resource set.
    ConditionSetRule,
}

impl EntityKind {
    /// Every kind, in the order generators must run.
    pub const DEPENDENCY_ORDER: [EntityKind; 8] = [
        EntityKind::Resource,
        EntityKind::Action,
        EntityKind::UserAttribute,
        EntityKind::Role,
        EntityKind::ResourceSet,
        EntityKind::UserSet,
        EntityKind::Relation,
        EntityKind::ConditionSetRule,
    ];

    /// Get the snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resource",
            EntityKind::Action => "action",
            EntityKind::UserAttribute => "user_attribute",
            EntityKind::Role => "role",
            EntityKind::ResourceSet => "resource_set",
            EntityKind::UserSet => "user_set",
            EntityKind::Relation => "relation",
            EntityKind::ConditionSetRule => "condition_set_rule",
        }
    }

    /// Human readable plural name, used in warnings.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resources",
            EntityKind::Action => "actions",
            EntityKind::UserAttribute => "user attributes",
            EntityKind::Role => "roles",
            EntityKind::ResourceSet => "resource sets",
            EntityKind::UserSet => "user sets",
            EntityKind::Relation => "relations",
            EntityKind::ConditionSetRule => "condition set rules",
        }
    }

    /// Human readable singular name, used when naming one record.
    pub fn singular_name(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resource",
            EntityKind::Action => "action",
            EntityKind::UserAttribute => "user attribute",
            EntityKind::Role => "role",
            EntityKind::ResourceSet => "resource set",
            EntityKind::UserSet => "user set",
            EntityKind::Relation => "relation",
            EntityKind::ConditionSetRule => "condition set rule",
        }
    }

    /// Terraform resource type whose blocks carry this kind.
    ///
    /// Actions live in the `actions` map of their resource's block.
    pub fn block_type(&self) -> &'static str {
        match self {
            EntityKind::Resource | EntityKind::Action => "permitio_resource",
            EntityKind::UserAttribute => "permitio_user_attribute",
            EntityKind::Role => "permitio_role",
            EntityKind::ResourceSet => "permitio_resource_set",
            EntityKind::UserSet => "permitio_user_set",
            EntityKind::Relation => "permitio_relation",
            EntityKind::ConditionSetRule => "permitio_condition_set_rule",
        }
    }

    /// Whether each entity of this kind is rendered as a block of its own.
    pub fn has_own_block(&self) -> bool {
        !matches!(self, EntityKind::Action)
    }

    /// Kinds whose identifiers this kind may reference.
    pub fn references(&self) -> &'static [EntityKind] {
        match self {
            EntityKind::Resource | EntityKind::UserAttribute | EntityKind::UserSet => &[],
            EntityKind::Action | EntityKind::ResourceSet | EntityKind::Relation => {
                &[EntityKind::Resource]
            }
            EntityKind::Role => &[EntityKind::Resource, EntityKind::Action],
            EntityKind::ConditionSetRule => &[
                EntityKind::Resource,
                EntityKind::Role,
                EntityKind::ResourceSet,
                EntityKind::UserSet,
            ],
        }
    }

    /// Parse a kind from its snake_case name, accepting plurals and dashes.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        match singular {
            "resource" => Some(EntityKind::Resource),
            "action" => Some(EntityKind::Action),
            "user_attribute" => Some(EntityKind::UserAttribute),
            "role" => Some(EntityKind::Role),
            "resource_set" => Some(EntityKind::ResourceSet),
            "user_set" => Some(EntityKind::UserSet),
            "relation" => Some(EntityKind::Relation),
            "condition_set_rule" => Some(EntityKind::ConditionSetRule),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_dependency_order_contains_every_kind_once() {
        let unique: HashSet<_> = EntityKind::DEPENDENCY_ORDER.iter().collect();
        assert_eq!(unique.len(), EntityKind::DEPENDENCY_ORDER.len());
    }

    #[test]
    fn test_dependency_order_matches_ord() {
        let mut sorted = EntityKind::DEPENDENCY_ORDER;
        sorted.sort();
        assert_eq!(sorted, EntityKind::DEPENDENCY_ORDER);
    }

    #[test]
    fn test_references_point_backwards() {
        for (position, kind) in EntityKind::DEPENDENCY_ORDER.iter().enumerate() {
            for referenced in kind.references() {
                let referenced_position = EntityKind::DEPENDENCY_ORDER
                    .iter()
                    .position(|k| k == referenced)
                    .unwrap();
                assert!(
                    referenced_position < position,
                    "{} references {} which is generated later",
                    kind.as_str(),
                    referenced.as_str()
                );
            }
        }
    }

    #[test]
    fn test_parse_roundtrips_names() {
        for kind in EntityKind::DEPENDENCY_ORDER {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(
            EntityKind::parse("condition-set-rules"),
            Some(EntityKind::ConditionSetRule)
        );
        assert_eq!(EntityKind::parse("Roles"), Some(EntityKind::Role));
        assert_eq!(EntityKind::parse("tenant"), None);
    }

    #[test]
    fn test_actions_are_carried_by_resource_blocks() {
        assert!(!EntityKind::Action.has_own_block());
        assert_eq!(EntityKind::Action.block_type(), EntityKind::Resource.block_type());
        for kind in EntityKind::DEPENDENCY_ORDER {
            if kind != EntityKind::Action {
                assert!(kind.has_own_block());
                assert!(kind.block_type().ends_with(kind.as_str()));
            }
        }
    }

    #[test]
    fn test_display_uses_plural_name() {
        assert_eq!(EntityKind::ConditionSetRule.to_string(), "condition set rules");
        assert_eq!(EntityKind::Resource.to_string(), "resources");
        assert_eq!(EntityKind::UserSet.singular_name(), "user set");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&EntityKind::ResourceSet).unwrap();
        assert_eq!(json, "\"resource_set\"");
    }
}
