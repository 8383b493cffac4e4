//! # Policy Schema
//!
//! Shared vocabulary for exporting a policy configuration as code.
//!
//! ## Overview
//!
//! The policy-schema crate handles:
//! - **Entity kinds**: Every category of policy object the export understands
//! - **Dependency order**: The fixed order in which kinds must be rendered
//! - **Permissions**: `resource:action` references used by roles and rules
//! - **Records**: Strict, per-kind shapes that loosely typed remote payloads
//!   are normalized into
//!
//! ## Dependency Order
//!
//! ```text
//! resource -> action -> user_attribute -> role -> resource_set
//!          -> user_set -> relation -> condition_set_rule
//! ```
//!
//! A kind may only reference kinds that come before it, so a single ordered
//! pass is enough to resolve every reference.
//!
//! ## Usage
//!
//! ```rust
//! use policy_schema::{EntityKind, PermissionRef};
//!
//! let perm = PermissionRef::parse("document:read").unwrap();
//! assert_eq!(perm.resource, "document");
//! assert_eq!(perm.action, "read");
//!
//! assert!(EntityKind::Role < EntityKind::ConditionSetRule);
//! assert_eq!(EntityKind::ConditionSetRule.to_string(), "condition set rules");
//! ```

pub mod kinds;
pub mod permissions;
pub mod records;

pub use kinds::EntityKind;
pub use permissions::PermissionRef;
pub use records::{
    describe_raw, strip_autogen, ActionRecord, AttributeSpec, ConditionSetRuleRecord, Record,
    RelationRecord, ResourceKeyRef, ResourceRecord, ResourceSetRecord, RoleRecord,
    UserAttributeRecord, UserSetRecord, ValidationError, AUTOGEN_PREFIX,
};
