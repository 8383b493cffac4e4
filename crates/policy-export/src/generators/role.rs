//! Roles and the permissions they grant.

use policy_schema::{EntityKind, PermissionRef, Record, RoleRecord};
use std::collections::BTreeSet;

use super::{key_of, EntityGenerator};
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Generates `permitio_role` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGenerator;

/// A role whose resource and permissions have been resolved.
#[derive(Debug, Clone)]
pub struct ResolvedRole {
    pub record: RoleRecord,
    /// Expression for the role's resource key, for resource roles.
    pub resource: Option<String>,
    /// Granted permissions, sorted and de-duplicated.
    pub permissions: Vec<PermissionRef>,
    /// Addresses of the resources the permissions belong to.
    pub depends_on: Vec<String>,
}

impl EntityGenerator for RoleGenerator {
    type Record = RoleRecord;
    type Resolved = ResolvedRole;

    fn resolve(
        &self,
        record: RoleRecord,
        ids: &IdentifierResolver,
    ) -> Result<ResolvedRole, ReferenceError> {
        let resource = match &record.resource {
            Some(resource) => Some(key_of(ids, EntityKind::Resource, resource)?),
            None => None,
        };

        // Checked during normalization.
        let permissions = record.permission_refs().unwrap_or_default();

        let mut depends_on = BTreeSet::new();
        for permission in &permissions {
            let action = permission.action_key();
            if ids.lookup(EntityKind::Action, &action).is_none() {
                return Err(ReferenceError::new(EntityKind::Action, action));
            }
            if let Some(address) = ids.reference(EntityKind::Resource, &permission.resource) {
                depends_on.insert(address);
            }
        }

        Ok(ResolvedRole {
            record,
            resource,
            permissions,
            depends_on: depends_on.into_iter().collect(),
        })
    }

    fn render(&self, resolved: &ResolvedRole, ctx: &mut ExportContext) -> Option<Block> {
        let record = &resolved.record;
        let id = ctx
            .identifiers
            .register_as(EntityKind::Role, &record.key(), &record.name_hint());

        let block = Block::resource(EntityKind::Role.block_type(), id.as_str())
            .attribute("key", Expr::string(&record.key))
            .attribute("name", Expr::string(&record.name))
            .optional_attribute("description", record.description.as_ref().map(Expr::string))
            .optional_attribute("resource", resolved.resource.as_ref().map(Expr::traversal))
            .attribute(
                "permissions",
                Expr::strings(resolved.permissions.iter().map(ToString::to_string)),
            );

        if resolved.depends_on.is_empty() {
            return Some(block);
        }
        Some(block.attribute(
            "depends_on",
            Expr::List(resolved.depends_on.iter().map(Expr::traversal).collect()),
        ))
    }
}
