//! Condition-set rules: a user set granted a permission on a resource set.

use policy_schema::{ConditionSetRuleRecord, EntityKind, Record};

use super::{key_of, EntityGenerator};
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Generates `permitio_condition_set_rule` blocks.
///
/// The user-set side resolves to a role before a user set, the resource-set
/// side to a resource set before a resource. Autogenerated set names have
/// their `__autogen_` prefix removed first, so a rule on an implicit set
/// points at the role or resource it was generated from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionSetRuleGenerator;

/// A rule with both sets resolved.
#[derive(Debug, Clone)]
pub struct ResolvedConditionSetRule {
    pub record: ConditionSetRuleRecord,
    pub user_set: String,
    pub resource_set: String,
}

impl EntityGenerator for ConditionSetRuleGenerator {
    type Record = ConditionSetRuleRecord;
    type Resolved = ResolvedConditionSetRule;

    fn resolve(
        &self,
        record: ConditionSetRuleRecord,
        ids: &IdentifierResolver,
    ) -> Result<ResolvedConditionSetRule, ReferenceError> {
        let user_key = record.user_set_key();
        let user_set = key_of(ids, EntityKind::Role, user_key)
            .or_else(|_| key_of(ids, EntityKind::UserSet, user_key))?;

        let resource_key = record.resource_set_key();
        let resource_set = key_of(ids, EntityKind::ResourceSet, resource_key)
            .or_else(|_| key_of(ids, EntityKind::Resource, resource_key))
            .map_err(|_| ReferenceError::new(EntityKind::ResourceSet, resource_key))?;

        Ok(ResolvedConditionSetRule {
            record,
            user_set,
            resource_set,
        })
    }

    fn render(
        &self,
        resolved: &ResolvedConditionSetRule,
        ctx: &mut ExportContext,
    ) -> Option<Block> {
        let record = &resolved.record;
        let hint = format!("allow_{}", record.resource_set_key());
        let id = ctx.identifiers.register_as(EntityKind::ConditionSetRule, &record.key(), &hint);

        let block = Block::resource(EntityKind::ConditionSetRule.block_type(), id.as_str())
            .attribute("user_set", Expr::traversal(&resolved.user_set))
            .attribute("resource_set", Expr::traversal(&resolved.resource_set))
            .attribute("permission", Expr::string(record.permission.to_string()));
        Some(block)
    }
}
