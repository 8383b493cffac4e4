//! Relations between resource types.

use policy_schema::{EntityKind, Record, RelationRecord};

use super::{key_of, EntityGenerator};
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Generates `permitio_relation` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationGenerator;

/// A relation with both ends resolved.
#[derive(Debug, Clone)]
pub struct ResolvedRelation {
    pub record: RelationRecord,
    pub subject_resource: String,
    pub object_resource: String,
}

impl EntityGenerator for RelationGenerator {
    type Record = RelationRecord;
    type Resolved = ResolvedRelation;

    fn resolve(
        &self,
        record: RelationRecord,
        ids: &IdentifierResolver,
    ) -> Result<ResolvedRelation, ReferenceError> {
        let subject_resource = key_of(ids, EntityKind::Resource, &record.subject_resource)?;
        let object_resource = key_of(ids, EntityKind::Resource, &record.object_resource)?;
        Ok(ResolvedRelation {
            record,
            subject_resource,
            object_resource,
        })
    }

    fn render(&self, resolved: &ResolvedRelation, ctx: &mut ExportContext) -> Option<Block> {
        let record = &resolved.record;
        let hint = format!(
            "{}_{}_{}",
            record.subject_resource, record.key, record.object_resource
        );
        let id = ctx.identifiers.register_as(EntityKind::Relation, &record.key(), &hint);

        let block = Block::resource(EntityKind::Relation.block_type(), id.as_str())
            .attribute("key", Expr::string(&record.key))
            .attribute("name", Expr::string(&record.name))
            .optional_attribute("description", record.description.as_ref().map(Expr::string))
            .attribute("subject_resource", Expr::traversal(&resolved.subject_resource))
            .attribute("object_resource", Expr::traversal(&resolved.object_resource));
        Some(block)
    }
}
