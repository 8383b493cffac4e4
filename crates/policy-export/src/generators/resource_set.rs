//! Resource sets, attribute-based groupings of resources.

use policy_schema::{EntityKind, ResourceSetRecord, AUTOGEN_PREFIX};

use super::{key_of, EntityGenerator};
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Generates `permitio_resource_set` blocks.
///
/// Sets the service created implicitly (keys starting with `__autogen_`)
/// are left out; rules that use them resolve to the underlying resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceSetGenerator;

/// A resource set whose resource has been resolved.
#[derive(Debug, Clone)]
pub struct ResolvedResourceSet {
    pub record: ResourceSetRecord,
    pub resource: String,
}

impl EntityGenerator for ResourceSetGenerator {
    type Record = ResourceSetRecord;
    type Resolved = ResolvedResourceSet;

    fn include(&self, record: &ResourceSetRecord) -> bool {
        !record.key.starts_with(AUTOGEN_PREFIX)
    }

    fn resolve(
        &self,
        record: ResourceSetRecord,
        ids: &IdentifierResolver,
    ) -> Result<ResolvedResourceSet, ReferenceError> {
        let resource = key_of(ids, EntityKind::Resource, record.resource.key())?;
        Ok(ResolvedResourceSet { record, resource })
    }

    fn render(&self, resolved: &ResolvedResourceSet, ctx: &mut ExportContext) -> Option<Block> {
        let record = &resolved.record;
        let id = ctx.identifiers.register(EntityKind::ResourceSet, &record.key);

        let block = Block::resource(EntityKind::ResourceSet.block_type(), id.as_str())
            .attribute("key", Expr::string(&record.key))
            .attribute("name", Expr::string(&record.name))
            .optional_attribute("description", record.description.as_ref().map(Expr::string))
            .attribute("resource", Expr::traversal(&resolved.resource))
            .attribute("conditions", Expr::json(&record.conditions));
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_renders_resource_set() {
        let mut ctx = ExportContext::new();
        ctx.identifiers.register(EntityKind::Resource, "document");

        let out = ResourceSetGenerator.generate(
            &[json!({
                "key": "confidential_docs",
                "name": "Confidential Docs",
                "resource": { "key": "document", "id": "3f1c" },
                "conditions": { "allOf": [{ "resource.classification": { "equals": "confidential" } }] }
            })],
            &mut ctx,
        );

        assert_eq!(
            out,
            concat!(
                "resource \"permitio_resource_set\" \"confidential_docs\" {\n",
                "  key        = \"confidential_docs\"\n",
                "  name       = \"Confidential Docs\"\n",
                "  resource   = permitio_resource.document.key\n",
                "  conditions = jsonencode({\"allOf\":[{\"resource.classification\":{\"equals\":\"confidential\"}}]})\n",
                "}\n",
            )
        );
    }

    #[test]
    fn test_autogenerated_sets_are_skipped_silently() {
        let mut ctx = ExportContext::new();
        ctx.identifiers.register(EntityKind::Resource, "document");

        let out = ResourceSetGenerator.generate(
            &[json!({
                "key": "__autogen_document",
                "name": "document",
                "resource": "document",
                "conditions": {}
            })],
            &mut ctx,
        );

        assert_eq!(out, "");
        assert!(ctx.warnings.is_empty());
        assert!(ctx
            .identifiers
            .lookup(EntityKind::ResourceSet, "__autogen_document")
            .is_none());
    }

    #[test]
    fn test_unknown_resource_drops_set() {
        let mut ctx = ExportContext::new();

        let out = ResourceSetGenerator.generate(
            &[json!({ "key": "drafts", "name": "Drafts", "resource": "document", "conditions": {} })],
            &mut ctx,
        );

        assert_eq!(out, "");
        assert_eq!(
            ctx.warnings.messages(),
            ["Skipped resource set `drafts`: dangling reference to resource `document`"]
        );
    }
}
