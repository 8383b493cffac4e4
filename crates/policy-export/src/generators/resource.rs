//! Resource types, with their actions and declared attributes.

use policy_schema::{EntityKind, ResourceRecord};

use super::EntityGenerator;
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Generates `permitio_resource` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceGenerator;

impl EntityGenerator for ResourceGenerator {
    type Record = ResourceRecord;
    type Resolved = ResourceRecord;

    fn resolve(
        &self,
        record: ResourceRecord,
        _ids: &IdentifierResolver,
    ) -> Result<ResourceRecord, ReferenceError> {
        Ok(record)
    }

    fn render(&self, record: &ResourceRecord, ctx: &mut ExportContext) -> Option<Block> {
        let id = ctx.identifiers.register(EntityKind::Resource, &record.key);

        // `actions` is required by the provider, even when empty.
        let block = Block::resource(EntityKind::Resource.block_type(), id.as_str())
            .attribute("key", Expr::string(&record.key))
            .attribute("name", Expr::string(&record.name))
            .optional_attribute("description", record.description.as_ref().map(Expr::string))
            .attribute("actions", ctx.actions.actions_attribute(&record.key));

        if record.attributes.is_empty() {
            return Some(block);
        }

        let attributes = record
            .attributes
            .iter()
            .map(|(key, spec)| {
                let mut fields = vec![("type".to_string(), Expr::string(&spec.attribute_type))];
                if let Some(description) = &spec.description {
                    fields.push(("description".to_string(), Expr::string(description)));
                }
                (key.clone(), Expr::Object(fields))
            })
            .collect();
        Some(block.attribute("attributes", Expr::Object(attributes)))
    }
}
