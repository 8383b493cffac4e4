//! Custom user attributes.

use policy_schema::{EntityKind, UserAttributeRecord};

use super::EntityGenerator;
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Generates `permitio_user_attribute` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAttributeGenerator;

impl EntityGenerator for UserAttributeGenerator {
    type Record = UserAttributeRecord;
    type Resolved = UserAttributeRecord;

    fn resolve(
        &self,
        record: UserAttributeRecord,
        _ids: &IdentifierResolver,
    ) -> Result<UserAttributeRecord, ReferenceError> {
        Ok(record)
    }

    fn render(&self, record: &UserAttributeRecord, ctx: &mut ExportContext) -> Option<Block> {
        let id = ctx.identifiers.register(EntityKind::UserAttribute, &record.key);

        let block = Block::resource(EntityKind::UserAttribute.block_type(), id.as_str())
            .attribute("key", Expr::string(&record.key))
            .attribute("type", Expr::string(&record.attribute_type))
            .optional_attribute("description", record.description.as_ref().map(Expr::string));
        Some(block)
    }
}
