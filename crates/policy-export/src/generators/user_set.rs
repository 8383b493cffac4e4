//! User sets, attribute-based groupings of users.

use policy_schema::{EntityKind, UserSetRecord, AUTOGEN_PREFIX};

use super::EntityGenerator;
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Generates `permitio_user_set` blocks, leaving out autogenerated sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSetGenerator;

impl EntityGenerator for UserSetGenerator {
    type Record = UserSetRecord;
    type Resolved = UserSetRecord;

    fn include(&self, record: &UserSetRecord) -> bool {
        !record.key.starts_with(AUTOGEN_PREFIX)
    }

    fn resolve(
        &self,
        record: UserSetRecord,
        _ids: &IdentifierResolver,
    ) -> Result<UserSetRecord, ReferenceError> {
        Ok(record)
    }

    fn render(&self, record: &UserSetRecord, ctx: &mut ExportContext) -> Option<Block> {
        let id = ctx.identifiers.register(EntityKind::UserSet, &record.key);

        let block = Block::resource(EntityKind::UserSet.block_type(), id.as_str())
            .attribute("key", Expr::string(&record.key))
            .attribute("name", Expr::string(&record.name))
            .optional_attribute("description", record.description.as_ref().map(Expr::string))
            .attribute("conditions", Expr::json(&record.conditions));
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_renders_user_set() {
        let mut ctx = ExportContext::new();

        let out = UserSetGenerator.generate(
            &[
                json!({
                    "key": "us_managers",
                    "name": "Managers",
                    "description": "People with reports",
                    "conditions": { "allOf": [{ "user.level": { "greater-than-equals": 5 } }] }
                }),
                json!({ "key": "__autogen_admin", "name": "admin", "conditions": {} }),
            ],
            &mut ctx,
        );

        assert_eq!(
            out,
            concat!(
                "resource \"permitio_user_set\" \"us_managers\" {\n",
                "  key         = \"us_managers\"\n",
                "  name        = \"Managers\"\n",
                "  description = \"People with reports\"\n",
                "  conditions  = jsonencode({\"allOf\":[{\"user.level\":{\"greater-than-equals\":5}}]})\n",
                "}\n",
            )
        );
        assert_eq!(ctx.identifiers.len(), 1);
    }

    #[test]
    fn test_missing_conditions_is_rejected() {
        let mut ctx = ExportContext::new();
        let out = UserSetGenerator.generate(&[json!({ "key": "us_x", "name": "X" })], &mut ctx);

        assert_eq!(out, "");
        assert_eq!(ctx.warnings.len(), 1);
    }
}
