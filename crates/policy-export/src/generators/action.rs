//! Actions, rendered inside their resource's `actions` map.
//!
//! The action listing is staged into an [`ActionCatalog`] before resources
//! render, so each `permitio_resource` block carries its own actions. The
//! action generator itself emits no blocks: it reports invalid and dangling
//! actions and registers one `resource:action` identifier per action, which
//! roles resolve their permissions against.

use policy_schema::{ActionRecord, EntityKind, Record};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use super::{key_of, EntityGenerator};
use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::{Block, Expr};
use crate::identifiers::IdentifierResolver;

/// Valid actions grouped by resource key, in listing order.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    by_resource: BTreeMap<String, Vec<ActionRecord>>,
}

impl ActionCatalog {
    /// Stage a raw action listing.
    ///
    /// Invalid entries and repeated `resource:action` keys are left out here;
    /// [`ActionGenerator`] warns about them when actions are generated.
    pub fn from_listing(raw: &[Value]) -> Self {
        let mut catalog = Self::default();
        let mut seen = HashSet::new();

        for record in raw.iter().filter_map(|entity| ActionRecord::from_raw(entity).ok()) {
            if seen.insert(record.key()) {
                catalog
                    .by_resource
                    .entry(record.resource.clone())
                    .or_default()
                    .push(record);
            }
        }
        catalog
    }

    pub fn for_resource(&self, resource: &str) -> &[ActionRecord] {
        self.by_resource
            .get(resource)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_resource.is_empty()
    }

    /// The `actions` attribute of `resource`'s block.
    ///
    /// Each action maps to `{ name, description }`; an unnamed action is
    /// named after its key.
    pub fn actions_attribute(&self, resource: &str) -> Expr {
        let entries = self
            .for_resource(resource)
            .iter()
            .map(|action| {
                let name = action.name.as_deref().unwrap_or(&action.key);
                let mut fields = vec![("name".to_string(), Expr::string(name))];
                if let Some(description) = &action.description {
                    fields.push(("description".to_string(), Expr::string(description)));
                }
                (action.key.clone(), Expr::Object(fields))
            })
            .collect();
        Expr::Object(entries)
    }
}

/// Checks actions and registers their identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionGenerator;

/// An action whose resource has been resolved.
#[derive(Debug, Clone)]
pub struct ResolvedAction {
    pub record: ActionRecord,
    /// Expression for the owning resource's key.
    pub resource: String,
}

impl EntityGenerator for ActionGenerator {
    type Record = ActionRecord;
    type Resolved = ResolvedAction;

    fn resolve(
        &self,
        record: ActionRecord,
        ids: &IdentifierResolver,
    ) -> Result<ResolvedAction, ReferenceError> {
        let resource = key_of(ids, EntityKind::Resource, &record.resource)?;
        Ok(ResolvedAction { record, resource })
    }

    fn render(&self, resolved: &ResolvedAction, ctx: &mut ExportContext) -> Option<Block> {
        ctx.identifiers.register(EntityKind::Action, &resolved.record.key());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actions_register_without_blocks() {
        let mut ctx = ExportContext::new();
        ctx.identifiers.register(EntityKind::Resource, "document");
        ctx.identifiers.register(EntityKind::Resource, "folder");

        let out = ActionGenerator.generate(
            &[
                json!({ "key": "read", "name": "Read", "resource": "document" }),
                json!({ "key": "read", "resource": "folder" }),
            ],
            &mut ctx,
        );

        assert_eq!(out, "");
        assert!(ctx.warnings.is_empty());
        assert_eq!(
            ctx.identifiers
                .lookup(EntityKind::Action, "document:read")
                .map(|id| id.as_str()),
            Some("document_read")
        );
        assert_eq!(
            ctx.identifiers
                .lookup(EntityKind::Action, "folder:read")
                .map(|id| id.as_str()),
            Some("folder_read")
        );
    }

    #[test]
    fn test_action_on_unknown_resource_is_dropped() {
        let mut ctx = ExportContext::new();

        let out = ActionGenerator.generate(
            &[json!({ "key": "read", "resource": "ghost" })],
            &mut ctx,
        );

        assert_eq!(out, "");
        assert_eq!(
            ctx.warnings.messages(),
            ["Skipped action `ghost:read`: dangling reference to resource `ghost`"]
        );
        assert!(ctx.identifiers.lookup(EntityKind::Action, "ghost:read").is_none());
    }

    #[test]
    fn test_catalog_groups_valid_actions_by_resource() {
        let catalog = ActionCatalog::from_listing(&[
            json!({ "key": "read", "name": "Read", "resource": "document" }),
            json!({ "key": "list", "resource": "folder" }),
            json!({ "key": "write", "resource": "document", "description": "Edit" }),
            json!({ "key": "read", "name": "Read again", "resource": "document" }),
            json!({ "resource": "document" }),
        ]);

        let keys: Vec<&str> = catalog
            .for_resource("document")
            .iter()
            .map(|action| action.key.as_str())
            .collect();
        assert_eq!(keys, ["read", "write"]);
        assert_eq!(catalog.for_resource("folder").len(), 1);
        assert!(catalog.for_resource("report").is_empty());

        assert_eq!(
            catalog.actions_attribute("document"),
            Expr::Object(vec![
                (
                    "read".to_string(),
                    Expr::Object(vec![("name".to_string(), Expr::string("Read"))]),
                ),
                (
                    "write".to_string(),
                    Expr::Object(vec![
                        ("name".to_string(), Expr::string("write")),
                        ("description".to_string(), Expr::string("Edit")),
                    ]),
                ),
            ])
        );
        assert_eq!(catalog.actions_attribute("report"), Expr::Object(vec![]));
    }
}
