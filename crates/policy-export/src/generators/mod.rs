//! # Entity Generators
//!
//! One generator per entity kind. Each turns the raw listing for its kind
//! into HCL blocks in four steps:
//!
//! 1. **normalize**: raw JSON into the kind's strict record
//! 2. **resolve**: look up every entity the record references
//! 3. **render**: register the record's own identifier and build its block
//! 4. **generate**: run the steps above for each record, in listing order
//!
//! A record that fails to normalize or resolve, or repeats the key of a
//! record already rendered, is skipped with exactly one warning. The rest of
//! the listing is unaffected.
//!
//! Actions have no block of their own: they are staged in the context's
//! [`ActionCatalog`] and rendered inside their resource's block.

mod action;
mod condition_set_rule;
mod relation;
mod resource;
mod resource_set;
mod role;
mod user_attribute;
mod user_set;

pub use action::{ActionCatalog, ActionGenerator, ResolvedAction};
pub use condition_set_rule::{ConditionSetRuleGenerator, ResolvedConditionSetRule};
pub use relation::{RelationGenerator, ResolvedRelation};
pub use resource::ResourceGenerator;
pub use resource_set::{ResolvedResourceSet, ResourceSetGenerator};
pub use role::{ResolvedRole, RoleGenerator};
pub use user_attribute::UserAttributeGenerator;
pub use user_set::UserSetGenerator;

use async_trait::async_trait;
use policy_client::{ClientError, ClientResult, PolicyClient};
use policy_schema::{describe_raw, EntityKind, Record, ValidationError};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::context::ExportContext;
use crate::error::ReferenceError;
use crate::hcl::Block;
use crate::identifiers::IdentifierResolver;

/// Warning text for a kind whose listing could not be fetched.
pub fn fetch_failure_message(kind: EntityKind, error: &ClientError) -> String {
    format!("Failed to export {}: {}", kind, error)
}

/// Terraform expression for the `key` attribute of a registered entity.
fn key_of(ids: &IdentifierResolver, kind: EntityKind, key: &str) -> Result<String, ReferenceError> {
    ids.reference(kind, key)
        .map(|address| format!("{}.key", address))
        .ok_or_else(|| ReferenceError::new(kind, key))
}

/// Converts one entity kind into HCL blocks.
#[async_trait]
pub trait EntityGenerator: Send + Sync {
    /// Strict record the raw listing is normalized into.
    type Record: Record + Send;

    /// Record with every reference resolved to a Terraform expression.
    type Resolved: Send;

    /// List the raw entities of this generator's kind.
    async fn fetch(&self, client: &dyn PolicyClient) -> ClientResult<Vec<Value>> {
        client.list(Self::Record::KIND).await
    }

    /// Normalize one raw entity.
    fn normalize(&self, raw: &Value) -> Result<Self::Record, ValidationError> {
        Self::Record::from_raw(raw)
    }

    /// Whether a valid record is exported at all.
    ///
    /// Records excluded here are skipped silently; they are not errors.
    fn include(&self, _record: &Self::Record) -> bool {
        true
    }

    /// Resolve the record's references against identifiers registered so far.
    fn resolve(
        &self,
        record: Self::Record,
        ids: &IdentifierResolver,
    ) -> Result<Self::Resolved, ReferenceError>;

    /// Register the record's identifier and build its block.
    ///
    /// Returns `None` for records carried inside another kind's block.
    fn render(&self, resolved: &Self::Resolved, ctx: &mut ExportContext) -> Option<Block>;

    /// Convert a raw listing into HCL, skipping records that cannot be exported.
    fn generate(&self, raw: &[Value], ctx: &mut ExportContext) -> String {
        let kind = Self::Record::KIND;
        let mut rendered = HashSet::with_capacity(raw.len());
        let mut blocks = Vec::with_capacity(raw.len());

        for entity in raw {
            let record = match self.normalize(entity) {
                Ok(record) => record,
                Err(e) => {
                    ctx.warnings.add(
                        kind,
                        format!(
                            "Skipped {} `{}`: {}",
                            kind.singular_name(),
                            describe_raw(entity),
                            e
                        ),
                    );
                    continue;
                }
            };

            if !self.include(&record) {
                debug!(kind = kind.as_str(), key = %record.key(), "Record excluded from export");
                continue;
            }

            let key = record.key();
            if rendered.contains(&key) {
                ctx.warnings.add(
                    kind,
                    format!("Skipped {} `{}`: duplicate key", kind.singular_name(), key),
                );
                continue;
            }

            let resolved = match self.resolve(record, &ctx.identifiers) {
                Ok(resolved) => resolved,
                Err(e) => {
                    ctx.warnings.add(
                        kind,
                        format!("Skipped {} `{}`: {}", kind.singular_name(), key, e),
                    );
                    continue;
                }
            };

            if let Some(block) = self.render(&resolved, ctx) {
                blocks.push(block.to_string());
            }
            rendered.insert(key);
        }

        debug!(
            kind = kind.as_str(),
            listed = raw.len(),
            accepted = rendered.len(),
            blocks = blocks.len(),
            "Generated blocks"
        );
        blocks.join("\n")
    }

    /// Fetch this generator's kind and convert it.
    ///
    /// A failed fetch becomes a single warning and an empty contribution.
    async fn generate_from(&self, client: &dyn PolicyClient, ctx: &mut ExportContext) -> String {
        match self.fetch(client).await {
            Ok(raw) => self.generate(&raw, ctx),
            Err(e) => {
                let kind = Self::Record::KIND;
                ctx.warnings.add(kind, fetch_failure_message(kind, &e));
                String::new()
            }
        }
    }
}

/// Object-safe view of an [`EntityGenerator`], for dispatch by kind.
pub trait Generator: Send + Sync {
    /// Kind this generator exports.
    fn kind(&self) -> EntityKind;

    /// Convert a raw listing, see [`EntityGenerator::generate`].
    fn run(&self, raw: &[Value], ctx: &mut ExportContext) -> String;
}

impl<G: EntityGenerator> Generator for G {
    fn kind(&self) -> EntityKind {
        G::Record::KIND
    }

    fn run(&self, raw: &[Value], ctx: &mut ExportContext) -> String {
        self.generate(raw, ctx)
    }
}

/// The generator for `kind`.
pub fn generator_for(kind: EntityKind) -> Box<dyn Generator> {
    match kind {
        EntityKind::Resource => Box::new(ResourceGenerator),
        EntityKind::Action => Box::new(ActionGenerator),
        EntityKind::UserAttribute => Box::new(UserAttributeGenerator),
        EntityKind::Role => Box::new(RoleGenerator),
        EntityKind::ResourceSet => Box::new(ResourceSetGenerator),
        EntityKind::UserSet => Box::new(UserSetGenerator),
        EntityKind::Relation => Box::new(RelationGenerator),
        EntityKind::ConditionSetRule => Box::new(ConditionSetRuleGenerator),
    }
}
