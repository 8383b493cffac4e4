//! Per-run state shared by the generators.

use crate::generators::ActionCatalog;
use crate::identifiers::IdentifierResolver;
use crate::warnings::WarningCollector;

/// Identifier registry, staged actions and warning list for one export run.
///
/// Generators run one after another and each borrows the context mutably,
/// so no synchronization is needed.
#[derive(Debug, Default)]
pub struct ExportContext {
    pub identifiers: IdentifierResolver,
    pub warnings: WarningCollector,
    /// Actions rendered inside their resource blocks
    pub actions: ActionCatalog,
}

impl ExportContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose resources will carry the actions in `raw`.
    pub fn with_actions(raw: &[serde_json::Value]) -> Self {
        Self {
            actions: ActionCatalog::from_listing(raw),
            ..Self::default()
        }
    }
}
