//! Non-fatal problems collected during a run.

use policy_schema::EntityKind;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// A problem that made the export skip something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Kind being exported when the problem occurred
    pub kind: EntityKind,
    /// Human readable description
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Append-only list of warnings for one run.
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Vec<Warning>,
}

impl WarningCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn add(&mut self, kind: EntityKind, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = kind.as_str(), message = %message, "Export warning");
        self.warnings.push(Warning { kind, message });
    }

    /// All warnings in the order they were added.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Warning messages in the order they were added.
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }

    /// Warnings recorded for `kind`.
    pub fn for_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consume the collector, keeping the warnings.
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order() {
        let mut warnings = WarningCollector::new();
        assert!(warnings.is_empty());

        warnings.add(EntityKind::Role, "first");
        warnings.add(EntityKind::Relation, "second".to_string());
        warnings.add(EntityKind::Role, "third");

        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings.messages(), ["first", "second", "third"]);
        assert_eq!(warnings.warnings()[1].kind, EntityKind::Relation);
    }

    #[test]
    fn test_for_kind_filters() {
        let mut warnings = WarningCollector::new();
        warnings.add(EntityKind::Role, "a");
        warnings.add(EntityKind::UserSet, "b");
        warnings.add(EntityKind::Role, "c");

        let roles: Vec<String> = warnings
            .for_kind(EntityKind::Role)
            .map(ToString::to_string)
            .collect();
        assert_eq!(roles, ["a", "c"]);
        assert_eq!(warnings.for_kind(EntityKind::Resource).count(), 0);
    }
}
