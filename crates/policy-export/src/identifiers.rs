//! Identifier allocation.
//!
//! Every exported entity is declared as a Terraform block whose name must be
//! a valid identifier, unique among blocks of the same type. The resolver
//! hands out those names and remembers them, so later kinds can reference
//! earlier ones by `(kind, key)`.
//!
//! Namespaces are scoped per kind: `permitio_role.admin` and
//! `permitio_resource.admin` can coexist because references are always
//! qualified by block type.

use policy_schema::EntityKind;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Prefix for identifiers that would otherwise not start with a letter.
const FALLBACK_PREFIX: &str = "r_";

/// A sanitized block name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Get the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One allocated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub kind: EntityKind,
    pub key: String,
    pub identifier: Identifier,
}

/// Turn arbitrary text into identifier text.
///
/// ASCII letters are lowercased, every run of other characters outside
/// `[a-z0-9_]` collapses to one `_`, and leading or trailing `_` are dropped.
/// A result that is empty or does not start with a letter gets an `r_`
/// prefix.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;

    for c in text.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    let trimmed = out.trim_matches('_');
    match trimmed.chars().next() {
        Some(first) if first.is_ascii_lowercase() => trimmed.to_string(),
        _ => format!("{}{}", FALLBACK_PREFIX, trimmed),
    }
}

/// Per-run registry of `(kind, key) -> identifier`.
#[derive(Debug, Clone, Default)]
pub struct IdentifierResolver {
    entries: Vec<Registration>,
    index: HashMap<(EntityKind, String), usize>,
    taken: HashSet<(EntityKind, String)>,
}

impl IdentifierResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or allocate the identifier for `key`, derived from the key itself.
    pub fn register(&mut self, kind: EntityKind, key: &str) -> Identifier {
        self.register_as(kind, key, key)
    }

    /// Get or allocate the identifier for `key`, derived from `name_hint`.
    ///
    /// A key registered once keeps its identifier; the hint only matters on
    /// the first registration.
    pub fn register_as(&mut self, kind: EntityKind, key: &str, name_hint: &str) -> Identifier {
        if let Some(identifier) = self.lookup(kind, key) {
            return identifier.clone();
        }

        let base = sanitize(name_hint);
        let mut candidate = base.clone();
        let mut suffix = 1u32;
        while self.taken.contains(&(kind, candidate.clone())) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        let identifier = Identifier(candidate.clone());
        self.taken.insert((kind, candidate));
        self.index.insert((kind, key.to_string()), self.entries.len());
        self.entries.push(Registration {
            kind,
            key: key.to_string(),
            identifier: identifier.clone(),
        });
        identifier
    }

    /// Look up a registered identifier without allocating.
    pub fn lookup(&self, kind: EntityKind, key: &str) -> Option<&Identifier> {
        self.index
            .get(&(kind, key.to_string()))
            .map(|&i| &self.entries[i].identifier)
    }

    /// Terraform address of a registered entity, e.g. `permitio_role.admin`.
    ///
    /// `None` for kinds without a block of their own.
    pub fn reference(&self, kind: EntityKind, key: &str) -> Option<String> {
        if !kind.has_own_block() {
            return None;
        }
        self.lookup(kind, key)
            .map(|identifier| format!("{}.{}", kind.block_type(), identifier))
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registrations in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }
}
