//! # Identifier Registry
//!
//! Resource definitions are composed independently (per API, per product, per
//! backend) but share one flat parameter namespace per manifest. The registry
//! allocates stable, collision-free names from human-readable base names so
//! that generation stays deterministic: the same input always produces the
//! same assigned names, while unrelated resources that happen to derive the
//! same base name with different values get suffixed names.
//!
//! The registry is an explicit context object scoped to one generation run
//! and passed by `&mut` into every call site, never ambient global state. It
//! is not designed for concurrent access; callers that fan out generation
//! must run one registry per shard or serialize access. Registration is
//! monotonic: no entry is removed or renamed after assignment, so all
//! components in a run observe a consistent mapping.

use serde_json::Value;

use crate::error::{Error, Result};

/// Highest suffix probed before the namespace counts as exhausted.
const MAX_SUFFIX: u32 = 99;

/// Which table an identifier is assigned in. Parameters and variables are
/// separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Parameter,
    Variable,
}

impl IdentifierKind {
    fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Parameter => "parameter",
            IdentifierKind::Variable => "variable",
        }
    }
}

/// One registered identifier: the assigned (possibly suffixed) name and the
/// default value it was registered with.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub name: String,
    pub default: Value,
}

/// Run-scoped identifier allocation for parameters and variables.
///
/// Entries keep insertion order so emitted parameter tables are deterministic
/// across runs of the same input.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    parameters: Vec<RegistryEntry>,
    variables: Vec<RegistryEntry>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a final name for `base`.
    ///
    /// - Unused base: registered with `default`, returned unchanged.
    /// - Base registered with a structurally equal default: returned as-is
    ///   (idempotent re-request from another call site).
    /// - Base registered with a different default: probes `base2`..`base99`.
    ///   A probe that is already registered with an equal default is returned
    ///   (so repeated calls stay deterministic); the first unused probe is
    ///   registered and returned.
    ///
    /// # Errors
    ///
    /// [`Error::NamespaceExhausted`] when all 99 suffixes are taken with
    /// conflicting defaults. Pathological input; nothing recoverable.
    pub fn assign(&mut self, base: &str, kind: IdentifierKind, default: &Value) -> Result<String> {
        let table = self.table_mut(kind);

        match table.iter().find(|e| e.name == base) {
            None => {
                table.push(RegistryEntry {
                    name: base.to_string(),
                    default: default.clone(),
                });
                return Ok(base.to_string());
            }
            Some(existing) if existing.default == *default => return Ok(base.to_string()),
            Some(_) => {}
        }

        for suffix in 2..=MAX_SUFFIX {
            let candidate = format!("{}{}", base, suffix);
            match table.iter().find(|e| e.name == candidate) {
                None => {
                    table.push(RegistryEntry {
                        name: candidate.clone(),
                        default: default.clone(),
                    });
                    return Ok(candidate);
                }
                Some(existing) if existing.default == *default => return Ok(candidate),
                Some(_) => {}
            }
        }

        Err(Error::NamespaceExhausted {
            base_name: base.to_string(),
            kind: kind.as_str().to_string(),
        })
    }

    /// All registered entries of `kind`, in assignment order.
    pub fn entries(&self, kind: IdentifierKind) -> &[RegistryEntry] {
        match kind {
            IdentifierKind::Parameter => &self.parameters,
            IdentifierKind::Variable => &self.variables,
        }
    }

    /// The registered default for an assigned name, if any.
    pub fn default_of(&self, name: &str, kind: IdentifierKind) -> Option<&Value> {
        self.entries(kind)
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.default)
    }

    fn table_mut(&mut self, kind: IdentifierKind) -> &mut Vec<RegistryEntry> {
        match kind {
            IdentifierKind::Parameter => &mut self.parameters,
            IdentifierKind::Variable => &mut self.variables,
        }
    }
}
