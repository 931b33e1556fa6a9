//! Step 2: Localize dependencies
//!
//! After partitioning, a resource's `dependsOn` entries fall into three
//! classes:
//!
//! - references to resources in the *same* bucket: left as-is, they resolve
//!   once the unit deploys standalone;
//! - references to resources in *other* buckets: removed from the resource
//!   and recorded on the owning artifact's `external_dependencies` set
//!   (deduplicated, insertion-ordered); the master manifest later turns
//!   these into links between deployment resources;
//! - references that resolve to nothing: left in place, unexternalized, and
//!   reported as a non-fatal warning. The unit stays usable but may fail at
//!   actual deployment time; validating deployability is out of scope.
//!
//! Resolution runs against a reverse index (resource identity -> bucket)
//! built once per run. References are matched either as
//! `resourceId('<type>', ...)` expressions or as raw names, both under the
//! whitespace normalization used for resource identity.

use std::collections::HashMap;

use log::warn;
use serde_json::Value;

use super::{Bucket, DecomposeWarning};
use crate::expression::{self, ResourceReference};
use crate::manifest;

/// Maps resource identities to the bucket that owns them. Built once per
/// decomposition run; first registration wins so lookups stay deterministic.
#[derive(Debug, Default)]
pub(crate) struct ReverseIndex {
    by_type_terminal: HashMap<(String, String), usize>,
    by_full_name: HashMap<String, usize>,
    by_terminal: HashMap<String, usize>,
}

impl ReverseIndex {
    pub fn build(buckets: &[Bucket]) -> Self {
        let mut index = Self::default();
        for (bucket_idx, bucket) in buckets.iter().enumerate() {
            for resource in &bucket.resources {
                manifest::walk_resources(resource, &mut |r| index.register(r, bucket_idx));
            }
        }
        index
    }

    fn register(&mut self, resource: &Value, bucket_idx: usize) {
        let name = manifest::resource_name(resource);
        if name.is_empty() {
            return;
        }
        let resource_type = manifest::resource_type(resource).to_string();
        let full = expression::normalize(name);
        let terminal = expression::terminal_segment(name);

        self.by_full_name.entry(full).or_insert(bucket_idx);
        self.by_terminal
            .entry(terminal.clone())
            .or_insert(bucket_idx);
        self.by_type_terminal
            .entry((resource_type, terminal))
            .or_insert(bucket_idx);
    }

    /// The bucket owning the resource a reference points at, if any.
    pub fn resolve(&self, reference: &ResourceReference) -> Option<usize> {
        if let Some(type_path) = &reference.type_path {
            if let Some(idx) = self
                .by_type_terminal
                .get(&(type_path.clone(), reference.terminal.clone()))
            {
                return Some(*idx);
            }
        } else if let Some(idx) = self.by_full_name.get(&expression::normalize(&reference.raw)) {
            return Some(*idx);
        }
        self.by_terminal.get(&reference.terminal).copied()
    }

    /// Parse and resolve a raw `dependsOn` entry.
    pub fn resolve_raw(&self, raw: &str) -> Option<usize> {
        self.resolve(&expression::parse_reference(raw))
    }
}

/// Execute the localization step over every bucket.
///
/// Returns the per-bucket external-dependency lists, index-aligned with
/// `buckets`. Reported warnings are appended to `warnings`.
pub(crate) fn execute(
    buckets: &mut [Bucket],
    index: &ReverseIndex,
    warnings: &mut Vec<DecomposeWarning>,
) -> Vec<Vec<String>> {
    let mut externals = vec![Vec::new(); buckets.len()];

    for (bucket_idx, bucket) in buckets.iter_mut().enumerate() {
        let external = &mut externals[bucket_idx];
        for resource in &mut bucket.resources {
            manifest::walk_resources_mut(resource, &mut |r| {
                localize_resource(r, bucket_idx, index, external, warnings);
            });
        }
    }

    externals
}

fn localize_resource(
    resource: &mut Value,
    bucket_idx: usize,
    index: &ReverseIndex,
    external: &mut Vec<String>,
    warnings: &mut Vec<DecomposeWarning>,
) {
    let display = manifest::resource_name(resource).to_string();
    let Some(obj) = resource.as_object_mut() else {
        return;
    };
    let Some(Value::Array(entries)) = obj.get_mut(manifest::DEPENDS_ON) else {
        return;
    };

    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries.drain(..) {
        let Some(raw) = entry.as_str() else {
            // Malformed entry shape; keep it untouched.
            kept.push(entry);
            continue;
        };
        match index.resolve_raw(raw) {
            Some(owner) if owner == bucket_idx => kept.push(entry),
            Some(_) => {
                if !external.iter().any(|e| e == raw) {
                    external.push(raw.to_string());
                }
            }
            None => {
                warn!(
                    "unresolved dependency '{}' on resource '{}': left in place",
                    raw, display
                );
                warnings.push(DecomposeWarning::UnresolvedDependency {
                    resource: display.clone(),
                    reference: raw.to_string(),
                });
                kept.push(entry);
            }
        }
    }

    let now_empty = kept.is_empty();
    *entries = kept;
    if now_empty {
        obj.remove(manifest::DEPENDS_ON);
    }
}
