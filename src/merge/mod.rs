//! # Structural Merge Engine
//!
//! Recursively folds a freshly regenerated document (`new`) into a previously
//! hand-edited one (`old`), so that regeneration and hand edits can coexist:
//! local additions that upstream does not know about survive, new upstream
//! content is absorbed, and cosmetic whitespace differences inside composed
//! name expressions never show up as spurious diffs.
//!
//! ## Rules
//!
//! Per key present in `new`:
//!
//! - Key absent in `old`: `new`'s subtree is copied in verbatim.
//! - Both objects: plain recursive merge (object keys are already unique
//!   identifiers).
//! - Both arrays: context-sensitive array merge, where the context is the
//!   key the array sits under (`resources`, `responses`, ...).
//! - Both scalars: `new` overwrites `old`.
//! - Any other shape combination: `old` wins. The asymmetry is intentional;
//!   a hand edit that changed a value's shape is protected from regeneration.
//!
//! Array merges treat scalar arrays as ordered sets (`old`'s order preserved,
//! genuinely new values appended) and match object elements through the
//! pluggable [`identity::IdentityRules`] table. Mixed arrays are handled
//! element by element, never as a whole-array failure.
//!
//! The engine mutates `old` in place and never fails on well-formed
//! documents.

pub mod identity;

use log::debug;
use serde_json::Value;

pub use identity::{IdentityKey, IdentityRules};

/// Fold `new` into `old` using the default identity-rule table.
///
/// `old` is mutated in place; the caller keeps ownership of both documents.
pub fn merge_documents(old: &mut Value, new: &Value) {
    merge_documents_with(old, new, &IdentityRules::default());
}

/// Fold `new` into `old` with a caller-supplied identity-rule table.
pub fn merge_documents_with(old: &mut Value, new: &Value, rules: &IdentityRules) {
    merge_value(old, new, None, rules);
}

fn merge_value(old: &mut Value, new: &Value, context: Option<&str>, rules: &IdentityRules) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            for (key, new_value) in new_map {
                match old_map.get_mut(key) {
                    Some(old_value) => merge_value(old_value, new_value, Some(key.as_str()), rules),
                    None => {
                        old_map.insert(key.clone(), new_value.clone());
                    }
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            merge_array(old_items, new_items, context, rules);
        }
        (old_scalar, new_scalar)
            if !old_scalar.is_object()
                && !old_scalar.is_array()
                && !new_scalar.is_object()
                && !new_scalar.is_array() =>
        {
            *old_scalar = new_scalar.clone();
        }
        (old_kept, _) => {
            // Structural mismatch: the hand-edited shape wins, silently.
            debug!(
                "structural mismatch at {:?}: keeping existing {} over regenerated value",
                context,
                kind_name(old_kept)
            );
        }
    }
}

/// Context-sensitive array merge. Each element of `new` is classified
/// independently as scalar or object, so malformed mixed arrays degrade
/// element by element.
fn merge_array(old: &mut Vec<Value>, new: &[Value], context: Option<&str>, rules: &IdentityRules) {
    for element in new {
        if element.is_object() {
            if let Some(matched) = old
                .iter_mut()
                .find(|candidate| rules.is_same(context, candidate, element))
            {
                // Nested customizations on the matched object survive.
                merge_value(matched, element, context, rules);
                continue;
            }
            if !old.contains(element) {
                old.push(element.clone());
            }
        } else {
            // Scalar arrays behave as ordered sets.
            if !old.contains(element) {
                old.push(element.clone());
            }
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}
