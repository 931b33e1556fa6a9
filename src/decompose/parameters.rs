//! Step 4: Per-unit parameter subsets
//!
//! All resource definitions in the source manifest share one flat parameter
//! table, but each emitted unit should be minimal and independently
//! parameterizable. This step scans every string in a unit's resources for
//! `parameters('x')` references and copies only the referenced entries,
//! followed by any artifact-invariant bookkeeping parameters the caller
//! supplied (e.g. a base-location parameter).
//!
//! References that name neither a source parameter nor a registry-allocated
//! one are skipped silently: the unit keeps working as far as this engine is
//! concerned, and deployability validation is out of scope.

use serde_json::{json, Map, Value};

use crate::expression;
use crate::registry::{IdentifierKind, IdentifierRegistry};

/// Build the parameter table for one unit.
///
/// Referenced parameters come first in scan order, then invariant parameters
/// not already present. Names allocated through the registry during this run
/// (extraction path parameters and the like) materialize from their
/// registered defaults.
pub(crate) fn execute(
    resources: &[Value],
    source_parameters: &Map<String, Value>,
    invariant_parameters: &[(String, Value)],
    registry: &IdentifierRegistry,
) -> Map<String, Value> {
    let mut table = Map::new();

    for resource in resources {
        for name in expression::parameter_refs(resource) {
            if table.contains_key(&name) {
                continue;
            }
            if let Some(definition) = source_parameters.get(&name) {
                table.insert(name, definition.clone());
            } else if let Some(default) = registry.default_of(&name, IdentifierKind::Parameter) {
                table.insert(name, definition_for(default));
            }
        }
    }

    for (name, definition) in invariant_parameters {
        if !table.contains_key(name) {
            table.insert(name.clone(), definition.clone());
        }
    }

    table
}

/// A parameter definition derived from a registered default value.
pub(crate) fn definition_for(default: &Value) -> Value {
    let type_name = match default {
        Value::String(_) | Value::Null => "string",
        Value::Number(_) => "int",
        Value::Bool(_) => "bool",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    json!({"type": type_name, "defaultValue": default})
}
