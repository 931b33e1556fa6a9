//! # Manifest Model
//!
//! Manifests are schema-less ordered document trees, represented directly as
//! `serde_json::Value` (built with the `preserve_order` feature, so object
//! keys keep their insertion order). This module holds the well-known key
//! names and small accessors used by the merge and decomposition engines.
//!
//! Type-specific knowledge deliberately does *not* live in the tree type:
//! the identity-rule table (`merge::identity`) and the grouping-key closure
//! passed to `decompose` carry it as data instead.

use serde_json::{json, Map, Value};

/// Top-level manifest key holding the parameter table.
pub const PARAMETERS: &str = "parameters";
/// Top-level manifest key holding the variable table.
pub const VARIABLES: &str = "variables";
/// Manifest key holding the resource forest (top-level or nested).
pub const RESOURCES: &str = "resources";
/// Top-level manifest key holding outputs.
pub const OUTPUTS: &str = "outputs";

/// Resource field: dot/slash-separated resource-type path.
pub const TYPE: &str = "type";
/// Resource field: literal or composed-expression name.
pub const NAME: &str = "name";
/// Resource field: nested property bag.
pub const PROPERTIES: &str = "properties";
/// Resource field: array of reference strings this resource depends on.
pub const DEPENDS_ON: &str = "dependsOn";

/// Default deployment schema carried on generated manifests when the source
/// manifest does not supply one.
pub const DEFAULT_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#";
/// Default content version for generated manifests.
pub const DEFAULT_CONTENT_VERSION: &str = "1.0.0.0";

/// Build an empty manifest skeleton.
///
/// `$schema` and `contentVersion` are copied from `source` when present so
/// that decomposed units stay consistent with the environment manifest they
/// were split from.
pub fn empty_like(source: &Value) -> Value {
    let schema = source
        .get("$schema")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SCHEMA);
    let content_version = source
        .get("contentVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CONTENT_VERSION);

    json!({
        "$schema": schema,
        "contentVersion": content_version,
        PARAMETERS: {},
        VARIABLES: {},
        RESOURCES: [],
        OUTPUTS: {},
    })
}

/// The top-level resource array of a manifest, if present and well-formed.
pub fn resources(manifest: &Value) -> Option<&Vec<Value>> {
    manifest.get(RESOURCES).and_then(Value::as_array)
}

/// The parameter table of a manifest, if present and well-formed.
pub fn parameters(manifest: &Value) -> Option<&Map<String, Value>> {
    manifest.get(PARAMETERS).and_then(Value::as_object)
}

/// A resource's `type`, or `""` for malformed resource nodes.
pub fn resource_type(resource: &Value) -> &str {
    resource.get(TYPE).and_then(Value::as_str).unwrap_or("")
}

/// A resource's `name`, or `""` for malformed resource nodes.
pub fn resource_name(resource: &Value) -> &str {
    resource.get(NAME).and_then(Value::as_str).unwrap_or("")
}

/// Visit `resource` and every nested resource underneath it, parents first.
pub fn walk_resources<'a>(resource: &'a Value, visit: &mut dyn FnMut(&'a Value)) {
    visit(resource);
    if let Some(children) = resource.get(RESOURCES).and_then(Value::as_array) {
        for child in children {
            walk_resources(child, visit);
        }
    }
}

/// Mutable variant of [`walk_resources`], used when rewriting `dependsOn`
/// entries in place.
pub fn walk_resources_mut(resource: &mut Value, visit: &mut dyn FnMut(&mut Value)) {
    visit(resource);
    if let Some(children) = resource.get_mut(RESOURCES).and_then(Value::as_array_mut) {
        for child in children {
            walk_resources_mut(child, visit);
        }
    }
}
