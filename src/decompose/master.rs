//! Step 5: Master manifest assembly
//!
//! The master manifest redeploys every emitted unit through one
//! deployment-link resource per manifest artifact. Extracted documents are
//! referenced by path from within their owning unit, not deployed, so they
//! get no link.
//!
//! Each link's `dependsOn` is the unit's externalized dependency set
//! translated through the reverse index: an external dependency on a
//! resource is a dependency on whichever unit contains that resource, so the
//! link points at that unit's own deployment-link resource. Parameters
//! required by a unit are forwarded into its link's parameter block, and the
//! master's own parameter table is the union across units.

use serde_json::{json, Map, Value};

use super::localize::ReverseIndex;
use super::parameters::definition_for;
use super::{Bucket, DecomposeOptions, GeneratedArtifact};
use crate::error::Result;
use crate::manifest;
use crate::registry::{IdentifierKind, IdentifierRegistry};

/// Execute the master-assembly step.
///
/// `units` holds one manifest artifact per bucket (index-aligned), followed
/// by any extracted documents; `externals` is index-aligned with `buckets`.
pub(crate) fn execute(
    source: &Value,
    buckets: &[Bucket],
    units: &[GeneratedArtifact],
    externals: &[Vec<String>],
    index: &ReverseIndex,
    options: &DecomposeOptions,
    registry: &mut IdentifierRegistry,
) -> Result<Value> {
    let base_url = registry.assign(
        &options.base_url_parameter,
        IdentifierKind::Parameter,
        &json!(""),
    )?;
    let token = registry.assign(
        &options.access_token_parameter,
        IdentifierKind::Parameter,
        &json!(""),
    )?;

    let content_version = source
        .get("contentVersion")
        .and_then(Value::as_str)
        .unwrap_or(manifest::DEFAULT_CONTENT_VERSION)
        .to_string();

    let mut master_parameters = Map::new();
    let mut links = Vec::with_capacity(buckets.len());

    for (bucket_idx, bucket) in buckets.iter().enumerate() {
        let unit = &units[bucket_idx];
        let Some(content) = unit.manifest() else {
            continue;
        };
        let unit_parameters = manifest::parameters(content)
            .cloned()
            .unwrap_or_else(Map::new);

        // Union of unit parameters flows up into the master's own table.
        for (name, definition) in &unit_parameters {
            if !master_parameters.contains_key(name) {
                master_parameters.insert(name.clone(), definition.clone());
            }
        }

        let forwarded: Map<String, Value> = unit_parameters
            .keys()
            .map(|name| {
                (
                    name.clone(),
                    json!({"value": format!("[parameters('{}')]", name)}),
                )
            })
            .collect();

        let uri = format!(
            "[concat(parameters('{}'), '/{}', parameters('{}'))]",
            base_url,
            unit.relative_path(),
            token
        );

        let mut link = json!({
            "type": options.link_resource_type,
            "apiVersion": options.link_api_version,
            "name": bucket.file_stem(),
            "properties": {
                "mode": "Incremental",
                "templateLink": {
                    "uri": uri,
                    "contentVersion": content_version,
                },
                "parameters": forwarded,
            }
        });

        let depends = link_dependencies(bucket_idx, &externals[bucket_idx], buckets, index, options);
        if !depends.is_empty() {
            link[manifest::DEPENDS_ON] = Value::Array(depends);
        }

        links.push(link);
    }

    for name in [&base_url, &token] {
        if !master_parameters.contains_key(name.as_str()) {
            master_parameters.insert(name.clone(), definition_for(&json!("")));
        }
    }

    let mut master = manifest::empty_like(source);
    master[manifest::PARAMETERS] = Value::Object(master_parameters);
    master[manifest::RESOURCES] = Value::Array(links);
    Ok(master)
}

/// Translate a unit's external resource references into references to the
/// owning units' deployment-link resources.
fn link_dependencies(
    bucket_idx: usize,
    external: &[String],
    buckets: &[Bucket],
    index: &ReverseIndex,
    options: &DecomposeOptions,
) -> Vec<Value> {
    let mut depends: Vec<Value> = Vec::new();
    for reference in external {
        let Some(owner) = index.resolve_raw(reference) else {
            // Localization already warned about anything unresolvable; the
            // link simply carries no edge for it.
            continue;
        };
        if owner == bucket_idx {
            continue;
        }
        let link_ref = format!(
            "[resourceId('{}', '{}')]",
            options.link_resource_type,
            buckets[owner].file_stem()
        );
        if !depends.iter().any(|d| d.as_str() == Some(link_ref.as_str())) {
            depends.push(Value::String(link_ref));
        }
    }
    depends
}
