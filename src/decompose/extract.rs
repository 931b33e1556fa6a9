//! Step 3: Content extraction
//!
//! Some resources carry a large embedded document as a string payload (a
//! policy body, a schema definition). When the caller flags a resource kind
//! for extraction, the payload becomes its own artifact of a non-manifest
//! content type, written alongside the owning unit, and the original field
//! is rewritten to a computed path expression:
//!
//! ```text
//! [concat(parameters('templateBaseUrl'), '/<unit>/<file>', parameters('templateSasToken'))]
//! ```
//!
//! The base-URL and access-token parameter names are allocated through the
//! identifier registry so they participate in the run's flat namespace like
//! any other generated parameter. Whether a kind is extracted is entirely
//! the caller's decision; this engine applies flags, it does not judge
//! payload sizes.

use serde_json::{json, Value};

use super::{ArtifactContent, Bucket, DecomposeOptions, GeneratedArtifact};
use crate::error::Result;
use crate::expression;
use crate::manifest;
use crate::registry::{IdentifierKind, IdentifierRegistry};

/// Execute the extraction step over every bucket.
///
/// Returns the extracted document artifacts, in encounter order. Resources
/// whose payload pointer resolves to nothing (or to a non-string) are left
/// untouched; an extraction flag is not a validation obligation.
pub(crate) fn execute(
    buckets: &mut [Bucket],
    options: &DecomposeOptions,
    registry: &mut IdentifierRegistry,
) -> Result<Vec<GeneratedArtifact>> {
    if options.extract_rules.is_empty() {
        return Ok(Vec::new());
    }

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

    let mut artifacts = Vec::new();
    for bucket in buckets.iter_mut() {
        let directory = bucket.file_stem();
        for resource in &mut bucket.resources {
            manifest::walk_resources_mut(resource, &mut |r| {
                extract_resource(r, &directory, options, &base_url, &token, &mut artifacts);
            });
        }
    }
    Ok(artifacts)
}

fn extract_resource(
    resource: &mut Value,
    directory: &str,
    options: &DecomposeOptions,
    base_url: &str,
    token: &str,
    artifacts: &mut Vec<GeneratedArtifact>,
) {
    let resource_type = manifest::resource_type(resource).to_string();
    let Some(rule) = options
        .extract_rules
        .iter()
        .find(|rule| rule.resource_type == resource_type)
    else {
        return;
    };

    let stem = super::file_stem(&expression::terminal_segment(manifest::resource_name(
        resource,
    )));
    let Some(payload) = resource.pointer_mut(&rule.payload_pointer) else {
        return;
    };
    let Some(body) = payload.as_str().map(str::to_string) else {
        return;
    };

    let mut file_name = format!("{}.{}", stem, rule.extension);
    let mut attempt = 2u32;
    while artifacts
        .iter()
        .any(|a| a.directory_path == directory && a.name == file_name)
    {
        file_name = format!("{}-{}.{}", stem, attempt, rule.extension);
        attempt += 1;
    }

    *payload = Value::String(format!(
        "[concat(parameters('{}'), '/{}/{}', parameters('{}'))]",
        base_url, directory, file_name, token
    ));

    artifacts.push(GeneratedArtifact {
        name: file_name,
        directory_path: directory.to_string(),
        content: ArtifactContent::Document(body),
        external_dependencies: Vec::new(),
    });
}
