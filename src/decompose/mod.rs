//! Implementation of the decomposition pipeline.
//!
//! ## Overview
//!
//! Decomposition splits one environment manifest into independently
//! deployable units and runs in five steps:
//!
//! 1. Partition - Bucket top-level resources by a caller-supplied grouping
//!    key (nested resources travel with their parent)
//! 2. Localize - Externalize cross-unit `dependsOn` references through a
//!    reverse index built once per run
//! 3. Extract - Optionally pull large embedded payloads out into sibling
//!    documents, rewriting the owning field to a computed path expression
//! 4. Parameter subsets - Give each unit only the parameters its resources
//!    transitively reference, plus caller-supplied invariant parameters
//! 5. Master assembly - Emit one deployment-link resource per unit, wiring
//!    external dependencies into a deployment graph
//!
//! The write-through merge over already persisted units is not a step of
//! this pipeline; it lives at the persistence boundary (`crate::persist`)
//! and reuses the structural merge engine.
//!
//! Everything here is a synchronous, in-memory tree transformation. The only
//! mutable run state is the [`IdentifierRegistry`] created at the top of
//! [`decompose`]. Bucket order, parameter order, and dependency order all
//! follow first-encounter order of the input, so re-running on unchanged
//! input reproduces the output byte for byte.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::manifest;
use crate::registry::IdentifierRegistry;

// Pipeline step modules
pub mod extract;
pub mod localize;
pub mod master;
pub mod parameters;
pub mod partition;

/// Content of one generated artifact: either a deployable manifest or a raw
/// extracted document (a policy body, a schema definition, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArtifactContent {
    Manifest(Value),
    Document(String),
}

/// One emitted, independently deployable unit (or extracted document).
///
/// Immutable after creation, except that the persistence layer may replace
/// `content` with the result of the write-through merge before the artifact
/// reaches its final state (`Computed -> Merged -> Final`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// File name, e.g. `apis.json` or `echo-api-policy.xml`.
    pub name: String,
    /// Directory the artifact is persisted under, relative to the output
    /// root.
    pub directory_path: String,
    pub content: ArtifactContent,
    /// References this unit's resources make to resources that ended up in
    /// other units. Deduplicated, insertion-ordered.
    pub external_dependencies: Vec<String>,
}

impl GeneratedArtifact {
    pub fn is_manifest(&self) -> bool {
        matches!(self.content, ArtifactContent::Manifest(_))
    }

    /// The manifest content, for manifest artifacts.
    pub fn manifest(&self) -> Option<&Value> {
        match &self.content {
            ArtifactContent::Manifest(m) => Some(m),
            ArtifactContent::Document(_) => None,
        }
    }

    /// Path of this artifact relative to the output root.
    pub fn relative_path(&self) -> String {
        if self.directory_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.directory_path, self.name)
        }
    }
}

/// Non-fatal conditions reported alongside a best-effort result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecomposeWarning {
    /// A `dependsOn` entry did not resolve to any known resource. The
    /// reference is left in place; the unit stays usable but may fail at
    /// actual deployment time.
    UnresolvedDependency { resource: String, reference: String },
}

impl fmt::Display for DecomposeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecomposeWarning::UnresolvedDependency {
                resource,
                reference,
            } => write!(
                f,
                "unresolved dependency '{}' on resource '{}'",
                reference, resource
            ),
        }
    }
}

/// Extraction flag for one resource kind: which field of which resource type
/// is pulled out into a sibling document. Supplied by the caller, never
/// decided by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRule {
    /// Exact resource-type path, e.g. `svc/apis/policies`.
    pub resource_type: String,
    /// JSON pointer to the embedded payload, e.g. `/properties/value`.
    pub payload_pointer: String,
    /// File extension of the extracted document, e.g. `xml`.
    pub extension: String,
}

/// Caller-supplied configuration for one decomposition run.
///
/// The deployment-link taxonomy is configuration, not engine logic; the
/// defaults match the common deployment-manifest dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposeOptions {
    /// Resource type of deployment-link resources in the master manifest.
    pub link_resource_type: String,
    /// API version stamped on deployment-link resources.
    pub link_api_version: String,
    /// Name of the base-location parameter used in computed path
    /// expressions and template links.
    pub base_url_parameter: String,
    /// Name of the access-token parameter appended to computed paths.
    pub access_token_parameter: String,
    /// Artifact-invariant bookkeeping parameters copied into every unit
    /// (name, parameter definition).
    pub invariant_parameters: Vec<(String, Value)>,
    /// Per-resource-kind payload extraction flags.
    pub extract_rules: Vec<ExtractRule>,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        Self {
            link_resource_type: "Microsoft.Resources/deployments".to_string(),
            link_api_version: "2021-04-01".to_string(),
            base_url_parameter: "templateBaseUrl".to_string(),
            access_token_parameter: "templateSasToken".to_string(),
            invariant_parameters: Vec::new(),
            extract_rules: Vec::new(),
        }
    }
}

/// Result of one decomposition run.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Emitted units and extracted documents, in bucket order.
    pub units: Vec<GeneratedArtifact>,
    /// Master manifest redeploying every manifest unit in dependency order.
    pub master: Value,
    /// Non-fatal conditions encountered along the way.
    pub warnings: Vec<DecomposeWarning>,
}

/// One partition bucket: a grouping key and the top-level resources (with
/// their nested children) that landed in it.
#[derive(Debug, Clone)]
pub(crate) struct Bucket {
    pub key: String,
    pub resources: Vec<Value>,
}

impl Bucket {
    /// Filesystem-safe stem derived from the grouping key.
    pub fn file_stem(&self) -> String {
        file_stem(&self.key)
    }
}

/// Filesystem-safe stem: path separators and whitespace become dashes.
pub(crate) fn file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_whitespace() {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Split `source` into independently deployable units and assemble the
/// master manifest.
///
/// `group_key` maps each top-level resource node to the bucket it belongs
/// to. Bucket order is first-encounter order, so the output is deterministic
/// for a given input.
///
/// # Errors
///
/// Only identifier-namespace exhaustion aborts; every other condition
/// degrades to a warning on the returned [`Decomposition`].
pub fn decompose<F>(source: &Value, group_key: F, options: &DecomposeOptions) -> Result<Decomposition>
where
    F: Fn(&Value) -> String,
{
    let mut registry = IdentifierRegistry::new();
    let mut warnings = Vec::new();

    // Step 1: partition the resource forest.
    let mut buckets = partition::execute(source, &group_key);

    // Step 2: localize dependencies against a reverse index built once.
    let index = localize::ReverseIndex::build(&buckets);
    let externals = localize::execute(&mut buckets, &index, &mut warnings);

    // Step 3: extract flagged payloads into sibling documents.
    let mut extracted = extract::execute(&mut buckets, options, &mut registry)?;

    // Step 4: materialize unit manifests with their parameter subsets.
    let source_parameters = manifest::parameters(source)
        .cloned()
        .unwrap_or_else(Map::new);
    let mut units = Vec::with_capacity(buckets.len());
    for (bucket, external) in buckets.iter().zip(&externals) {
        let mut unit = manifest::empty_like(source);
        unit[manifest::PARAMETERS] = Value::Object(parameters::execute(
            &bucket.resources,
            &source_parameters,
            &options.invariant_parameters,
            &registry,
        ));
        unit[manifest::RESOURCES] = Value::Array(bucket.resources.clone());

        units.push(GeneratedArtifact {
            name: format!("{}.json", bucket.file_stem()),
            directory_path: bucket.file_stem(),
            content: ArtifactContent::Manifest(unit),
            external_dependencies: external.clone(),
        });
    }
    units.append(&mut extracted);

    // Step 5: assemble the master manifest over the emitted units.
    let master = master::execute(source, &buckets, &units, &externals, &index, options, &mut registry)?;

    Ok(Decomposition {
        units,
        master,
        warnings,
    })
}
