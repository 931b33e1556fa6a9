//! # Armature
//!
//! This library converts a snapshot of a deployed service's resource
//! configuration into declarative manifests that can be redeployed,
//! versioned, and selectively reapplied. It operates purely on in-memory
//! document trees: no network, no process boundary, deterministic and
//! idempotent.
//!
//! ## Quick Example
//!
//! ```
//! use armature::merge::merge_documents;
//! use serde_json::json;
//!
//! // A hand-edited manifest with a local addition.
//! let mut edited = json!({
//!     "resources": [{"name": "api", "type": "svc/apis", "localNote": "keep me"}]
//! });
//!
//! // A freshly regenerated manifest for the same environment.
//! let regenerated = json!({
//!     "resources": [{"name": "api", "type": "svc/apis", "apiVersion": "2024-05-01"}]
//! });
//!
//! merge_documents(&mut edited, &regenerated);
//!
//! // The local edit survived and the upstream addition was absorbed.
//! assert_eq!(edited["resources"][0]["localNote"], "keep me");
//! assert_eq!(edited["resources"][0]["apiVersion"], "2024-05-01");
//! ```
//!
//! ## Core Concepts
//!
//! - **Structural Merge (`merge`)**: Recursively folds a regenerated document
//!   into a hand-edited one. Arrays of objects are matched through a
//!   context-sensitive, pluggable identity-rule table, so nested
//!   customizations survive regeneration and whitespace-only differences in
//!   composed name expressions are never mistaken for renames.
//! - **Identifier Registry (`registry`)**: Run-scoped allocation of stable,
//!   collision-free parameter and variable names from human-readable base
//!   names.
//! - **Decomposition (`decompose`)**: Splits one environment manifest into
//!   independently deployable units, externalizes cross-unit dependencies,
//!   and assembles a master manifest expressing the deployment graph.
//! - **Expressions (`expression`)**: Narrow tokenizer over composed
//!   expression strings: whitespace-insensitive name identity, reference
//!   parsing, and parameter-reference scanning. Malformed strings degrade to
//!   opaque literals.
//! - **Persistence (`persist`)**: Writes artifacts as `{directory}/{name}`
//!   files and applies the write-through merge over already existing units.
//!
//! ## Execution Flow
//!
//! A caller builds (or re-fetches) an environment manifest, then:
//!
//! 1.  **Decompose**: partition resources by a grouping key, localize
//!     dependencies, optionally extract embedded payloads, compute per-unit
//!     parameter subsets, and assemble the master manifest.
//! 2.  **Persist**: write each unit; where a unit already exists on disk the
//!     structural merge reconciles the regenerated content with local edits.
//!
//! Both steps are synchronous, single-threaded tree transformations. The
//! merge engine is equally usable standalone, e.g. to reconcile two full
//! manifests without decomposition.

pub mod decompose;
pub mod error;
pub mod expression;
pub mod manifest;
pub mod merge;
pub mod persist;
pub mod registry;

#[cfg(test)]
mod merge_proptest;
