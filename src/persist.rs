//! # Persistence Boundary
//!
//! Writes generated artifacts to the host filesystem under the layout
//! convention `{directory_path}/{name}`, with the master manifest as
//! `master.json` at the output root.
//!
//! This is where the write-through merge happens: when a manifest artifact is
//! about to land on top of an already existing file, the existing (possibly
//! hand-edited) document is loaded as the merge target and the freshly
//! generated manifest is folded into it with the structural merge engine, so
//! regeneration never silently discards a human's edits. Non-manifest
//! documents (extracted policy bodies and the like) are overwritten verbatim.
//!
//! An existing file that cannot be parsed is a hard error rather than an
//! empty merge target: treating it as empty would overwrite exactly the
//! hand edits the merge exists to protect.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::decompose::{ArtifactContent, Decomposition, GeneratedArtifact};
use crate::error::{Error, Result};
use crate::merge::merge_documents;

/// File name of the master manifest at the output root.
pub const MASTER_FILE_NAME: &str = "master.json";

/// Persist one artifact under `output_root`, applying the write-through
/// merge when the destination already holds a manifest.
///
/// Returns the artifact in its final state: unchanged when the destination
/// was empty, or carrying the merged content otherwise.
pub fn write_artifact(
    artifact: &GeneratedArtifact,
    output_root: &Path,
) -> Result<GeneratedArtifact> {
    let destination = output_root.join(artifact.relative_path());
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut finalized = artifact.clone();
    match &artifact.content {
        ArtifactContent::Document(body) => {
            write_text(&destination, ensure_trailing_newline(body.clone()))?;
        }
        ArtifactContent::Manifest(generated) => {
            let content = if destination.exists() {
                let mut existing = read_manifest(&destination)?;
                merge_documents(&mut existing, generated);
                existing
            } else {
                generated.clone()
            };
            write_text(&destination, render(&content)?)?;
            finalized.content = ArtifactContent::Manifest(content);
        }
    }

    Ok(finalized)
}

fn write_text(destination: &Path, content: String) -> Result<()> {
    fs::write(destination, content).map_err(|err| Error::Persist {
        path: destination.display().to_string(),
        message: err.to_string(),
    })
}

/// Persist a whole decomposition: every unit plus the master manifest at the
/// root. Returns the finalized artifacts, master last.
pub fn write_decomposition(
    decomposition: &Decomposition,
    output_root: &Path,
) -> Result<Vec<GeneratedArtifact>> {
    let mut finalized = Vec::with_capacity(decomposition.units.len() + 1);
    for unit in &decomposition.units {
        finalized.push(write_artifact(unit, output_root)?);
    }

    let master = GeneratedArtifact {
        name: MASTER_FILE_NAME.to_string(),
        directory_path: String::new(),
        content: ArtifactContent::Manifest(decomposition.master.clone()),
        external_dependencies: Vec::new(),
    };
    finalized.push(write_artifact(&master, output_root)?);

    Ok(finalized)
}

fn read_manifest(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|err| Error::Manifest {
        message: format!("existing file is not a valid manifest: {}", err),
        path: Some(path.display().to_string()),
    })
}

fn render(manifest: &Value) -> Result<String> {
    Ok(ensure_trailing_newline(serde_json::to_string_pretty(
        manifest,
    )?))
}

fn ensure_trailing_newline(mut content: String) -> String {
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content
}
