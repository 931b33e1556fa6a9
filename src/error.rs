//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `armature` library. It uses the `thiserror` library to create an `Error`
//! enum covering the anticipated failure modes, providing clear and
//! descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum representing all hard failures. Each variant
//!   corresponds to a specific type of error and includes contextual
//!   information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library to simplify function signatures.
//!
//! ## Propagation policy
//!
//! Most conditions in this library are deliberately *not* errors. A structural
//! type mismatch during a merge resolves silently toward the existing value,
//! an unresolvable `dependsOn` reference becomes a warning on the
//! decomposition result, and a composed expression that cannot be tokenized
//! degrades to an opaque literal. Only conditions that make the result
//! unusable surface as `Error`:
//!
//! - Identifier namespace exhaustion (pathological input, see `registry`).
//! - Persistence failures: I/O, serialization, or an existing on-disk
//!   manifest that cannot be parsed (overwriting it would silently discard
//!   the hand edits the write-through merge exists to protect).

use thiserror::Error;

/// Main error type for armature operations
#[derive(Error, Debug)]
pub enum Error {
    /// The identifier registry could not find a free suffixed name.
    ///
    /// Raised after `base2` through `base99` are all taken with conflicting
    /// defaults. This indicates pathologically many same-named,
    /// differently-valued identifiers in the input, not a recoverable
    /// condition.
    #[error("Identifier namespace exhausted for {kind} '{base_name}': suffixes 2..=99 are all taken")]
    NamespaceExhausted { base_name: String, kind: String },

    /// A manifest could not be parsed or is not usable as a merge target.
    ///
    /// Includes the file path when the manifest came from disk.
    #[error("Manifest error{}: {message}", path.as_ref().map(|p| format!(" ({})", p)).unwrap_or_default())]
    Manifest {
        message: String,
        /// Source file of the offending manifest, if any.
        path: Option<String>,
    },

    /// An error occurred while persisting generated artifacts.
    #[error("Persistence error for '{path}': {message}")]
    Persist { path: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization or parsing error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
