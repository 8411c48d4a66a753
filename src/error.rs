//! Error taxonomy for the generator pipeline.
//!
//! Every stage of the library returns [`GenError`]; the binary wraps these in
//! `anyhow` with the context of the file or run that failed. All variants are
//! fatal except [`GenError::Render`], which the pipeline may downgrade under
//! [`crate::RenderFailurePolicy::Lenient`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("no catalog content found in {path}")]
    EmptyCatalog { path: PathBuf },

    #[error("unable to parse catalog {path}: {reason}")]
    MalformedCatalog { path: PathBuf, reason: String },

    #[error("catalog {path} failed schema validation:\n{details}")]
    SchemaViolation { path: PathBuf, details: String },

    #[error("unknown block pattern '{pattern}' on {path}")]
    UnknownBlockPattern { path: String, pattern: String },

    #[error("registration path {path} declared twice ({first} and {second})")]
    DuplicateRegistryPath {
        path: String,
        first: String,
        second: String,
    },

    #[error("{path} declares {field} without any supported type family")]
    EmptyTypeSupport { path: String, field: &'static str },

    #[error("malformed target version '{version}': {reason}")]
    MalformedVersion { version: String, reason: String },

    #[error("rendering {template} failed:\n{diagnostic}")]
    Render {
        template: String,
        diagnostic: String,
    },

    #[error("serializing block documentation: {0}")]
    DocSerialization(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for pipeline stages.
pub type GenResult<T> = Result<T, GenError>;
