//! JSON Schema contract for catalog documents.
//!
//! The schema ships inside the binary so a generator run never depends on the
//! working directory. YAML and JSON catalogs are both converted to a
//! `serde_json::Value` before validation, so one schema covers both formats.

use crate::error::{GenError, GenResult};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::path::Path;

const CATALOG_SCHEMA: &str = include_str!("../schema/block_catalog.schema.json");

/// Compiled catalog schema, identified by its `title`.
pub(crate) struct CatalogSchema {
    pub title: String,
    pub compiled: JSONSchema,
}

impl CatalogSchema {
    /// Parse and compile the embedded catalog schema.
    pub(crate) fn load() -> GenResult<Self> {
        let raw: Value =
            serde_json::from_str(CATALOG_SCHEMA).map_err(|err| GenError::MalformedCatalog {
                path: Path::new("schema/block_catalog.schema.json").to_path_buf(),
                reason: err.to_string(),
            })?;
        let title = raw
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("catalog schema")
            .to_string();
        let compiled = JSONSchema::compile(&raw).map_err(|err| GenError::MalformedCatalog {
            path: Path::new("schema/block_catalog.schema.json").to_path_buf(),
            reason: format!("compiling schema: {err}"),
        })?;
        Ok(Self { title, compiled })
    }

    /// Validate a parsed catalog document, collecting every violation.
    pub(crate) fn validate(&self, document: &Value, source: &Path) -> GenResult<()> {
        if let Err(errors) = self.compiled.validate(document) {
            let details = errors
                .map(|err| format!("  {err}"))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(GenError::SchemaViolation {
                path: source.to_path_buf(),
                details,
            });
        }
        log::debug!("{} satisfies the {} schema", source.display(), self.title);
        Ok(())
    }
}
