//! Catalog Loader: document → validated [`Catalog`].
//!
//! Loading is strict: the document must be non-empty, satisfy the catalog
//! schema, name only known block patterns, declare each category under one
//! key, and declare every `/<domain>/<header>/<func>` path once. Registered
//! paths (`blockName`, falling back to `func`) must be unique as well. No
//! defaults are derived here.

use crate::catalog::identity::{BlockPattern, Category};
use crate::catalog::model::{Catalog, Entry, EntryRecord};
use crate::error::{GenError, GenResult};
use crate::schema_loader::CatalogSchema;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Serialization format of a catalog document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.yaml`/`.yml` are YAML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Read, validate, and group a catalog document from disk.
pub fn load_catalog_from_path(path: &Path, domain: &str) -> GenResult<Catalog> {
    let text = fs::read_to_string(path).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&text, DocumentFormat::from_path(path), path, domain)
}

/// Parse catalog text; `source` is only used for diagnostics.
pub fn parse_catalog(
    text: &str,
    format: DocumentFormat,
    source: &Path,
    domain: &str,
) -> GenResult<Catalog> {
    if text.trim().is_empty() {
        return Err(GenError::EmptyCatalog {
            path: source.to_path_buf(),
        });
    }

    let document: Value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|err| err.to_string()),
        DocumentFormat::Json => serde_json::from_str(text).map_err(|err| err.to_string()),
    }
    .map_err(|reason| GenError::MalformedCatalog {
        path: source.to_path_buf(),
        reason,
    })?;

    let is_empty = match &document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(GenError::EmptyCatalog {
            path: source.to_path_buf(),
        });
    }

    CatalogSchema::load()?.validate(&document, source)?;

    let sections = group_sections(document, source)?;

    let mut catalog = Catalog::new(domain);
    let mut seen: BTreeMap<String, Category> = BTreeMap::new();
    let mut registered: BTreeMap<String, Category> = BTreeMap::new();
    for (category, records) in sections {
        for record in records {
            let entry = validate_record(record, domain)?;
            let path = entry.registry_path(domain).to_string();
            if let Some(first) = seen.insert(path.clone(), category) {
                return Err(duplicate(path, first, category));
            }
            let block_path = entry.block_path(domain).to_string();
            if let Some(first) = registered.insert(block_path.clone(), category) {
                return Err(duplicate(block_path, first, category));
            }
            catalog.push(category, entry);
        }
    }

    if catalog.is_empty() {
        return Err(GenError::EmptyCatalog {
            path: source.to_path_buf(),
        });
    }

    log::debug!(
        "loaded {} entries from {}",
        catalog.len(),
        source.display()
    );
    Ok(catalog)
}

/// Split the document into per-category record lists.
///
/// Each category accepts a long and a short key; a document using both for
/// the same category is rejected rather than letting one section win.
fn group_sections(
    document: Value,
    source: &Path,
) -> GenResult<BTreeMap<Category, Vec<EntryRecord>>> {
    let malformed = |reason: String| GenError::MalformedCatalog {
        path: source.to_path_buf(),
        reason,
    };

    let sections: Map<String, Value> =
        serde_json::from_value(document).map_err(|err| malformed(err.to_string()))?;
    let mut keys: BTreeMap<Category, String> = BTreeMap::new();
    let mut grouped = BTreeMap::new();
    for (key, value) in sections {
        let category = Category::parse(&key)
            .ok_or_else(|| malformed(format!("unknown block category '{key}'")))?;
        if let Some(first) = keys.get(&category) {
            return Err(malformed(format!(
                "'{first}' and '{key}' both declare {category}"
            )));
        }
        let records: Option<Vec<EntryRecord>> = serde_json::from_value(value)
            .map_err(|err| malformed(format!("section '{key}': {err}")))?;
        keys.insert(category, key);
        grouped.insert(category, records.unwrap_or_default());
    }
    Ok(grouped)
}

fn duplicate(path: String, first: Category, second: Category) -> GenError {
    GenError::DuplicateRegistryPath {
        path,
        first: first.to_string(),
        second: second.to_string(),
    }
}

fn validate_record(record: EntryRecord, domain: &str) -> GenResult<Entry> {
    let block_pattern = match record.block_pattern.as_deref() {
        None => None,
        Some(raw) => Some(BlockPattern::parse(raw).ok_or_else(|| {
            GenError::UnknownBlockPattern {
                path: format!("/{domain}/{}/{}", record.header, record.func),
                pattern: raw.to_string(),
            }
        })?),
    };

    Ok(Entry {
        func: record.func,
        header: record.header,
        block_name: record.block_name,
        nice_name: record.nice_name,
        description: record.description,
        keywords: record.keywords,
        min_api_version: record.min_api_version,
        test_only: record.test_only,
        int_only: record.int_only,
        block_pattern,
        supported_types: record.supported_types,
        supported_input_types: record.supported_input_types,
        supported_output_types: record.supported_output_types,
        operator: record.operator,
        allow_zero_scalar: record.allow_zero_scalar.unwrap_or(true),
        allow_zero_in_buffer1: record.allow_zero_in_buffer1.unwrap_or(true),
        verify: record.verify,
    })
}
