//! Entry Normalizer: fills derived names and the comment-formatted description.
//!
//! Normalization builds a new [`NormalizedEntry`] around the loaded entry
//! rather than rewriting it, so the raw description stays available for
//! documentation and the comment prefix can only ever be applied once.

use crate::catalog::{Catalog, Entry, RegistryPath};
use serde::Serialize;

/// Prefix that turns a description into a line of a `/* ... */` block.
pub const COMMENT_PREFIX: &str = " * ";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedEntry {
    pub entry: Entry,
    /// Registry node name; `func` unless the catalog overrides it.
    pub block_name: String,
    /// Display name; title-cased `func` unless the catalog overrides it.
    pub nice_name: String,
    pub description_comment: Option<String>,
    /// `/<domain>/<header>/<func>`, used for documentation and uniqueness.
    pub doc_path: RegistryPath,
    /// `/<domain>/<header>/<blockName>`, used for factory registration.
    pub block_path: RegistryPath,
}

impl NormalizedEntry {
    pub fn from_entry(entry: &Entry, domain: &str) -> Self {
        let block_name = entry
            .block_name
            .clone()
            .unwrap_or_else(|| entry.func.clone());
        let nice_name = entry
            .nice_name
            .clone()
            .unwrap_or_else(|| title_case(&entry.func));
        let description_comment = entry
            .description
            .as_deref()
            .map(|desc| format!("{COMMENT_PREFIX}{desc}"));
        Self {
            doc_path: entry.registry_path(domain),
            block_path: entry.block_path(domain),
            entry: entry.clone(),
            block_name,
            nice_name,
            description_comment,
        }
    }
}

/// Normalize every entry of a loaded catalog.
pub fn normalize_catalog(catalog: &Catalog) -> Catalog<NormalizedEntry> {
    let domain = catalog.domain().to_string();
    catalog.map(|_, entry| NormalizedEntry::from_entry(entry, &domain))
}

/// Uppercase the first letter of every alphabetic run and lowercase the rest.
///
/// Digits and underscores start a new run, so `atan2` → `Atan2`,
/// `is_nan` → `Is_Nan`, `a1b` → `A1B`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_alpha = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(ch);
            previous_alpha = false;
        }
    }
    out
}
