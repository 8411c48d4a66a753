//! Documentation Descriptor Builder.
//!
//! Each non-test entry gets a JSON metadata record (display name, path,
//! category, keywords, docs, parameter descriptors) that the generated
//! factory registers verbatim under `/blocks/docs<path>`. The JSON is embedded
//! in a C++ string literal, so every byte is hex-escaped.

use crate::catalog::{Category, TypeFamily};
use crate::dtype::{DIM_KEY, EnrichedEntry};
use crate::error::GenResult;
use crate::normalize::title_case;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt::Write;

/// The library whose functions the generated blocks wrap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WrappedLibrary {
    /// Human-readable name used in docs and block categories.
    pub display_name: String,
    /// C++ namespace the wrapped functions live in.
    pub namespace: String,
}

impl Default for WrappedLibrary {
    fn default() -> Self {
        Self {
            display_name: "ArrayFire".to_string(),
            namespace: "af".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockDoc {
    pub name: String,
    pub path: String,
    pub categories: Vec<String>,
    pub keywords: IndexSet<String>,
    pub docs: Vec<String>,
    pub params: Vec<ParamDoc>,
    pub args: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamDoc {
    pub key: &'static str,
    pub name: &'static str,
    pub desc: Vec<String>,
    #[serde(rename = "widgetType", skip_serializing_if = "Option::is_none")]
    pub widget_type: Option<&'static str>,
    pub preview: &'static str,
    pub default: String,
    #[serde(rename = "widgetKwargs", skip_serializing_if = "Option::is_none")]
    pub widget_kwargs: Option<IndexMap<&'static str, u8>>,
}

impl BlockDoc {
    /// Build the record for an entry, or `None` for test-only entries.
    pub fn build(
        category: Category,
        entry: &EnrichedEntry,
        library: &WrappedLibrary,
    ) -> Option<Self> {
        if entry.is_test_only() {
            return None;
        }
        let normalized = &entry.normalized;
        let raw = &normalized.entry;

        let mut keywords: IndexSet<String> = IndexSet::new();
        keywords.insert(raw.header.clone());
        keywords.insert(raw.func.clone());
        keywords.extend(raw.keywords.iter().cloned());

        let mut docs: Vec<String> = raw.description.iter().cloned().collect();
        docs.push(format!(
            "<p>Corresponding {} function: <b>{}::{}</b></p>",
            library.display_name, library.namespace, raw.func
        ));

        let mut params = vec![device_param(library), dtype_param(entry)];
        match category {
            Category::ScalarOp => params.push(ParamDoc {
                key: "scalar",
                name: "Scalar",
                desc: vec!["The scalar value to apply to all inputs.".to_string()],
                widget_type: None,
                preview: "enable",
                default: if raw.allow_zero_scalar { "0" } else { "1" }.to_string(),
                widget_kwargs: None,
            }),
            Category::NToOne => params.push(ParamDoc {
                key: "numInputs",
                name: "Num Inputs",
                desc: vec!["The number of inputs for this block.".to_string()],
                widget_type: None,
                preview: "disable",
                default: "2".to_string(),
                widget_kwargs: None,
            }),
            _ => {}
        }

        Some(Self {
            name: normalized.nice_name.clone(),
            path: normalized.doc_path.to_string(),
            categories: vec![format!(
                "/{}/{}",
                library.display_name,
                title_case(&raw.header)
            )],
            keywords,
            docs,
            params,
            args: vec!["device", "dtype"],
        })
    }

    /// `Pothos::PluginRegistry::add(...)` statement carrying this record.
    pub fn registration_statement(&self) -> GenResult<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!(
            "Pothos::PluginRegistry::add(\"/blocks/docs{}\", std::string(\"{}\"));",
            self.path,
            escape_literal(json.as_bytes())
        ))
    }
}

fn device_param(library: &WrappedLibrary) -> ParamDoc {
    ParamDoc {
        key: "device",
        name: "Device",
        desc: vec![format!("{} device", library.display_name)],
        widget_type: None,
        preview: "enable",
        default: "\"Auto\"".to_string(),
        widget_kwargs: None,
    }
}

fn dtype_param(entry: &EnrichedEntry) -> ParamDoc {
    let raw = &entry.normalized.entry;
    let mut kwargs: IndexMap<&'static str, u8> = IndexMap::new();
    if raw.block_pattern.is_some() {
        // Both patterns pick the float width; the complex side follows from it.
        kwargs.insert("float", 1);
    } else if raw.int_only {
        for family in [TypeFamily::Int, TypeFamily::UInt] {
            kwargs.extend(family.widget_keys().iter().map(|key| (*key, 1)));
        }
    } else if let Some(support) = &entry.types.supported {
        for family in TypeFamily::ALL {
            if support.supports(family) {
                kwargs.extend(family.widget_keys().iter().map(|key| (*key, 1)));
            }
        }
        kwargs.insert(DIM_KEY, 1);
    }

    ParamDoc {
        key: "dtype",
        name: "Data Type",
        desc: vec!["Block data type".to_string()],
        widget_type: Some("DTypeChooser"),
        preview: "disable",
        default: if raw.int_only { "\"int32\"" } else { "\"float64\"" }.to_string(),
        widget_kwargs: Some(kwargs),
    }
}

/// Escape every byte as a two-digit `\xHH` sequence for a C++ string literal.
pub fn escape_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for byte in bytes {
        let _ = write!(out, "\\x{byte:02x}");
    }
    out
}

/// Registration statements for every non-test entry, categories in order.
pub fn build_registration_statements(
    catalog: &crate::catalog::Catalog<EnrichedEntry>,
    library: &WrappedLibrary,
) -> GenResult<Vec<String>> {
    let mut statements = Vec::new();
    for (category, entries) in catalog.iter() {
        for entry in entries {
            if let Some(doc) = BlockDoc::build(category, entry, library) {
                statements.push(doc.registration_statement()?);
            }
        }
    }
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DocumentFormat, parse_catalog};
    use crate::dtype::encode_catalog;
    use crate::normalize::normalize_catalog;
    use serde_json::Value;
    use std::path::Path;

    fn enriched(text: &str) -> crate::catalog::Catalog<EnrichedEntry> {
        let catalog =
            parse_catalog(text, DocumentFormat::Yaml, Path::new("inline.yaml"), "arrayfire")
                .expect("fixture catalog");
        encode_catalog(&normalize_catalog(&catalog)).expect("encodable")
    }

    fn unescape(literal: &str) -> String {
        let bytes: Vec<u8> = literal
            .split("\\x")
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| u8::from_str_radix(chunk, 16).unwrap())
            .collect();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn escape_literal_is_fixed_width_hex() {
        assert_eq!(escape_literal(b"A\n"), "\\x41\\x0a");
        assert_eq!(escape_literal("é".as_bytes()), "\\xc3\\xa9");
        assert_eq!(escape_literal(b""), "");
    }

    #[test]
    fn doc_record_for_one_to_one_entry() {
        let catalog = enriched(
            r#"
OneToOneBlocks:
  - func: abs
    header: arith
    description: Absolute value.
    keywords: [magnitude, abs]
    supportedTypes:
      supportInt: true
      supportFloat: true
"#,
        );
        let entry = &catalog.entries(Category::OneToOne)[0];
        let doc = BlockDoc::build(Category::OneToOne, entry, &WrappedLibrary::default()).unwrap();

        assert_eq!(doc.name, "Abs");
        assert_eq!(doc.path, "/arrayfire/arith/abs");
        assert_eq!(doc.categories, ["/ArrayFire/Arith"]);
        assert_eq!(
            doc.keywords.iter().collect::<Vec<_>>(),
            ["arith", "abs", "magnitude"]
        );
        assert_eq!(doc.docs[0], "Absolute value.");
        assert_eq!(
            doc.docs[1],
            "<p>Corresponding ArrayFire function: <b>af::abs</b></p>"
        );
        assert_eq!(doc.params.len(), 2);
        let kwargs = doc.params[1].widget_kwargs.as_ref().unwrap();
        assert_eq!(
            kwargs.keys().copied().collect::<Vec<_>>(),
            ["int16", "int32", "int64", "float", "dim"]
        );
        assert_eq!(doc.params[1].default, "\"float64\"");
    }

    #[test]
    fn block_pattern_and_int_only_constrain_the_widget() {
        let catalog = enriched(
            r#"
OneToOneBlocks:
  - func: arg
    header: arith
    blockPattern: ComplexToFloat
  - func: bitnot
    header: bitwise
    intOnly: true
  - func: sigmoid
    header: arith
"#,
        );
        let library = WrappedLibrary::default();
        let entries = catalog.entries(Category::OneToOne);

        let pattern = BlockDoc::build(Category::OneToOne, &entries[0], &library).unwrap();
        let kwargs = pattern.params[1].widget_kwargs.clone().unwrap();
        assert_eq!(kwargs.into_iter().collect::<Vec<_>>(), [("float", 1)]);

        let int_only = BlockDoc::build(Category::OneToOne, &entries[1], &library).unwrap();
        let kwargs = int_only.params[1].widget_kwargs.clone().unwrap();
        assert_eq!(
            kwargs.keys().copied().collect::<Vec<_>>(),
            ["int16", "int32", "int64", "uint"]
        );
        assert_eq!(int_only.params[1].default, "\"int32\"");

        let unconstrained = BlockDoc::build(Category::OneToOne, &entries[2], &library).unwrap();
        assert!(unconstrained.params[1].widget_kwargs.as_ref().unwrap().is_empty());
    }

    #[test]
    fn category_specific_parameters() {
        let catalog = enriched(
            r#"
ScalarOpBlocks:
  - func: mulscalar
    header: scalar
    operator: "*"
    allowZeroScalar: false
NToOneBlocks:
  - func: addn
    header: arith
    operator: "+"
"#,
        );
        let library = WrappedLibrary::default();
        let scalar = BlockDoc::build(
            Category::ScalarOp,
            &catalog.entries(Category::ScalarOp)[0],
            &library,
        )
        .unwrap();
        assert_eq!(scalar.params[2].key, "scalar");
        assert_eq!(scalar.params[2].default, "1");

        let n_to_one =
            BlockDoc::build(Category::NToOne, &catalog.entries(Category::NToOne)[0], &library)
                .unwrap();
        assert_eq!(n_to_one.params[2].key, "numInputs");
        assert_eq!(n_to_one.params[2].default, "2");
    }

    #[test]
    fn test_only_entries_have_no_docs() {
        let catalog = enriched(
            r#"
OneToOneBlocks:
  - func: abs
    header: arith
  - func: rsqrt
    header: arith
    testOnly: true
"#,
        );
        let statements =
            build_registration_statements(&catalog, &WrappedLibrary::default()).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with(
            "Pothos::PluginRegistry::add(\"/blocks/docs/arrayfire/arith/abs\", std::string(\""
        ));
    }

    #[test]
    fn registration_statement_round_trips_to_json() {
        let catalog = enriched("OneToOneBlocks:\n  - func: abs\n    header: arith\n");
        let statements =
            build_registration_statements(&catalog, &WrappedLibrary::default()).unwrap();
        let literal = statements[0]
            .split("std::string(\"")
            .nth(1)
            .and_then(|rest| rest.strip_suffix("\"));"))
            .unwrap();
        let value: Value = serde_json::from_str(&unescape(literal)).unwrap();
        assert_eq!(value["path"], "/arrayfire/arith/abs");
        assert_eq!(value["args"], serde_json::json!(["device", "dtype"]));
        assert_eq!(value["params"][0]["default"], "\"Auto\"");
    }
}
