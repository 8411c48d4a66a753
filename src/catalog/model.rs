//! Deserializable representation of a block catalog document.
//!
//! `EntryRecord` mirrors the on-disk shape (camelCase keys, everything
//! optional except `func`/`header`); the loader turns records into validated
//! [`Entry`] values grouped in a [`Catalog`]. Later stages map the catalog
//! into enriched entry types without touching the loaded values.

use crate::catalog::identity::{BlockPattern, Category, RegistryPath, TypeFamily};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which data-type families a block (or one side of it) supports.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct CapabilityFlags {
    #[serde(rename = "supportInt", default)]
    pub support_int: bool,
    #[serde(rename = "supportUInt", default)]
    pub support_uint: bool,
    #[serde(rename = "supportFloat", default)]
    pub support_float: bool,
    #[serde(rename = "supportComplexFloat", alias = "supportComplex", default)]
    pub support_complex_float: bool,
    #[serde(rename = "supportAll", default)]
    pub support_all: bool,
}

impl CapabilityFlags {
    /// Whether the family is enabled, either directly or through `supportAll`.
    pub fn supports(&self, family: TypeFamily) -> bool {
        self.support_all || self.declares(family)
    }

    /// Whether the family's own flag is set, ignoring `supportAll`.
    pub fn declares(&self, family: TypeFamily) -> bool {
        match family {
            TypeFamily::Int => self.support_int,
            TypeFamily::UInt => self.support_uint,
            TypeFamily::Float => self.support_float,
            TypeFamily::ComplexFloat => self.support_complex_float,
        }
    }

    /// Families whose own flag is set, in fixed declaration order.
    pub fn declared_families(&self) -> Vec<TypeFamily> {
        TypeFamily::ALL
            .into_iter()
            .filter(|family| self.declares(*family))
            .collect()
    }
}

/// One block definition exactly as written in the catalog.
#[derive(Clone, Debug, Deserialize)]
pub struct EntryRecord {
    pub func: String,
    pub header: String,
    #[serde(rename = "blockName", default)]
    pub block_name: Option<String>,
    #[serde(rename = "niceName", default)]
    pub nice_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(rename = "minAPIVersion", default)]
    pub min_api_version: u32,
    #[serde(rename = "testOnly", default)]
    pub test_only: bool,
    #[serde(rename = "intOnly", default)]
    pub int_only: bool,
    #[serde(rename = "blockPattern", alias = "pattern", default)]
    pub block_pattern: Option<String>,
    #[serde(rename = "supportedTypes", default)]
    pub supported_types: Option<CapabilityFlags>,
    #[serde(rename = "supportedInputTypes", default)]
    pub supported_input_types: Option<CapabilityFlags>,
    #[serde(rename = "supportedOutputTypes", default)]
    pub supported_output_types: Option<CapabilityFlags>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(rename = "allowZeroScalar", default)]
    pub allow_zero_scalar: Option<bool>,
    #[serde(rename = "allowZeroInBuffer1", default)]
    pub allow_zero_in_buffer1: Option<bool>,
    #[serde(default)]
    pub verify: Option<String>,
}

/// Validated block definition produced by the loader.
///
/// `block_name` is still optional here; defaulting it is the normalizer's job.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    pub func: String,
    pub header: String,
    pub block_name: Option<String>,
    pub nice_name: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub min_api_version: u32,
    pub test_only: bool,
    pub int_only: bool,
    pub block_pattern: Option<BlockPattern>,
    pub supported_types: Option<CapabilityFlags>,
    pub supported_input_types: Option<CapabilityFlags>,
    pub supported_output_types: Option<CapabilityFlags>,
    pub operator: Option<String>,
    pub allow_zero_scalar: bool,
    pub allow_zero_in_buffer1: bool,
    pub verify: Option<String>,
}

impl Entry {
    /// Documentation/registration path keyed by the wrapped function.
    pub fn registry_path(&self, domain: &str) -> RegistryPath {
        RegistryPath::new(domain, &self.header, &self.func)
    }

    /// Path the factory registers, keyed by `blockName` or else `func`.
    pub fn block_path(&self, domain: &str) -> RegistryPath {
        let name = self.block_name.as_deref().unwrap_or(&self.func);
        RegistryPath::new(domain, &self.header, name)
    }
}

/// Catalog entries grouped by category, order preserved within each group.
///
/// Every category is present, possibly empty, so stages can bind all of them
/// without special-casing sections missing from the document.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog<E = Entry> {
    domain: String,
    categories: BTreeMap<Category, Vec<E>>,
}

impl<E> Catalog<E> {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            categories: Category::ALL.into_iter().map(|c| (c, Vec::new())).collect(),
        }
    }

    /// First component of every registry path built from this catalog.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn push(&mut self, category: Category, entry: E) {
        self.categories.entry(category).or_default().push(entry);
    }

    pub fn entries(&self, category: Category) -> &[E] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Categories in declaration order with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[E])> {
        self.categories
            .iter()
            .map(|(category, entries)| (*category, entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a new catalog by transforming every entry, keeping order.
    pub fn try_map<F, T, Err>(&self, mut f: F) -> Result<Catalog<T>, Err>
    where
        F: FnMut(Category, &E) -> Result<T, Err>,
    {
        let mut mapped = Catalog::new(self.domain.clone());
        for (category, entries) in self.iter() {
            for entry in entries {
                mapped.push(category, f(category, entry)?);
            }
        }
        Ok(mapped)
    }

    pub fn map<F, T>(&self, mut f: F) -> Catalog<T>
    where
        F: FnMut(Category, &E) -> T,
    {
        let mut mapped = Catalog::new(self.domain.clone());
        for (category, entries) in self.iter() {
            for entry in entries {
                mapped.push(category, f(category, entry));
            }
        }
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_flags_read_camel_case_and_aliases() {
        let flags: CapabilityFlags =
            serde_json::from_str(r#"{"supportUInt": true, "supportComplex": true}"#).unwrap();
        assert!(flags.support_uint);
        assert!(flags.support_complex_float);
        assert!(!flags.support_int);
        assert_eq!(
            flags.declared_families(),
            vec![TypeFamily::UInt, TypeFamily::ComplexFloat]
        );
    }

    #[test]
    fn support_all_enables_every_family_without_declaring_it() {
        let flags = CapabilityFlags {
            support_all: true,
            ..Default::default()
        };
        assert!(TypeFamily::ALL.iter().all(|f| flags.supports(*f)));
        assert!(flags.declared_families().is_empty());
    }

    #[test]
    fn entry_record_defaults() {
        let record: EntryRecord =
            serde_json::from_str(r#"{"func": "abs", "header": "arith"}"#).unwrap();
        assert_eq!(record.min_api_version, 0);
        assert!(!record.test_only);
        assert!(record.block_name.is_none());
        assert!(record.keywords.is_empty());

        let with_pattern: EntryRecord = serde_json::from_str(
            r#"{"func": "arg", "header": "arith", "pattern": "ComplexToFloat", "minAPIVersion": 34}"#,
        )
        .unwrap();
        assert_eq!(with_pattern.block_pattern.as_deref(), Some("ComplexToFloat"));
        assert_eq!(with_pattern.min_api_version, 34);
    }

    #[test]
    fn catalog_map_preserves_order_and_domain() {
        let mut catalog: Catalog<u32> = Catalog::new("arrayfire");
        catalog.push(Category::TwoToOne, 3);
        catalog.push(Category::OneToOne, 1);
        catalog.push(Category::OneToOne, 2);

        let doubled = catalog.map(|_, value| value * 2);
        assert_eq!(doubled.domain(), "arrayfire");
        assert_eq!(doubled.entries(Category::OneToOne), &[2, 4]);
        assert_eq!(doubled.entries(Category::TwoToOne), &[6]);
        assert!(doubled.entries(Category::ScalarOp).is_empty());
        assert_eq!(doubled.len(), 3);

        let order: Vec<Category> = doubled.iter().map(|(c, _)| c).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }
}
