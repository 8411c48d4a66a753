//! Type-Support Encoder.
//!
//! Expands capability flags into the `DTypeChooser` argument string and the
//! default data type the generated factory uses. The default-type tie-break
//! (float wins unless complex is also declared, otherwise the first declared
//! family) drives downstream type dispatch and must not drift.

use crate::catalog::{CapabilityFlags, Catalog, TypeFamily};
use crate::error::{GenError, GenResult};
use crate::normalize::NormalizedEntry;
use crate::version::VersionGated;
use serde::Serialize;

/// Widget keyword for the dimension selector.
pub const DIM_KEY: &str = "dim";
/// Trailing dimension token appended to every non-empty dtype string.
pub const DIM_TOKEN: &str = "dim=1";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeSupport {
    pub flags: CapabilityFlags,
    /// Comma-joined `key=1` tokens; empty when no family is declared.
    pub dtype_string: String,
    /// 64-bit default type, absent exactly when `dtype_string` is empty.
    pub default_type: Option<&'static str>,
}

impl TypeSupport {
    pub fn encode(flags: &CapabilityFlags) -> Self {
        if flags.support_all {
            let mut tokens: Vec<String> =
                TypeFamily::ALL.iter().map(|f| f.widget_token()).collect();
            tokens.push(DIM_TOKEN.to_string());
            return Self {
                flags: flags.clone(),
                dtype_string: tokens.join(","),
                default_type: Some(TypeFamily::Float.default_type()),
            };
        }

        let families = flags.declared_families();
        let Some(first) = families.first() else {
            return Self {
                flags: flags.clone(),
                dtype_string: String::new(),
                default_type: None,
            };
        };

        let mut tokens: Vec<String> = families.iter().map(|f| f.widget_token()).collect();
        tokens.push(DIM_TOKEN.to_string());

        let default_type = if flags.declares(TypeFamily::Float)
            && !flags.declares(TypeFamily::ComplexFloat)
        {
            TypeFamily::Float.default_type()
        } else {
            first.default_type()
        };

        Self {
            flags: flags.clone(),
            dtype_string: tokens.join(","),
            default_type: Some(default_type),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.dtype_string.is_empty()
    }

    pub fn supports(&self, family: TypeFamily) -> bool {
        self.flags.supports(family)
    }
}

/// Encoded form of each capability record an entry declares.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EncodedTypes {
    pub supported: Option<TypeSupport>,
    pub input: Option<TypeSupport>,
    pub output: Option<TypeSupport>,
}

/// Normalized entry plus its encoded type support; what templates consume.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichedEntry {
    #[serde(flatten)]
    pub normalized: NormalizedEntry,
    pub types: EncodedTypes,
}

impl EnrichedEntry {
    pub fn func(&self) -> &str {
        &self.normalized.entry.func
    }

    pub fn is_test_only(&self) -> bool {
        self.normalized.entry.test_only
    }
}

impl VersionGated for EnrichedEntry {
    fn min_api_version(&self) -> u32 {
        self.normalized.min_api_version()
    }

    fn gate_path(&self) -> &crate::catalog::RegistryPath {
        self.normalized.gate_path()
    }
}

/// Encode every capability record of an entry.
///
/// A record that enables no family would render an empty type chooser, so it
/// is rejected here with [`GenError::EmptyTypeSupport`].
pub fn encode_entry(entry: &NormalizedEntry) -> GenResult<EnrichedEntry> {
    let encode = |flags: Option<&CapabilityFlags>,
                  field: &'static str|
     -> GenResult<Option<TypeSupport>> {
        let Some(flags) = flags else {
            return Ok(None);
        };
        let support = TypeSupport::encode(flags);
        if support.is_degenerate() {
            return Err(GenError::EmptyTypeSupport {
                path: entry.doc_path.to_string(),
                field,
            });
        }
        Ok(Some(support))
    };

    let types = EncodedTypes {
        supported: encode(entry.entry.supported_types.as_ref(), "supportedTypes")?,
        input: encode(entry.entry.supported_input_types.as_ref(), "supportedInputTypes")?,
        output: encode(entry.entry.supported_output_types.as_ref(), "supportedOutputTypes")?,
    };
    Ok(EnrichedEntry {
        normalized: entry.clone(),
        types,
    })
}

pub fn encode_catalog(catalog: &Catalog<NormalizedEntry>) -> GenResult<Catalog<EnrichedEntry>> {
    catalog.try_map(|_, entry| encode_entry(entry))
}
