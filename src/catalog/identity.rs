//! Category, registry path, block pattern and type-family identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Block-shape class an entry is declared under.
///
/// Declaration order is the order categories are walked when building
/// rendering contexts, so the derived `Ord` is load-bearing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Category {
    OneToOne,
    TwoToOne,
    NToOne,
    ScalarOp,
    SingleOutputSource,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::OneToOne,
        Category::TwoToOne,
        Category::NToOne,
        Category::ScalarOp,
        Category::SingleOutputSource,
    ];

    /// Key used in catalog documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::OneToOne => "OneToOneBlocks",
            Category::TwoToOne => "TwoToOneBlocks",
            Category::NToOne => "NToOneBlocks",
            Category::ScalarOp => "ScalarOpBlocks",
            Category::SingleOutputSource => "SingleOutputSources",
        }
    }

    /// Accepts both the document keys and the bare shape names.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OneToOneBlocks" | "OneToOne" => Some(Category::OneToOne),
            "TwoToOneBlocks" | "TwoToOne" => Some(Category::TwoToOne),
            "NToOneBlocks" | "NToOne" => Some(Category::NToOne),
            "ScalarOpBlocks" | "ScalarOp" => Some(Category::ScalarOp),
            "SingleOutputSources" | "SingleOutputSource" => Some(Category::SingleOutputSource),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown block category '{value}'")))
    }
}

/// Registry location of a block: `/<domain>/<header>/<name>`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RegistryPath {
    pub domain: String,
    pub header: String,
    pub name: String,
}

impl RegistryPath {
    pub fn new(domain: &str, header: &str, name: &str) -> Self {
        Self {
            domain: domain.to_string(),
            header: header.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.domain, self.header, self.name)
    }
}

impl Serialize for RegistryPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Overrides the data-type widget for blocks that convert between float and
/// complex domains.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum BlockPattern {
    FloatToComplex,
    ComplexToFloat,
}

impl BlockPattern {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FloatToComplex" => Some(BlockPattern::FloatToComplex),
            "ComplexToFloat" => Some(BlockPattern::ComplexToFloat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockPattern::FloatToComplex => "FloatToComplex",
            BlockPattern::ComplexToFloat => "ComplexToFloat",
        }
    }
}

/// Data-type family a capability flag enables.
///
/// Declaration order is the fixed token order of encoded dtype strings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum TypeFamily {
    Int,
    UInt,
    Float,
    ComplexFloat,
}

impl TypeFamily {
    pub const ALL: [TypeFamily; 4] = [
        TypeFamily::Int,
        TypeFamily::UInt,
        TypeFamily::Float,
        TypeFamily::ComplexFloat,
    ];

    /// DTypeChooser keyword arguments enabled by this family.
    pub fn widget_keys(&self) -> &'static [&'static str] {
        match self {
            TypeFamily::Int => &["int16", "int32", "int64"],
            TypeFamily::UInt => &["uint"],
            TypeFamily::Float => &["float"],
            TypeFamily::ComplexFloat => &["cfloat"],
        }
    }

    /// Comma-joined `key=1` token for dtype strings.
    pub fn widget_token(&self) -> String {
        self.widget_keys()
            .iter()
            .map(|key| format!("{key}=1"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The 64-bit type name used as a block default.
    pub fn default_type(&self) -> &'static str {
        match self {
            TypeFamily::Int => "int64",
            TypeFamily::UInt => "uint64",
            TypeFamily::Float => "float64",
            TypeFamily::ComplexFloat => "complex_float64",
        }
    }

    /// Suffix of the catalog flag (`support<suffix>`) and the short code used
    /// for conditional compilation dispatch.
    pub fn code(&self) -> &'static str {
        match self {
            TypeFamily::Int => "Int",
            TypeFamily::UInt => "UInt",
            TypeFamily::Float => "Float",
            TypeFamily::ComplexFloat => "ComplexFloat",
        }
    }

    /// Type-classification name used by the `EnableIf<Class>` helpers.
    pub fn classification(&self) -> &'static str {
        match self {
            TypeFamily::Int => "Integer",
            TypeFamily::UInt => "UnsignedInt",
            TypeFamily::Float => "Float",
            TypeFamily::ComplexFloat => "Complex",
        }
    }
}
