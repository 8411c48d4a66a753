//! Block catalog wiring.
//!
//! This module wraps the catalog document under `blocks/Blocks.yaml` so the
//! pipeline can load a validated snapshot grouped by block category. Types
//! here mirror the document fields; later stages map [`Catalog`] into their
//! own enriched entry types instead of mutating the loaded entries.

pub mod identity;
pub mod loader;
pub mod model;

pub use identity::{BlockPattern, Category, RegistryPath, TypeFamily};
pub use loader::{DocumentFormat, load_catalog_from_path, parse_catalog};
pub use model::{CapabilityFlags, Catalog, Entry, EntryRecord};
