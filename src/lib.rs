//! Build-time generator for block factory and execution test sources.
//!
//! A declarative catalog (`blocks/Blocks.yaml`) describes every auto-generated
//! block. The crate loads it, derives names and type-support metadata, filters
//! entries by a target API version and renders two dependent source units: the
//! factory registrations and the execution tests that exercise them. Both
//! units are produced from the same enriched catalog, so registrations and
//! tests agree on paths, type sets and categories.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod catalog;
pub mod docs;
pub mod dtype;
pub mod error;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod render;
mod schema_loader;
pub mod version;

pub use catalog::{
    BlockPattern, CapabilityFlags, Catalog, Category, DocumentFormat, Entry, RegistryPath,
    TypeFamily, load_catalog_from_path, parse_catalog,
};
pub use docs::{BlockDoc, WrappedLibrary, build_registration_statements, escape_literal};
pub use dtype::{EnrichedEntry, TypeSupport, encode_catalog};
pub use error::{GenError, GenResult};
pub use normalize::{NormalizedEntry, normalize_catalog};
pub use pipeline::{GenerationReport, Generator, GeneratorConfig};
pub use render::{
    ExecutionTestTemplate, FactoryContext, FactoryTemplate, RenderFailurePolicy, RenderOutcome,
    Renderer, Template, TestContext,
};
pub use version::{ApiVersion, SkipNotice, filter_entries, write_skip_notices};

const CATALOG_SENTINEL: &str = "blocks/Blocks.yaml";
const MANIFEST: &str = "Cargo.toml";

/// Returns true when `candidate` holds the shipped catalog next to a manifest.
fn is_generator_root(candidate: &Path) -> bool {
    candidate.join(CATALOG_SENTINEL).is_file() && candidate.join(MANIFEST).is_file()
}

fn root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !is_generator_root(&hint_path) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_generator_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Locate the directory holding the shipped catalog.
///
/// Climbs from the running executable first (covers `target/<profile>/`),
/// then falls back to the root recorded by `build.rs`.
pub fn find_generator_root() -> Result<PathBuf> {
    if let Some(root) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(search_upwards))
    {
        return Ok(root);
    }

    if let Some(root) = option_env!("BLOCKGEN_ROOT_HINT").and_then(root_from_hint) {
        return Ok(root);
    }

    bail!("Unable to locate the generator root (no {CATALOG_SENTINEL} above the executable)")
}
