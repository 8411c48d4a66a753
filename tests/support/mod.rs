use anyhow::{Context, Result};
use blockgen::{
    ApiVersion, GenError, GenerationReport, Generator, GeneratorConfig, find_generator_root,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn generator_root() -> PathBuf {
    find_generator_root().expect("tests require the generator root")
}

pub fn shipped_catalog() -> PathBuf {
    generator_root().join("blocks").join("Blocks.yaml")
}

pub fn version(text: &str) -> ApiVersion {
    text.parse().expect("fixture version")
}

/// Write catalog text next to a fresh output directory.
pub fn write_catalog(dir: &Path, name: &str, text: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Config writing into `<temp>/out` with skip notices suppressed.
pub fn quiet_config(temp: &TempDir, catalog: &Path, target: &str) -> GeneratorConfig {
    GeneratorConfig::new(temp.path().join("out"), version(target))
        .with_catalog(catalog)
        .with_diagnostics(false)
}

pub fn generate(catalog: &Path, target: &str) -> Result<(TempDir, GenerationReport)> {
    let temp = TempDir::new()?;
    let report = Generator::builtin().run(&quiet_config(&temp, catalog, target))?;
    Ok((temp, report))
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("reading {}: {err}", path.display()))
}

/// Everything after the timestamp line of a generated file.
pub fn body_after_timestamp(text: &str) -> &str {
    let marker = text
        .find(blockgen::output::TIMESTAMP_MARKER)
        .expect("generated file carries a timestamp");
    let line_end = text[marker..].find('\n').expect("timestamp line ends");
    &text[marker + line_end + 1..]
}

/// Paths registered in the factory table.
pub fn registered_paths(factory: &str) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    let mut lines = factory.lines();
    while let Some(line) = lines.next() {
        if line.trim() == "Pothos::BlockRegistry(" {
            if let Some(path) = lines.next() {
                paths.insert(unquote(path));
            }
        }
    }
    paths
}

/// Paths exercised by `testOneToOneBlock` calls.
pub fn tested_paths(tests: &str) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    let mut lines = tests.lines();
    while let Some(line) = lines.next() {
        if line.trim().starts_with("testOneToOneBlock<T>(") {
            if let Some(path) = lines.next() {
                paths.insert(unquote(path));
            }
        }
    }
    paths
}

fn unquote(line: &str) -> String {
    line.trim().trim_end_matches(',').trim_matches('"').to_string()
}

/// First [`GenError`] in an error chain.
pub fn gen_error(err: &anyhow::Error) -> Option<&GenError> {
    err.chain().find_map(|cause| cause.downcast_ref::<GenError>())
}

pub fn is_empty_or_missing(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
