//! One generation run: load → normalize → encode → bind → render → write.
//!
//! Every fallible step before writing runs to completion first, so a run that
//! fails on the catalog, a capability record or a fatal render leaves the
//! output directory untouched.

use crate::catalog::load_catalog_from_path;
use crate::docs::WrappedLibrary;
use crate::dtype::encode_catalog;
use crate::find_generator_root;
use crate::normalize::normalize_catalog;
use crate::output::{
    EXECUTION_TEST_STEM, FACTORY_STEM, FileHeader, artifact_name, write_artifact,
};
use crate::render::{
    ExecutionTestTemplate, FactoryContext, FactoryTemplate, RenderFailurePolicy, RenderOutcome,
    Renderer, Template, TestContext,
};
use crate::version::{ApiVersion, SkipNotice, write_skip_notices};
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

/// Catalog location relative to the generator root.
pub const DEFAULT_CATALOG: &str = "blocks/Blocks.yaml";

/// Settings for one generation run.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub output_dir: PathBuf,
    pub target_version: ApiVersion,
    /// `None` means `<generator root>/blocks/Blocks.yaml`.
    pub catalog_path: Option<PathBuf>,
    pub registry_domain: String,
    pub file_extension: String,
    pub copyright_holder: String,
    pub copyright_start_year: i32,
    pub render_failure: RenderFailurePolicy,
    pub library: WrappedLibrary,
    /// Report skip notices once the execution test unit is bound.
    pub diagnostics: bool,
}

impl GeneratorConfig {
    pub fn new(output_dir: impl Into<PathBuf>, target_version: ApiVersion) -> Self {
        Self {
            output_dir: output_dir.into(),
            target_version,
            catalog_path: None,
            registry_domain: "arrayfire".to_string(),
            file_extension: "cpp".to_string(),
            copyright_holder: "Nicholas Corgan".to_string(),
            copyright_start_year: 2019,
            render_failure: RenderFailurePolicy::default(),
            library: WrappedLibrary::default(),
            diagnostics: true,
        }
    }

    pub fn with_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_registry_domain(mut self, domain: impl Into<String>) -> Self {
        self.registry_domain = domain.into();
        self
    }

    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    pub fn with_copyright(mut self, holder: impl Into<String>, start_year: i32) -> Self {
        self.copyright_holder = holder.into();
        self.copyright_start_year = start_year;
        self
    }

    pub fn with_render_failure(mut self, policy: RenderFailurePolicy) -> Self {
        self.render_failure = policy;
        self
    }

    pub fn with_library(mut self, library: WrappedLibrary) -> Self {
        self.library = library;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn resolve_catalog_path(&self) -> Result<PathBuf> {
        match &self.catalog_path {
            Some(path) => Ok(path.clone()),
            None => Ok(find_generator_root()?.join(DEFAULT_CATALOG)),
        }
    }
}

/// What a run produced.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub factory_path: PathBuf,
    pub test_path: PathBuf,
    /// Blocks bound into the factory unit.
    pub registered: usize,
    /// Blocks bound into the execution test unit.
    pub tested: usize,
    pub skipped: Vec<SkipNotice>,
    /// Templates that failed under the lenient policy.
    pub degraded: Vec<String>,
}

pub struct Generator<F, T> {
    renderer: Renderer<F, T>,
}

impl Generator<FactoryTemplate, ExecutionTestTemplate> {
    pub fn builtin() -> Self {
        Self::new(Renderer::builtin())
    }
}

impl<F, T> Generator<F, T>
where
    F: Template<FactoryContext>,
    T: Template<TestContext>,
{
    pub fn new(renderer: Renderer<F, T>) -> Self {
        Self { renderer }
    }

    /// Run with skip notices going to stdout.
    pub fn run(&self, config: &GeneratorConfig) -> Result<GenerationReport> {
        self.run_with_notices(config, &mut io::stdout().lock())
    }

    /// Run, writing one skip notice per line to `notices` when
    /// `config.diagnostics` is set.
    pub fn run_with_notices<W: Write>(
        &self,
        config: &GeneratorConfig,
        notices: &mut W,
    ) -> Result<GenerationReport> {
        let catalog_path = config.resolve_catalog_path()?;
        let catalog = load_catalog_from_path(&catalog_path, &config.registry_domain)
            .with_context(|| format!("loading {}", catalog_path.display()))?;
        let enriched = encode_catalog(&normalize_catalog(&catalog)).with_context(|| {
            format!("encoding type support from {}", catalog_path.display())
        })?;

        let target = config.target_version;
        let factory = FactoryContext::bind(&enriched, target, config.library.clone())?;
        let tests = TestContext::bind(&enriched, target);
        if config.diagnostics {
            write_skip_notices(&tests.skipped, notices)
                .and_then(|()| notices.flush())
                .context("reporting skipped entries")?;
        }

        let mut degraded = Vec::new();
        let factory_body = resolve(
            config.render_failure,
            self.renderer.render_factory(&factory),
            &mut degraded,
        )?;
        let test_body = resolve(
            config.render_failure,
            self.renderer.render_tests(&tests),
            &mut degraded,
        )?;

        let header = FileHeader::now(&config.copyright_holder, config.copyright_start_year);
        let factory_path = emit(config, FACTORY_STEM, &header.prepend(&factory_body))?;
        let test_path = emit(config, EXECUTION_TEST_STEM, &header.prepend(&test_body))?;

        Ok(GenerationReport {
            factory_path,
            test_path,
            registered: factory.blocks.len(),
            tested: tests.blocks.len(),
            skipped: tests.skipped,
            degraded,
        })
    }
}

fn resolve(
    policy: RenderFailurePolicy,
    outcome: RenderOutcome,
    degraded: &mut Vec<String>,
) -> Result<String> {
    if let RenderOutcome::Failed { template, .. } = &outcome {
        degraded.push(template.clone());
    }
    Ok(policy.resolve(outcome)?)
}

fn emit(config: &GeneratorConfig, stem: &str, contents: &str) -> Result<PathBuf> {
    let name = artifact_name(stem, &config.file_extension);
    let path = write_artifact(&config.output_dir, &name, contents)
        .with_context(|| format!("writing {name}"))?;
    Ok(path)
}
