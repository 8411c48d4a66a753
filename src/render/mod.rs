//! Template Renderer.
//!
//! Binds the enriched catalog into two independent contexts (factory and
//! execution test) and renders them through caller-supplied [`Template`]
//! values. Templates are plain values handed to [`Renderer::new`]; nothing is
//! cached in process-wide state.
//!
//! Rendering never panics or prints on its own: every call yields a
//! [`RenderOutcome`] and the caller decides, through [`RenderFailurePolicy`],
//! whether a failure aborts the run.

mod factory;

pub use exec_test::ExecutionTestTemplate;
pub use factory::FactoryTemplate;

use crate::catalog::{Catalog, TypeFamily};
use crate::docs::{WrappedLibrary, build_registration_statements};
use crate::dtype::EnrichedEntry;
use crate::error::{GenError, GenResult};
use crate::version::{ApiVersion, SkipNotice, filter_entries};
use indexmap::IndexMap;

/// A text template over a rendering context.
pub trait Template<C> {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn render(&self, context: &C) -> anyhow::Result<String>;
}

/// Bindings for the factory registration unit.
#[derive(Clone, Debug)]
pub struct FactoryContext {
    /// Version-filtered entries, test-only entries removed.
    pub blocks: Catalog<EnrichedEntry>,
    /// One documentation registration statement per bound block.
    pub docs: Vec<String>,
    pub library: WrappedLibrary,
}

impl FactoryContext {
    pub fn bind(
        catalog: &Catalog<EnrichedEntry>,
        target: ApiVersion,
        library: WrappedLibrary,
    ) -> GenResult<Self> {
        let mut blocks = Catalog::new(catalog.domain());
        for (category, entries) in catalog.iter() {
            let eligible: Vec<EnrichedEntry> = entries
                .iter()
                .filter(|entry| !entry.is_test_only())
                .cloned()
                .collect();
            for entry in filter_entries(&eligible, target).included {
                blocks.push(category, entry);
            }
        }
        let docs = build_registration_statements(&blocks, &library)?;
        log::debug!(
            "factory context: {} block(s), {} doc record(s)",
            blocks.len(),
            docs.len()
        );
        Ok(Self {
            blocks,
            docs,
            library,
        })
    }
}

/// Bindings for the execution test unit.
#[derive(Clone, Debug)]
pub struct TestContext {
    /// Version-filtered entries, test-only entries included.
    pub blocks: Catalog<EnrichedEntry>,
    /// Type classification → family whose code selects the `EnableIf` overload.
    pub sfinae: IndexMap<&'static str, TypeFamily>,
    pub skipped: Vec<SkipNotice>,
}

impl TestContext {
    /// Bind every category, collecting a notice for each entry left out.
    pub fn bind(catalog: &Catalog<EnrichedEntry>, target: ApiVersion) -> Self {
        let mut blocks = Catalog::new(catalog.domain());
        let mut skipped = Vec::new();
        for (category, entries) in catalog.iter() {
            let outcome = filter_entries(entries, target);
            for entry in outcome.included {
                blocks.push(category, entry);
            }
            skipped.extend(outcome.skipped);
        }
        log::debug!(
            "test context: {} block(s), {} skipped",
            blocks.len(),
            skipped.len()
        );
        Self {
            blocks,
            sfinae: sfinae_map(),
            skipped,
        }
    }
}

/// Fixed classification → family mapping, in `Integer, UnsignedInt, Float,
/// Complex` order.
pub fn sfinae_map() -> IndexMap<&'static str, TypeFamily> {
    TypeFamily::ALL
        .into_iter()
        .map(|family| (family.classification(), family))
        .collect()
}

/// Result of one rendering call. Callers must inspect it.
#[must_use]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RenderOutcome {
    Rendered(String),
    Failed { template: String, diagnostic: String },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }

    pub fn into_result(self) -> GenResult<String> {
        match self {
            RenderOutcome::Rendered(text) => Ok(text),
            RenderOutcome::Failed {
                template,
                diagnostic,
            } => Err(GenError::Render {
                template,
                diagnostic,
            }),
        }
    }
}

/// What to do with a [`RenderOutcome::Failed`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RenderFailurePolicy {
    /// Abort the run with [`GenError::Render`].
    #[default]
    Fatal,
    /// Print the diagnostic to stderr and continue with an empty body.
    Lenient,
}

impl RenderFailurePolicy {
    pub fn resolve(self, outcome: RenderOutcome) -> GenResult<String> {
        match (self, outcome) {
            (_, RenderOutcome::Rendered(text)) => Ok(text),
            (RenderFailurePolicy::Fatal, failed) => failed.into_result(),
            (
                RenderFailurePolicy::Lenient,
                RenderOutcome::Failed {
                    template,
                    diagnostic,
                },
            ) => {
                log::warn!("rendering {template} failed; writing header only");
                eprintln!("{diagnostic}");
                Ok(String::new())
            }
        }
    }
}

/// Pair of templates producing the two generated units.
pub struct Renderer<F, T> {
    factory: F,
    test: T,
}

impl Renderer<FactoryTemplate, ExecutionTestTemplate> {
    /// Renderer using the templates shipped with the crate.
    pub fn builtin() -> Self {
        Self::new(FactoryTemplate, ExecutionTestTemplate)
    }
}

impl<F, T> Renderer<F, T>
where
    F: Template<FactoryContext>,
    T: Template<TestContext>,
{
    pub fn new(factory: F, test: T) -> Self {
        Self { factory, test }
    }

    pub fn render_factory(&self, context: &FactoryContext) -> RenderOutcome {
        render_with(&self.factory, context)
    }

    pub fn render_tests(&self, context: &TestContext) -> RenderOutcome {
        render_with(&self.test, context)
    }
}

fn render_with<C, P: Template<C>>(template: &P, context: &C) -> RenderOutcome {
    match template.render(context) {
        Ok(text) => RenderOutcome::Rendered(text),
        Err(err) => RenderOutcome::Failed {
            template: template.name().to_string(),
            diagnostic: format!("{err:?}"),
        },
    }
}
