//! Built-in template for `Factory.cpp`: block registrations, scalar-op
//! factories and the documentation static block.

use super::{FactoryContext, Template};
use crate::catalog::{BlockPattern, CapabilityFlags, Category, TypeFamily};
use crate::docs::WrappedLibrary;
use crate::dtype::{EnrichedEntry, TypeSupport};
use crate::normalize::{COMMENT_PREFIX, title_case};
use anyhow::{Context, Result, bail};
use indexmap::IndexSet;
use std::fmt::Write;

const LOCAL_INCLUDES: &[&str] = &[
    "OneToOneBlock.hpp",
    "NToOneBlock.hpp",
    "ScalarOpBlock.hpp",
    "SingleOutputSource.hpp",
    "TwoToOneBlock.hpp",
    "Utility.hpp",
];

const FRAMEWORK_INCLUDES: &[&str] = &[
    "Pothos/Callable.hpp",
    "Pothos/Framework.hpp",
    "Pothos/Proxy.hpp",
];

const IMPLEMENTATION_PRIORITY: &[&str] = &[
    "<ol>",
    "<li>CUDA (if GPU present)</li>",
    "<li>OpenCL (if GPU present)</li>",
    "<li>Standard C++ (if no GPU present)</li>",
    "</ol>",
];

const ENTRY_INDENT: &str = "    ";

/// Factory registration unit: scalar-op factories, the block registry table,
/// and the documentation registrations.
#[derive(Clone, Copy, Debug, Default)]
pub struct FactoryTemplate;

impl Template<FactoryContext> for FactoryTemplate {
    fn name(&self) -> &str {
        "Factory"
    }

    fn render(&self, context: &FactoryContext) -> Result<String> {
        let mut out = String::new();
        write_includes(&mut out, &context.library)?;

        let blocks = &context.blocks;
        for entry in blocks.entries(Category::ScalarOp) {
            write_scalar_op(&mut out, entry, &context.library)
                .with_context(|| format!("rendering {}", entry.normalized.block_path))?;
        }

        writeln!(out, "static const std::vector<Pothos::BlockRegistry> BlockRegistries =")?;
        writeln!(out, "{{")?;
        for category in [
            Category::OneToOne,
            Category::SingleOutputSource,
            Category::TwoToOne,
            Category::NToOne,
        ] {
            for entry in blocks.entries(category) {
                write_registry(&mut out, category, entry, &context.library)
                    .with_context(|| format!("rendering {}", entry.normalized.block_path))?;
            }
        }
        writeln!(out, "}};")?;

        if !context.docs.is_empty() {
            writeln!(out)?;
            writeln!(
                out,
                "pothos_static_block(register{}BlockDocs)",
                identifier(&context.library.display_name)
            )?;
            writeln!(out, "{{")?;
            for statement in &context.docs {
                writeln!(out, "{ENTRY_INDENT}{statement}")?;
            }
            writeln!(out, "}}")?;
        }
        Ok(out)
    }
}

fn write_includes(out: &mut String, library: &WrappedLibrary) -> Result<()> {
    for header in LOCAL_INCLUDES {
        writeln!(out, "#include \"{header}\"")?;
    }
    writeln!(out)?;
    for header in FRAMEWORK_INCLUDES {
        writeln!(out, "#include <{header}>")?;
    }
    writeln!(out)?;
    writeln!(out, "#include <{}.h>", library.display_name.to_lowercase())?;
    writeln!(out)?;
    writeln!(out, "#include <vector>")?;
    writeln!(out)?;
    Ok(())
}

/// `/* ... */` block whose lines all carry the comment prefix.
#[derive(Default)]
struct DocComment {
    lines: Vec<String>,
}

impl DocComment {
    fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(COMMENT_PREFIX.trim_end().to_string());
        } else {
            self.lines.push(format!("{COMMENT_PREFIX}{text}"));
        }
        self
    }

    /// Add a line that already carries the prefix.
    fn formatted(&mut self, line: &str) -> &mut Self {
        self.lines.push(line.to_string());
        self
    }

    fn header(&mut self, entry: &EnrichedEntry, summary: &[String]) -> &mut Self {
        self.line(format!("|PothosDoc {}", entry.normalized.nice_name))
            .line("");
        if let Some(description) = &entry.normalized.description_comment {
            self.formatted(description).line("");
        }
        for text in summary {
            self.line(text);
        }
        for text in IMPLEMENTATION_PRIORITY {
            self.line(text);
        }
        self.line("")
    }

    fn taxonomy(&mut self, entry: &EnrichedEntry, library: &WrappedLibrary) -> &mut Self {
        let raw = &entry.normalized.entry;
        let mut keywords: IndexSet<&str> = IndexSet::new();
        keywords.insert(&raw.header);
        keywords.insert(&entry.normalized.block_name);
        keywords.extend(raw.keywords.iter().map(String::as_str));
        self.line(format!(
            "|category /{}/{}",
            library.display_name,
            title_case(&raw.header)
        ))
        .line(format!(
            "|keywords {}",
            keywords.into_iter().collect::<Vec<_>>().join(" ")
        ))
    }

    fn factory(&mut self, entry: &EnrichedEntry, args: &[&str]) -> &mut Self {
        self.line(format!(
            "|factory {}({})",
            entry.normalized.block_path,
            args.join(",")
        ))
    }

    fn dtype_param(
        &mut self,
        key: &str,
        label: &str,
        desc: &str,
        chooser: &str,
        default: &str,
    ) -> &mut Self {
        self.line("")
            .line(format!("|param {key}({label}) {desc}"))
            .line(format!("|widget DTypeChooser({chooser})"))
            .line(format!("|default {default}"))
            .line("|preview disable")
    }

    fn channels_param(&mut self, minimum: u32) -> &mut Self {
        self.line("")
            .line("|param numChannels[Num Channels] The number of channels.")
            .line(format!("|default {minimum}"))
            .line(format!("|widget SpinBox(minimum={minimum})"))
            .line("|preview disable")
    }

    fn write(&self, out: &mut String, indent: &str) -> Result<()> {
        writeln!(out, "{indent}/*")?;
        for line in &self.lines {
            writeln!(out, "{indent}{line}")?;
        }
        writeln!(out, "{indent} */")?;
        Ok(())
    }
}

/// How a block's data types are chosen at construction time.
enum Signature<'a> {
    Pattern(BlockPattern),
    OneType(&'a TypeSupport),
    TwoTypes {
        input: &'a TypeSupport,
        output: &'a TypeSupport,
    },
}

impl<'a> Signature<'a> {
    fn resolve(entry: &'a EnrichedEntry) -> Result<Self> {
        if let Some(pattern) = entry.normalized.entry.block_pattern {
            return Ok(Signature::Pattern(pattern));
        }
        let types = &entry.types;
        if let Some(supported) = &types.supported {
            return Ok(Signature::OneType(supported));
        }
        match (&types.input, &types.output) {
            (Some(input), Some(output)) => Ok(Signature::TwoTypes { input, output }),
            (Some(_), None) => bail!("supportedInputTypes given without supportedOutputTypes"),
            (None, Some(_)) => bail!("supportedOutputTypes given without supportedInputTypes"),
            (None, None) => {
                bail!("no supportedTypes or supportedInputTypes/supportedOutputTypes declared")
            }
        }
    }
}

fn default_literal(support: &TypeSupport) -> Result<String> {
    let default = support
        .default_type
        .context("capability record encodes no default type")?;
    Ok(format!("\"{default}\""))
}

fn write_dtype_support(out: &mut String, flags: &CapabilityFlags, position: u32) -> Result<()> {
    let pad = ENTRY_INDENT.repeat(3);
    writeln!(out, "{pad}.bind<DTypeSupport>({{")?;
    for family in TypeFamily::ALL {
        writeln!(out, "{pad}{ENTRY_INDENT}{},", flags.supports(family))?;
    }
    writeln!(out, "{pad}}}, {position})")?;
    Ok(())
}

fn write_bool_bind(out: &mut String, value: bool, position: u32) -> Result<()> {
    writeln!(out, "{}.bind<bool>({value}, {position})", ENTRY_INDENT.repeat(3))?;
    Ok(())
}

fn write_callable(out: &mut String, entry: &EnrichedEntry, maker: &str) -> Result<()> {
    writeln!(out, "{ENTRY_INDENT}Pothos::BlockRegistry(")?;
    writeln!(out, "{ENTRY_INDENT}{ENTRY_INDENT}\"{}\",", entry.normalized.block_path)?;
    writeln!(out, "{ENTRY_INDENT}{ENTRY_INDENT}Pothos::Callable(&{maker})")?;
    Ok(())
}

fn bind_func(out: &mut String, functor: &str, target: &str) -> Result<()> {
    writeln!(out, "{}.bind<{functor}>({target}, 0)", ENTRY_INDENT.repeat(3))?;
    Ok(())
}

/// Widget string for blocks whose type set is fixed by `intOnly` alone.
fn int_only_chooser(int_only: bool) -> (String, &'static str) {
    let families: &[TypeFamily] = if int_only {
        &[TypeFamily::Int, TypeFamily::UInt]
    } else {
        &TypeFamily::ALL
    };
    let tokens: Vec<String> = families.iter().map(TypeFamily::widget_token).collect();
    let default = if int_only { "\"uint64\"" } else { "\"float64\"" };
    (tokens.join(","), default)
}

fn operator(entry: &EnrichedEntry) -> Result<&str> {
    entry
        .normalized
        .entry
        .operator
        .as_deref()
        .context("operator is required for this category")
}

fn write_scalar_op(
    out: &mut String,
    entry: &EnrichedEntry,
    library: &WrappedLibrary,
) -> Result<()> {
    let raw = &entry.normalized.entry;
    let op = operator(entry)?;
    let (chooser, default) = int_only_chooser(raw.int_only);

    let mut doc = DocComment::default();
    doc.header(
        entry,
        &[
            format!("Applies the <b>{op}</b> operator to all inputs, with a given"),
            "scalar value. This block computes all outputs in parallel, using one of the".into(),
            "following implementations by priority (based on availability of hardware".into(),
            "and underlying libraries).".into(),
        ],
    )
    .taxonomy(entry, library)
    .factory(entry, &["dtype", "scalar", "numChannels"])
    .dtype_param("dtype", "Data Type", "The block data type.", &chooser, default)
    .line("")
    .line("|param scalar(Scalar Value) The scalar value to apply to the array.")
    .line(format!("|default {}", if raw.allow_zero_scalar { 0 } else { 1 }))
    .channels_param(1);
    doc.write(out, "")?;

    writeln!(
        out,
        "ScalarOpBlockFactory({}, {op}, {}, {})",
        entry.normalized.block_name, raw.allow_zero_scalar, raw.int_only
    )?;
    writeln!(out)?;
    Ok(())
}

fn write_registry(
    out: &mut String,
    category: Category,
    entry: &EnrichedEntry,
    library: &WrappedLibrary,
) -> Result<()> {
    match category {
        Category::OneToOne => write_one_to_one(out, entry, library),
        Category::SingleOutputSource => write_source(out, entry, library),
        Category::TwoToOne => write_two_to_one(out, entry, library),
        Category::NToOne => write_n_to_one(out, entry, library),
        Category::ScalarOp => bail!("scalar-op blocks are declared through ScalarOpBlockFactory"),
    }
}

fn calls_summary(library: &WrappedLibrary, func: &str) -> Vec<String> {
    vec![
        format!(
            "Calls <b>{}::{func}</b> on all inputs. This block computes all",
            library.namespace
        ),
        "outputs in parallel, using one of the following implementations by priority".into(),
        "(based on availability of hardware and underlying libraries).".into(),
    ]
}

fn write_one_to_one(
    out: &mut String,
    entry: &EnrichedEntry,
    library: &WrappedLibrary,
) -> Result<()> {
    let signature = Signature::resolve(entry)?;
    let mut doc = DocComment::default();
    doc.header(entry, &calls_summary(library, entry.func()))
        .taxonomy(entry, library);
    match &signature {
        Signature::Pattern(BlockPattern::FloatToComplex) => {
            doc.factory(entry, &["floatDType", "numChannels"]).dtype_param(
                "floatDType",
                "Data Type",
                "The float type for the scalar input and complex output.",
                "float=1",
                "\"float64\"",
            );
        }
        Signature::Pattern(BlockPattern::ComplexToFloat) => {
            doc.factory(entry, &["floatDType", "numChannels"]).dtype_param(
                "floatDType",
                "Data Type",
                "The float type for the complex input and scalar output.",
                "float=1",
                "\"float64\"",
            );
        }
        Signature::OneType(support) => {
            doc.factory(entry, &["dtype", "numChannels"]).dtype_param(
                "dtype",
                "Data Type",
                "The block data type.",
                &support.dtype_string,
                &default_literal(support)?,
            );
        }
        Signature::TwoTypes { input, output } => {
            doc.factory(entry, &["inputDType", "outputDType", "numChannels"])
                .dtype_param(
                    "inputDType",
                    "Input Data Type",
                    "The input data type.",
                    &input.dtype_string,
                    &default_literal(input)?,
                )
                .dtype_param(
                    "outputDType",
                    "Output Data Type",
                    "The output data type.",
                    &output.dtype_string,
                    &default_literal(output)?,
                );
        }
    }
    doc.channels_param(1);
    doc.write(out, ENTRY_INDENT)?;

    let target = format!("&{}::{}", library.namespace, entry.func());
    match signature {
        Signature::Pattern(BlockPattern::FloatToComplex) => {
            write_callable(out, entry, "OneToOneBlock::makeFloatToComplex")?;
            bind_func(out, "OneToOneFunc", &target)?;
        }
        Signature::Pattern(BlockPattern::ComplexToFloat) => {
            write_callable(out, entry, "OneToOneBlock::makeComplexToFloat")?;
            bind_func(out, "OneToOneFunc", &target)?;
        }
        Signature::OneType(support) => {
            write_callable(out, entry, "OneToOneBlock::makeFromOneType")?;
            bind_func(out, "OneToOneFunc", &target)?;
            write_dtype_support(out, &support.flags, 2)?;
        }
        Signature::TwoTypes { input, output } => {
            write_callable(out, entry, "OneToOneBlock::makeFromTwoTypes")?;
            bind_func(out, "OneToOneFunc", &target)?;
            write_dtype_support(out, &input.flags, 3)?;
            write_dtype_support(out, &output.flags, 4)?;
        }
    }
    writeln!(out, "{ENTRY_INDENT}),")?;
    Ok(())
}

fn write_source(out: &mut String, entry: &EnrichedEntry, library: &WrappedLibrary) -> Result<()> {
    let support = entry
        .types
        .supported
        .as_ref()
        .context("sources require supportedTypes")?;

    let mut doc = DocComment::default();
    doc.header(
        entry,
        &[
            format!(
                "Calls <b>{}::{}</b> to generate outputs. This block uses",
                library.namespace,
                entry.func()
            ),
            "one of the following implementations by priority (based on availability".into(),
            "of hardware and underlying libraries).".into(),
        ],
    )
    .taxonomy(entry, library)
    .factory(entry, &["dtype"])
    .dtype_param(
        "dtype",
        "Data Type",
        "The block data type.",
        &support.dtype_string,
        &default_literal(support)?,
    );
    doc.write(out, ENTRY_INDENT)?;

    write_callable(out, entry, "SingleOutputSource::make")?;
    bind_func(
        out,
        "SingleOutputFunc",
        &format!("&{}::{}", library.namespace, entry.func()),
    )?;
    write_dtype_support(out, &support.flags, 2)?;
    writeln!(out, "{ENTRY_INDENT}),")?;
    Ok(())
}

fn write_two_to_one(
    out: &mut String,
    entry: &EnrichedEntry,
    library: &WrappedLibrary,
) -> Result<()> {
    let signature = Signature::resolve(entry)?;
    let allow_zero = entry.normalized.entry.allow_zero_in_buffer1;

    let mut doc = DocComment::default();
    doc.header(
        entry,
        &[
            format!(
                "Calls <b>{}::{}</b> on all inputs. This block uses one of",
                library.namespace,
                entry.func()
            ),
            "the following implementations by priority (based on availability of".into(),
            "hardware and underlying libraries).".into(),
        ],
    )
    .taxonomy(entry, library);
    match &signature {
        Signature::Pattern(BlockPattern::FloatToComplex) => {
            doc.factory(entry, &["floatDType"]).dtype_param(
                "floatDType",
                "Data Type",
                "The float type for the scalar input and complex output.",
                "float=1",
                "\"float64\"",
            );
        }
        Signature::Pattern(BlockPattern::ComplexToFloat) => {
            bail!("two-to-one blocks only support the FloatToComplex pattern")
        }
        Signature::OneType(support) => {
            doc.factory(entry, &["dtype"]).dtype_param(
                "dtype",
                "Data Type",
                "The block data type.",
                &support.dtype_string,
                &default_literal(support)?,
            );
        }
        Signature::TwoTypes { input, output } => {
            doc.factory(entry, &["inputDType", "outputDType"])
                .dtype_param(
                    "inputDType",
                    "Input Data Type",
                    "The input data type.",
                    &input.dtype_string,
                    &default_literal(input)?,
                )
                .dtype_param(
                    "outputDType",
                    "Output Data Type",
                    "The output data type.",
                    &output.dtype_string,
                    &default_literal(output)?,
                );
        }
    }
    doc.write(out, ENTRY_INDENT)?;

    let target = format!("&{}::{}", library.namespace, entry.func());
    match signature {
        Signature::Pattern(_) => {
            write_callable(out, entry, "TwoToOneBlock::makeFloatToComplex")?;
            bind_func(out, "TwoToOneFunc", &target)?;
            write_bool_bind(out, allow_zero, 2)?;
        }
        Signature::OneType(support) => {
            write_callable(out, entry, "TwoToOneBlock::makeFromOneType")?;
            bind_func(out, "TwoToOneFunc", &target)?;
            write_dtype_support(out, &support.flags, 2)?;
            write_bool_bind(out, allow_zero, 3)?;
        }
        Signature::TwoTypes { input, output } => {
            write_callable(out, entry, "TwoToOneBlock::makeFromTwoTypes")?;
            bind_func(out, "TwoToOneFunc", &target)?;
            write_dtype_support(out, &input.flags, 3)?;
            write_dtype_support(out, &output.flags, 4)?;
            write_bool_bind(out, allow_zero, 5)?;
        }
    }
    writeln!(out, "{ENTRY_INDENT}),")?;
    Ok(())
}

fn write_n_to_one(out: &mut String, entry: &EnrichedEntry, library: &WrappedLibrary) -> Result<()> {
    let raw = &entry.normalized.entry;
    let op = operator(entry)?;
    let support = entry
        .types
        .supported
        .as_ref()
        .context("n-to-one blocks require supportedTypes")?;
    let (chooser, default) = int_only_chooser(raw.int_only);

    let mut doc = DocComment::default();
    doc.header(
        entry,
        &[
            format!("Applies the <b>{op}</b> operator to all inputs, resulting"),
            "in a single output. This block computes all outputs in parallel, using one".into(),
            "of the following implementations by priority (based on availability of".into(),
            "hardware and underlying libraries).".into(),
        ],
    )
    .taxonomy(entry, library)
    .factory(entry, &["dtype", "numChannels"])
    .dtype_param("dtype", "Data Type", "The block data type.", &chooser, default)
    .channels_param(2);
    doc.write(out, ENTRY_INDENT)?;

    write_callable(out, entry, "NToOneBlock::make")?;
    bind_func(
        out,
        "NToOneFunc",
        &format!("AF_ARRAY_OP_N_TO_ONE_FUNC({op})"),
    )?;
    write_dtype_support(out, &support.flags, 3)?;
    writeln!(out, "{ENTRY_INDENT}),")?;
    Ok(())
}

/// Strip everything but ASCII alphanumerics so a display name can be spliced
/// into a C++ identifier.
fn identifier(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, DocumentFormat, parse_catalog};
    use crate::dtype::encode_catalog;
    use crate::normalize::normalize_catalog;
    use std::path::Path;

    fn context(text: &str) -> FactoryContext {
        let catalog =
            parse_catalog(text, DocumentFormat::Yaml, Path::new("inline.yaml"), "arrayfire")
                .expect("fixture catalog");
        let enriched: Catalog<EnrichedEntry> =
            encode_catalog(&normalize_catalog(&catalog)).expect("encodable");
        FactoryContext::bind(&enriched, "3.7.0".parse().unwrap(), WrappedLibrary::default())
            .expect("bindable")
    }

    #[test]
    fn one_to_one_binds_type_support_at_slot_two() {
        let rendered = FactoryTemplate
            .render(&context(
                r#"
OneToOneBlocks:
  - func: abs
    header: arith
    description: Absolute value of each element.
    supportedTypes:
      supportInt: true
      supportFloat: true
"#,
            ))
            .unwrap();

        assert!(rendered.contains("     * |PothosDoc Abs\n"));
        assert!(rendered.contains("     * Absolute value of each element.\n"));
        assert!(rendered.contains("     * |category /ArrayFire/Arith\n"));
        assert!(rendered.contains("     * |factory /arrayfire/arith/abs(dtype,numChannels)\n"));
        assert!(
            rendered.contains("     * |widget DTypeChooser(int16=1,int32=1,int64=1,float=1,dim=1)\n")
        );
        assert!(rendered.contains("     * |default \"float64\"\n"));
        assert!(rendered.contains(
            "        \"/arrayfire/arith/abs\",\n        Pothos::Callable(&OneToOneBlock::makeFromOneType)\n            .bind<OneToOneFunc>(&af::abs, 0)\n            .bind<DTypeSupport>({\n                true,\n                false,\n                true,\n                false,\n            }, 2)\n    ),\n"
        ));
        assert!(rendered.contains("#include <arrayfire.h>\n"));
        assert!(rendered.contains("pothos_static_block(registerArrayFireBlockDocs)\n"));
    }

    #[test]
    fn block_name_drives_registration_path() {
        let rendered = FactoryTemplate
            .render(&context(
                r#"
OneToOneBlocks:
  - func: arg
    header: arith
    blockName: angle
    blockPattern: ComplexToFloat
"#,
            ))
            .unwrap();
        assert!(rendered.contains("\"/arrayfire/arith/angle\","));
        assert!(rendered.contains("Pothos::Callable(&OneToOneBlock::makeComplexToFloat)"));
        assert!(rendered.contains(".bind<OneToOneFunc>(&af::arg, 0)"));
        assert!(rendered.contains("|widget DTypeChooser(float=1)"));
    }

    #[test]
    fn two_type_blocks_bind_input_and_output() {
        let rendered = FactoryTemplate
            .render(&context(
                r#"
TwoToOneBlocks:
  - func: cplx2
    header: complex
    allowZeroInBuffer1: false
    supportedInputTypes: {supportFloat: true}
    supportedOutputTypes: {supportComplexFloat: true}
"#,
            ))
            .unwrap();
        assert!(rendered.contains("TwoToOneBlock::makeFromTwoTypes"));
        assert!(rendered.contains("}, 3)\n"));
        assert!(rendered.contains("}, 4)\n"));
        assert!(rendered.contains(".bind<bool>(false, 5)\n"));
        assert!(rendered.contains("|factory /arrayfire/complex/cplx2(inputDType,outputDType)\n"));
        assert!(rendered.contains("|default \"complex_float64\"\n"));
    }

    #[test]
    fn scalar_ops_precede_the_registry_table() {
        let rendered = FactoryTemplate
            .render(&context(
                r#"
ScalarOpBlocks:
  - func: modscalar
    header: scalar
    operator: "%"
    allowZeroScalar: false
    intOnly: true
NToOneBlocks:
  - func: addn
    header: arith
    operator: "+"
    supportedTypes: {supportAll: true}
"#,
            ))
            .unwrap();
        let scalar = rendered
            .find("ScalarOpBlockFactory(modscalar, %, false, true)")
            .unwrap();
        let table = rendered.find("BlockRegistries =").unwrap();
        assert!(scalar < table);
        assert!(rendered.contains(" * |widget DTypeChooser(int16=1,int32=1,int64=1,uint=1)\n"));
        assert!(rendered.contains(".bind<NToOneFunc>(AF_ARRAY_OP_N_TO_ONE_FUNC(+), 0)"));
        assert!(rendered.contains("|widget SpinBox(minimum=2)"));
    }

    #[test]
    fn missing_type_support_is_a_render_error() {
        let err = FactoryTemplate
            .render(&context("OneToOneBlocks:\n  - func: abs\n    header: arith\n"))
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("/arrayfire/arith/abs"));
        assert!(message.contains("no supportedTypes"));
    }
}
