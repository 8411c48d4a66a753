//! Generates `Factory.cpp` and `BlockExecutionTestAuto.cpp` from the block
//! catalog.
//!
//! ```bash
//! blockgen <output-dir> <MAJOR.MINOR.PATCH>
//! ```
//!
//! Entries whose `minAPIVersion` exceeds the target are left out and reported
//! on stdout. Log verbosity follows `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use blockgen::{ApiVersion, Generator, GeneratorConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blockgen")]
#[command(about = "Render block factory and execution test sources from the block catalog")]
#[command(version)]
struct Cli {
    /// Directory the generated sources are written to
    output_dir: PathBuf,

    /// Target library version, MAJOR.MINOR.PATCH
    #[arg(id = "target_version", value_name = "VERSION")]
    version: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let target: ApiVersion = cli
        .version
        .parse()
        .with_context(|| format!("invalid target version '{}'", cli.version))?;

    let config = GeneratorConfig::new(cli.output_dir, target);
    let report = Generator::builtin().run(&config)?;

    log::info!(
        "{} block(s) registered, {} tested, {} skipped for API {}",
        report.registered,
        report.tested,
        report.skipped.len(),
        target.key()
    );
    for template in &report.degraded {
        log::warn!("{template} was written without a body");
    }
    Ok(())
}
