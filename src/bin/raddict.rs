//! Compile a FreeRADIUS dictionary directory into Rust attribute modules.
//!
//! Usage:
//!   raddict [OPTIONS] <NAMESPACE> <DICTIONARY_DIR> <OUTPUT_DIR>
//!
//! Log verbosity comes from `RADDICT_LOG` (default `info`).

use anyhow::Context;
use clap::Parser;
use raddict::generate::DEFAULT_RUNTIME;
use raddict::{compile, GeneratorConfig, Namespace, ParseOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "raddict", version, about = "FreeRADIUS dictionary compiler")]
struct Cli {
    /// Module path of the generated dictionary, e.g. `radius::dictionary` or `radius.dictionary`
    namespace: String,
    /// Directory holding the root `dictionary` file
    dictionary_dir: PathBuf,
    /// Root of the generated source tree
    output_dir: PathBuf,
    /// Path of the runtime crate generated code uses
    #[arg(long, default_value = DEFAULT_RUNTIME)]
    runtime: String,
    /// Fail when an $INCLUDE cannot be read
    #[arg(long)]
    strict_includes: bool,
    /// Do not merge the dictionary.jradius extension definitions
    #[arg(long)]
    no_extension: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RADDICT_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let namespace = Namespace::parse(&cli.namespace);
    anyhow::ensure!(!namespace.is_empty(), "namespace {:?} has no segments", cli.namespace);

    let options = ParseOptions {
        strict_includes: cli.strict_includes,
        extension: !cli.no_extension,
    };
    let mut config = GeneratorConfig::new(namespace, cli.output_dir.clone());
    config.runtime = cli.runtime;

    let report = compile(cli.dictionary_dir.clone(), options, config)
        .with_context(|| format!("reading dictionary in {}", cli.dictionary_dir.display()))?;
    tracing::debug!(?report, "done");
    Ok(())
}
