use anyhow::Context;
use clap::Parser;
use code_inspector::{ApiSettings, Config, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "code-inspector",
    version,
    about = "Run configurable LLM prompts over chunked source code",
    long_about = "Run configurable LLM prompts over chunked source code and persist the parsed findings.\n\n\
    The tool reads its run configuration from a YAML document, splits every input file \
    into word-count-bounded chunks, sends each chunk with every configured prompt to an \
    OpenAI-compatible completion endpoint, and writes per-pair YAML artifacts plus one \
    combined artifact per run.\n\n\
    USAGE EXAMPLES:\n  \
      # Run with the default configuration path\n  \
      code-inspector\n\n  \
      # Run with an explicit configuration document\n  \
      code-inspector --config ./config/config.yaml\n\n  \
      # Walk and chunk without calling the endpoint\n  \
      code-inspector --dry-run"
)]
struct Cli {
    /// Path to the run configuration document
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, value_name = "PATH")]
    config: PathBuf,

    /// Walk, chunk, and write echo files without calling the endpoint
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from '{}'", cli.config.display()))?;

    // A dry run never talks to the endpoint, so missing credentials are fine.
    let settings = if cli.dry_run {
        ApiSettings::from_env().unwrap_or_else(|_| ApiSettings::new(String::new()))
    } else {
        ApiSettings::from_env().context("Failed to read API settings from the environment")?
    };

    let stats = code_inspector::run(&config, settings, cli.dry_run)
        .context("Inspection run failed")?;

    stats.print_summary();

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("code_inspector=info"),
        1 => EnvFilter::new("code_inspector=debug"),
        _ => EnvFilter::new("code_inspector=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}
