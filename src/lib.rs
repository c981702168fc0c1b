//! # code-inspector
//!
//! A library for running configurable LLM prompts over chunked source code.
//!
//! ## Features
//!
//! - Word-count-bounded chunking of source files
//! - Ordered prompt sequences loaded from YAML
//! - Synchronous OpenAI-compatible completion client with bounded retry
//! - Per-chunk echo files and per-(chunk, prompt) YAML artifacts
//! - One combined artifact plus run statistics per inspection
//!
//! ## Quick Start
//!
//! ```no_run
//! use code_inspector::{ApiSettings, Config};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load("config/config.yaml")?;
//! let settings = ApiSettings::from_env()?;
//!
//! let stats = code_inspector::run(&config, settings, false)?;
//! println!("{} records written", stats.result_records);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a sequential pipeline:
//! 1. **Config / prompts**: Loaded once from YAML, immutable thereafter
//! 2. **Inspector**: Expands sources into concrete files
//! 3. **Processor**: Chunks each file and runs every prompt against every chunk
//! 4. **Client**: Performs the blocking completion calls with bounded retry

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod chunker;
mod client;
mod config;
mod error;
mod inspector;
mod processor;
mod prompt;
mod record;

pub use chunker::{Chunk, Chunker};
pub use client::ChatClient;
pub use config::{ApiSettings, Config, RunDirs, DEFAULT_CONFIG_PATH};
pub use error::{Error, Result};
pub use inspector::{InspectionStats, Inspector};
pub use processor::FileProcessor;
pub use prompt::{load_prompts, Prompt};
pub use record::{record_key, ResultRecord, YAML_PARSE_FAILURE};

/// Runs one complete inspection with the given configuration and settings.
///
/// Loads the prompt sequence, creates the timestamped run directories, and
/// inspects every configured source. With `dry_run` set, files are walked,
/// chunked, and echoed but no completion calls are made.
///
/// # Errors
///
/// Returns an error if:
/// - The prompt document cannot be loaded
/// - The run directories cannot be created
/// - The exclude patterns are invalid
/// - The combined artifact or summary cannot be written
pub fn run(config: &Config, settings: ApiSettings, dry_run: bool) -> Result<InspectionStats> {
    let prompts = load_prompts(&config.prompt_config_path)?;
    let dirs = RunDirs::create(&config.output_directory)?;

    let client = ChatClient::new(settings);
    let chunker = Chunker::new(config.max_chunk_words);
    let inspector = Inspector::new(
        &client,
        &prompts,
        chunker,
        &dirs,
        config.exclude_matcher()?,
        dry_run,
    );

    inspector.inspect(&config.input_source)
}
