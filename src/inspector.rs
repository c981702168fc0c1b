//! Source expansion and run orchestration.
//!
//! Expands the configured input sources into concrete files, runs the file
//! processor over each sequentially, and aggregates every file's records
//! into one combined artifact written at the end of the run.

use crate::{
    chunker::Chunker,
    client::ChatClient,
    config::RunDirs,
    error::{Error, Result},
    processor::FileProcessor,
    prompt::Prompt,
    record::ResultRecord,
};
use globset::GlobSet;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

const COMBINED_RESULTS_FILE: &str = "combined_results.yaml";
const SUMMARY_FILE: &str = "summary.json";
const SNIFF_BUFFER_SIZE: usize = 8192;

/// Statistics collected during one inspection run.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionStats {
    /// Files handed to the processor (including ones that failed to read)
    pub files_processed: usize,

    /// Files skipped during directory walks (excluded or binary)
    pub files_skipped: usize,

    /// Sources that were neither file nor directory
    pub invalid_sources: usize,

    /// Result records in the combined mapping
    pub result_records: usize,

    /// Records carrying an error marker instead of parsed data
    pub error_records: usize,

    /// Total run time in seconds
    pub duration_secs: f64,

    /// Directory holding the run's artifacts
    pub output_directory: String,

    /// Generation timestamp
    pub generated_at: String,
}

impl InspectionStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║            Inspection Run Summary                     ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Files Processed:      {:>8}                        ║",
            self.files_processed
        );
        println!(
            "║ Files Skipped:        {:>8}                        ║",
            self.files_skipped
        );
        println!(
            "║ Invalid Sources:      {:>8}                        ║",
            self.invalid_sources
        );
        println!("║                                                       ║");
        println!(
            "║ Result Records:       {:>8}                        ║",
            self.result_records
        );
        println!(
            "║   - With errors:      {:>8}                        ║",
            self.error_records
        );
        println!("║                                                       ║");
        println!("║ Output Directory:                                     ║");
        println!("║   {}                                              ║", self.output_directory);
        println!(
            "║ Duration:             {:>8.2}s                       ║",
            self.duration_secs
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Orchestrates one inspection run over the configured sources.
pub struct Inspector<'a> {
    client: &'a ChatClient,
    prompts: &'a [Prompt],
    chunker: Chunker,
    dirs: &'a RunDirs,
    exclude: GlobSet,
    dry_run: bool,
}

impl<'a> Inspector<'a> {
    /// Creates an inspector over shared run state.
    #[must_use]
    pub fn new(
        client: &'a ChatClient,
        prompts: &'a [Prompt],
        chunker: Chunker,
        dirs: &'a RunDirs,
        exclude: GlobSet,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            prompts,
            chunker,
            dirs,
            exclude,
            dry_run,
        }
    }

    /// Inspects every source sequentially and writes the combined artifact.
    ///
    /// Directory sources are walked recursively in sorted order; file sources
    /// are processed directly; anything else is logged and skipped. Later
    /// keys overwrite earlier ones on collision.
    ///
    /// # Errors
    ///
    /// Returns an error only if the combined artifact or summary cannot be
    /// written; per-file and per-source failures are contained and logged.
    pub fn inspect(&self, sources: &[PathBuf]) -> Result<InspectionStats> {
        let start = Instant::now();
        let processor = FileProcessor::new(
            self.client,
            self.prompts,
            self.chunker,
            self.dirs,
            self.dry_run,
        );

        let mut results: HashMap<String, ResultRecord> = HashMap::new();
        let mut files_processed = 0;
        let mut files_skipped = 0;
        let mut invalid_sources = 0;

        for source in sources {
            if source.is_dir() {
                for file in self.walk(source, &mut files_skipped) {
                    results.extend(processor.process(&file));
                    files_processed += 1;
                }
            } else if source.is_file() {
                results.extend(processor.process(source));
                files_processed += 1;
            } else {
                warn!("{}", Error::invalid_source(source));
                invalid_sources += 1;
            }
        }

        self.write_combined(&results)?;

        let error_records = results.values().filter(|r| r.is_error()).count();
        let stats = InspectionStats {
            files_processed,
            files_skipped,
            invalid_sources,
            result_records: results.len(),
            error_records,
            duration_secs: start.elapsed().as_secs_f64(),
            output_directory: self.dirs.output_dir.display().to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        self.write_summary(&stats)?;

        info!(
            "Inspection completed. Results saved in {}",
            self.dirs.output_dir.join(COMBINED_RESULTS_FILE).display()
        );

        Ok(stats)
    }

    /// Collects every regular file beneath a directory source, in sorted
    /// order for deterministic output.
    fn walk(&self, root: &Path, skipped: &mut usize) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.exclude.is_match(path) {
                debug!("Skipping excluded file: {}", path.display());
                *skipped += 1;
                continue;
            }

            if is_likely_binary(path).unwrap_or(false) {
                debug!("Skipping binary file: {}", path.display());
                *skipped += 1;
                continue;
            }

            files.push(path.to_path_buf());
        }

        files
    }

    /// Writes the combined mapping of every record for this run.
    fn write_combined(&self, results: &HashMap<String, ResultRecord>) -> Result<()> {
        let path = self.dirs.output_dir.join(COMBINED_RESULTS_FILE);
        let rendered = serde_yaml::to_string(results)?;
        fs::write(&path, rendered).map_err(|e| Error::io(&path, e))
    }

    /// Writes run statistics next to the combined artifact.
    fn write_summary(&self, stats: &InspectionStats) -> Result<()> {
        let path = self.dirs.output_dir.join(SUMMARY_FILE);
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::to_writer_pretty(file, stats).map_err(Error::from)
    }
}

/// Determines if a file is likely binary by checking its first 8 KiB for
/// null bytes. Source trees routinely contain build artifacts; forwarding
/// their bytes to a text completion endpoint helps no one.
fn is_likely_binary(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut buffer = [0u8; SNIFF_BUFFER_SIZE];

    let mut handle = file.take(SNIFF_BUFFER_SIZE as u64);
    let mut read = 0;
    loop {
        let n = handle
            .read(&mut buffer[read..])
            .map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        read += n;
    }

    Ok(memchr::memchr(0, &buffer[..read]).is_some())
}
