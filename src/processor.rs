//! Per-file processing: chunk, echo, prompt, parse, persist.
//!
//! Failures are contained at the narrowest scope that still allows forward
//! progress: a failed (chunk, prompt) pair becomes an error record and the
//! loop continues; a failed file read aborts that file only, returning
//! whatever had accumulated.

use crate::{
    chunker::{Chunk, Chunker},
    client::ChatClient,
    config::RunDirs,
    error::{Error, Result},
    prompt::Prompt,
    record::{record_key, ResultRecord},
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

/// Runs every prompt against every chunk of one file.
pub struct FileProcessor<'a> {
    client: &'a ChatClient,
    prompts: &'a [Prompt],
    chunker: Chunker,
    dirs: &'a RunDirs,
    dry_run: bool,
}

impl<'a> FileProcessor<'a> {
    /// Creates a processor over shared run state.
    #[must_use]
    pub fn new(
        client: &'a ChatClient,
        prompts: &'a [Prompt],
        chunker: Chunker,
        dirs: &'a RunDirs,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            prompts,
            chunker,
            dirs,
            dry_run,
        }
    }

    /// Processes one file, returning its result records keyed by
    /// `{stem}_chunk_{i}_prompt_{j}`.
    ///
    /// Never fails: a file-level error is logged and whatever partial
    /// results had accumulated (possibly none) are returned.
    #[must_use]
    pub fn process(&self, path: &Path) -> HashMap<String, ResultRecord> {
        info!("Processing file: {}", path.display());
        let mut results = HashMap::new();

        if let Err(e) = self.try_process(path, &mut results) {
            error!("Error processing file {}: {}", path.display(), e);
        }

        results
    }

    fn try_process(&self, path: &Path, results: &mut HashMap<String, ResultRecord>) -> Result<()> {
        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();

        let chunks = self.chunker.split(&source);
        let chunk_count = chunks.len();

        for chunk in &chunks {
            self.write_echo(&stem, chunk)?;

            if self.dry_run {
                continue;
            }

            for (prompt_number, prompt) in self.prompts.iter().enumerate() {
                let prompt_index = prompt_number + 1;
                debug!(
                    "Running chunk {}/{}, prompt {}/{}",
                    chunk.index,
                    chunk_count,
                    prompt_index,
                    self.prompts.len()
                );

                let key = record_key(&stem, chunk.index, prompt_index);
                let record = match self.run_pair(chunk, prompt, &key) {
                    Ok(record) => record,
                    Err(e) => {
                        error!(
                            "Error processing chunk {}, prompt {}: {}",
                            chunk.index, prompt_index, e
                        );
                        ResultRecord::from_failure(&e)
                    }
                };

                results.insert(key, record);
            }
        }

        Ok(())
    }

    /// One (chunk, prompt) pair: API call, YAML parse, artifact write.
    ///
    /// A write failure after a successful parse still surfaces as an error
    /// for this key; the artifact and the record must agree.
    fn run_pair(&self, chunk: &Chunk, prompt: &Prompt, key: &str) -> Result<ResultRecord> {
        let user_prompt = prompt.user_message(&chunk.text);
        let content = self.client.complete(&prompt.system, &user_prompt)?;

        let record = ResultRecord::from_completion(&content);
        self.write_record(key, &record)?;

        Ok(record)
    }

    /// Writes the chunk's raw text to its echo file for audit and debugging.
    fn write_echo(&self, stem: &str, chunk: &Chunk) -> Result<()> {
        let path = self
            .dirs
            .input_dir
            .join(format!("chunk_{}_{}.txt", chunk.index, stem));
        fs::write(&path, &chunk.text).map_err(|e| Error::io(&path, e))
    }

    /// Writes one parsed-or-error record to its own YAML artifact.
    fn write_record(&self, key: &str, record: &ResultRecord) -> Result<()> {
        let path = self.dirs.output_dir.join(format!("result_{key}.yaml"));
        let rendered = serde_yaml::to_string(record)?;
        fs::write(&path, rendered).map_err(|e| Error::io(&path, e))
    }
}
