use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed relative path of the run configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

const DEFAULT_OUTPUT_DIRECTORY: &str = "outputs";
const DEFAULT_PROMPT_CONFIG_PATH: &str = "prompts/prompt-config.yaml";
const DEFAULT_MAX_CHUNK_WORDS: usize = 8_000;
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_RETRY_LIMIT: usize = 3;

/// Run configuration loaded once at startup from a YAML document.
///
/// Recognized keys: `input_source` (list of file or directory paths),
/// `output_directory`, `prompt_config_path`, and the optional `exclude`
/// (glob patterns skipped during directory walks) and `max_chunk_words`.
///
/// # Examples
///
/// ```yaml
/// input_source:
///   - ./src
///   - ./build.rs
/// output_directory: ./outputs
/// prompt_config_path: ./prompts/prompt-config.yaml
/// exclude:
///   - "**/*.lock"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Input files and directories to inspect
    #[serde(default)]
    pub input_source: Vec<PathBuf>,

    /// Base directory for run outputs
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// Path to the prompt definitions document
    #[serde(default = "default_prompt_config_path")]
    pub prompt_config_path: PathBuf,

    /// Glob patterns excluded from directory walks
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Maximum words per chunk
    #[serde(default = "default_max_chunk_words")]
    pub max_chunk_words: usize,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)
}

fn default_prompt_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_PROMPT_CONFIG_PATH)
}

const fn default_max_chunk_words() -> usize {
    DEFAULT_MAX_CHUNK_WORDS
}

impl Config {
    /// Loads and validates the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML,
    /// or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let config: Self = serde_yaml::from_str(&raw).map_err(|e| {
            Error::config(format!("failed to parse '{}': {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk word cap or exclude patterns are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_words == 0 {
            return Err(Error::config("max_chunk_words must be greater than 0"));
        }

        // Fail fast on malformed globs rather than mid-run
        self.exclude_matcher()?;

        Ok(())
    }

    /// Compiles the `exclude` patterns into a matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is not a valid glob.
    pub fn exclude_matcher(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|e| {
                Error::config(format!("invalid exclude pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| Error::config(format!("failed to build exclude set: {e}")))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_source: Vec::new(),
            output_directory: default_output_directory(),
            prompt_config_path: default_prompt_config_path(),
            exclude: Vec::new(),
            max_chunk_words: DEFAULT_MAX_CHUNK_WORDS,
        }
    }
}

/// Settings for the remote completion endpoint.
///
/// Constructed explicitly at process start and passed by reference into the
/// client, rather than living in module-level statics.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Bearer token for the endpoint
    pub api_key: String,

    /// Full URL of the chat completions endpoint
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Number of additional attempts after a failed call
    pub retry_limit: usize,
}

impl ApiSettings {
    /// Creates settings with the given key and documented defaults for the rest.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    /// Reads settings from the process environment.
    ///
    /// `OPENAI_API_KEY` is required; `BASE_URL` and `MODEL` fall back to the
    /// documented defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is missing or empty.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::config("OPENAI_API_KEY is not set"))?;

        let mut settings = Self::new(api_key);

        if let Ok(url) = env::var("BASE_URL") {
            if !url.is_empty() {
                settings.base_url = url;
            }
        }

        if let Ok(model) = env::var("MODEL") {
            if !model.is_empty() {
                settings.model = model;
            }
        }

        Ok(settings)
    }

    /// Overrides the endpoint URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the retry limit.
    #[must_use]
    pub const fn with_retry_limit(mut self, limit: usize) -> Self {
        self.retry_limit = limit;
        self
    }
}

/// Timestamped per-run output directories, created at run start.
///
/// `inputs_{timestamp}` holds chunk echo files; `outputs_{timestamp}` holds
/// per-record artifacts, the combined artifact, and the run summary.
#[derive(Debug, Clone)]
pub struct RunDirs {
    /// Directory for chunk echo files
    pub input_dir: PathBuf,

    /// Directory for result artifacts
    pub output_dir: PathBuf,
}

impl RunDirs {
    /// Creates both run directories under the configured base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created.
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

        let input_dir = base.join(format!("inputs_{timestamp}"));
        let output_dir = base.join(format!("outputs_{timestamp}"));

        fs::create_dir_all(&input_dir).map_err(|e| Error::io(&input_dir, e))?;
        fs::create_dir_all(&output_dir).map_err(|e| Error::io(&output_dir, e))?;

        Ok(Self {
            input_dir,
            output_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_load_full_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("config.yaml");
        file.write_str(
            "input_source:\n  - ./src\n  - ./build.rs\noutput_directory: ./run-out\nprompt_config_path: ./prompts.yaml\nexclude:\n  - \"**/*.lock\"\nmax_chunk_words: 500\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.input_source.len(), 2);
        assert_eq!(config.output_directory, PathBuf::from("./run-out"));
        assert_eq!(config.prompt_config_path, PathBuf::from("./prompts.yaml"));
        assert_eq!(config.exclude, vec!["**/*.lock".to_string()]);
        assert_eq!(config.max_chunk_words, 500);
    }

    #[test]
    fn test_load_applies_defaults() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("config.yaml");
        file.write_str("input_source:\n  - ./src\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output_directory, PathBuf::from(DEFAULT_OUTPUT_DIRECTORY));
        assert_eq!(
            config.prompt_config_path,
            PathBuf::from(DEFAULT_PROMPT_CONFIG_PATH)
        );
        assert!(config.exclude.is_empty());
        assert_eq!(config.max_chunk_words, DEFAULT_MAX_CHUNK_WORDS);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/config.yaml");
        assert!(result.unwrap_err().is_io());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("config.yaml");
        file.write_str("input_source: [unclosed").unwrap();

        let result = Config::load(file.path());
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_validate_zero_chunk_words() {
        let config = Config {
            max_chunk_words: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_exclude_glob() {
        let config = Config {
            exclude: vec!["a[".to_string()],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exclude_matcher() {
        let config = Config {
            exclude: vec!["**/*.lock".to_string()],
            ..Config::default()
        };
        let matcher = config.exclude_matcher().unwrap();
        assert!(matcher.is_match("deep/Cargo.lock"));
        assert!(!matcher.is_match("src/main.rs"));
    }

    #[test]
    fn test_api_settings_defaults() {
        let settings = ApiSettings::new("sk-test");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.retry_limit, DEFAULT_RETRY_LIMIT);
    }

    #[test]
    fn test_api_settings_overrides() {
        let settings = ApiSettings::new("sk-test")
            .with_base_url("http://localhost:9999/v1/chat/completions")
            .with_model("gpt-4o")
            .with_retry_limit(1);

        assert_eq!(settings.base_url, "http://localhost:9999/v1/chat/completions");
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.retry_limit, 1);
    }

    #[test]
    fn test_run_dirs_created() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dirs = RunDirs::create(temp.path()).unwrap();

        assert!(dirs.input_dir.is_dir());
        assert!(dirs.output_dir.is_dir());
        assert!(dirs
            .input_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("inputs_"));
        assert!(dirs
            .output_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("outputs_"));
    }
}
