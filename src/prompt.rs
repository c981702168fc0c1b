//! Prompt definitions applied uniformly to every chunk.
//!
//! Prompts are loaded once per run from a YAML document whose top-level
//! `prompts` key holds an ordered list of `{system, user}` pairs. Order
//! determines processing order; prompts are otherwise independent.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A configured instruction pair: system role text and user role template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// System instruction sent as the first message
    #[serde(default)]
    pub system: String,

    /// User instruction template; the chunk text is appended to it
    #[serde(default)]
    pub user: String,
}

impl Prompt {
    /// Builds the full user message for one chunk: the user template followed
    /// by a labeled block containing the chunk's literal text.
    #[must_use]
    pub fn user_message(&self, chunk_text: &str) -> String {
        format!(
            "{}\n\nSource Code Chunk:\n\"\"\"{}\"\"\"",
            self.user, chunk_text
        )
    }
}

/// Top-level shape of the prompt definitions document.
#[derive(Debug, Deserialize)]
struct PromptDocument {
    #[serde(default)]
    prompts: Vec<Prompt>,
}

/// Loads the ordered prompt sequence from a YAML document.
///
/// A document without a `prompts` key yields an empty sequence.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML.
pub fn load_prompts(path: impl AsRef<Path>) -> Result<Vec<Prompt>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let document: PromptDocument = serde_yaml::from_str(&raw)
        .map_err(|e| Error::config(format!("failed to parse '{}': {}", path.display(), e)))?;

    Ok(document.prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_load_prompts_preserves_order() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("prompts.yaml");
        file.write_str(
            "prompts:\n  - system: first reviewer\n    user: find bugs\n  - system: second reviewer\n    user: find smells\n",
        )
        .unwrap();

        let prompts = load_prompts(file.path()).unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].system, "first reviewer");
        assert_eq!(prompts[1].user, "find smells");
    }

    #[test]
    fn test_load_prompts_missing_key_is_empty() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("prompts.yaml");
        file.write_str("unrelated: true\n").unwrap();

        let prompts = load_prompts(file.path()).unwrap();
        assert!(prompts.is_empty());
    }

    #[test]
    fn test_load_prompts_missing_fields_default_empty() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("prompts.yaml");
        file.write_str("prompts:\n  - user: only user text\n").unwrap();

        let prompts = load_prompts(file.path()).unwrap();
        assert_eq!(prompts[0].system, "");
        assert_eq!(prompts[0].user, "only user text");
    }

    #[test]
    fn test_load_prompts_missing_file() {
        let result = load_prompts("/nonexistent/prompts.yaml");
        assert!(result.unwrap_err().is_io());
    }

    #[test]
    fn test_user_message_labels_chunk() {
        let prompt = Prompt {
            system: "reviewer".to_string(),
            user: "Inspect this code.".to_string(),
        };

        let message = prompt.user_message("fn main() {}");
        assert_eq!(
            message,
            "Inspect this code.\n\nSource Code Chunk:\n\"\"\"fn main() {}\"\"\""
        );
    }
}
