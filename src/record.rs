use crate::error::Error;
use serde::Serialize;

/// Reason stored when the model's reply is not valid YAML.
pub const YAML_PARSE_FAILURE: &str = "YAML parsing failed";

/// The parsed-or-error outcome of applying one prompt to one chunk.
///
/// Serializes either as the parsed YAML value itself, or as a tagged error
/// mapping `{error: reason, raw_output?: original text}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultRecord {
    /// The model's response, parsed as structured data
    Parsed(serde_yaml::Value),

    /// A failure marker stored in place of a result
    Error {
        /// Why no parsed result exists for this key
        error: String,

        /// The unparsed response text, when one was received
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_output: Option<String>,
    },
}

impl ResultRecord {
    /// Parses completion text as YAML, substituting an error record carrying
    /// the raw text when parsing fails.
    #[must_use]
    pub fn from_completion(text: &str) -> Self {
        match serde_yaml::from_str(text) {
            Ok(value) => Self::Parsed(value),
            Err(parse_error) => {
                tracing::warn!("YAML parsing error: {parse_error}");
                Self::Error {
                    error: YAML_PARSE_FAILURE.to_string(),
                    raw_output: Some(text.to_string()),
                }
            }
        }
    }

    /// Wraps a processing failure (API or otherwise) as an error record.
    #[must_use]
    pub fn from_failure(error: &Error) -> Self {
        Self::Error {
            error: error.to_string(),
            raw_output: None,
        }
    }

    /// Returns true if this record is an error marker.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Builds the composite key for one (file, chunk, prompt) outcome.
///
/// Chunk and prompt indices are 1-based.
#[must_use]
pub fn record_key(file_stem: &str, chunk_index: usize, prompt_index: usize) -> String {
    format!("{file_stem}_chunk_{chunk_index}_prompt_{prompt_index}")
}
