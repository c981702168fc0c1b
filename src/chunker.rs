use serde::Serialize;

/// A word-count-bounded contiguous word group extracted from one file's text.
///
/// Chunks are identified by their 1-based position in the file's chunk
/// sequence and carry their text re-joined with single spaces. Original
/// whitespace and formatting are not preserved; only word content is
/// forwarded to the remote model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// 1-based position within the file's chunk sequence
    pub index: usize,

    /// Chunk text, words re-joined with single spaces
    pub text: String,

    /// Number of words in this chunk
    pub word_count: usize,
}

/// Splits full text into word-count-bounded chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_words: usize,
}

impl Chunker {
    /// Creates a chunker with the given word cap. A cap of 0 is treated as 1.
    #[must_use]
    pub const fn new(max_words: usize) -> Self {
        Self { max_words }
    }

    /// Returns the configured word cap.
    #[must_use]
    pub const fn max_words(&self) -> usize {
        self.max_words
    }

    /// Splits text on whitespace into ordered chunks of at most the cap.
    ///
    /// Word order is preserved, chunks do not overlap, and only the final
    /// chunk may fall short of the cap. Empty or whitespace-only input yields
    /// an empty sequence.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        words
            .chunks(self.max_words.max(1))
            .enumerate()
            .map(|(i, group)| Chunk {
                index: i + 1,
                text: group.join(" "),
                word_count: group.len(),
            })
            .collect()
    }
}
