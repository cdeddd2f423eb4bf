//! tokenize -> segment -> weigh -> select.

use serde::{Deserialize, Serialize};

use crate::select::select;
use crate::segment::segment;
use crate::tfidf::{weigh, WeightingOptions};
use crate::tokenize::tokenize;
use crate::{Error, Result, DEFAULT_CHUNK_SIZE, DEFAULT_SUMMARY_RATIO};

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_summary_ratio() -> f64 {
    DEFAULT_SUMMARY_RATIO
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Tokens per chunk (>= 1).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Fraction of chunks to keep, in `(0, 1]`.
    #[serde(default = "default_summary_ratio")]
    pub summary_ratio: f64,
    #[serde(default)]
    pub lowercase_terms: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            summary_ratio: DEFAULT_SUMMARY_RATIO,
            lowercase_terms: false,
        }
    }
}

impl SummarizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < 1 {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be >= 1 (got {})",
                self.chunk_size
            )));
        }
        let r = self.summary_ratio;
        if !r.is_finite() || r <= 0.0 || r > 1.0 {
            return Err(Error::InvalidConfig(format!(
                "summary_ratio must be in (0, 1] (got {r})"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub original_word_count: usize,
    pub summary_word_count: usize,
    pub chunk_count: usize,
    /// Indices of the chunks that made it into `summary`, ascending.
    pub selected: Vec<usize>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    /// For callers that treat "nothing to summarize" as a failure.
    pub fn ensure_non_empty(self) -> Result<Self> {
        if self.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(self)
    }
}

/// A validated summarization configuration.
#[derive(Debug, Clone, Copy)]
pub struct Summarizer {
    cfg: SummarizerConfig,
}

impl Summarizer {
    pub fn new(cfg: SummarizerConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.cfg
    }

    pub fn summarize(&self, text: &str) -> Result<Summary> {
        let tokens = tokenize(text);
        let chunks = segment(&tokens, self.cfg.chunk_size)?;
        let weights = weigh(
            &chunks,
            &WeightingOptions {
                lowercase: self.cfg.lowercase_terms,
            },
        );
        let selection = select(&chunks, &weights.scores(), self.cfg.summary_ratio);

        let summary_word_count = tokenize(&selection.text).len();
        tracing::debug!(
            tokens = tokens.len(),
            chunks = chunks.len(),
            vocabulary = weights.vocabulary_len(),
            selected = selection.indices.len(),
            "summarized"
        );
        Ok(Summary {
            summary: selection.text,
            original_word_count: tokens.len(),
            summary_word_count,
            chunk_count: chunks.len(),
            selected: selection.indices,
        })
    }
}

/// Validate parameters, then summarize `text`.
///
/// Empty (or whitespace-only) text yields an empty summary with zero counts.
pub fn summarize(text: &str, chunk_size: usize, summary_ratio: f64) -> Result<Summary> {
    Summarizer::new(SummarizerConfig {
        chunk_size,
        summary_ratio,
        lowercase_terms: false,
    })?
    .summarize(text)
}
