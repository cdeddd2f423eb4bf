//! Extractive transcript summarization.
//!
//! This crate is IO-free: it holds the summarization engine (tokenize, segment, weigh,
//! select) and the backend-agnostic types/traits that local collaborators implement.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod pipeline;
pub mod select;
pub mod segment;
pub mod tfidf;
pub mod tokenize;

pub use pipeline::{summarize, Summarizer, SummarizerConfig, Summary};
pub use select::{select, select_count, Selection};
pub use segment::{segment, Chunk};
pub use tfidf::{weigh, TermWeights, WeightingOptions};
pub use tokenize::{decode_document, tokenize, tokenize_bytes};

pub const DEFAULT_CHUNK_SIZE: usize = 15;
pub const DEFAULT_SUMMARY_RATIO: f64 = 0.40;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("input is not valid utf-8 (valid up to byte {valid_up_to})")]
    InputDecoding { valid_up_to: usize },
    #[error("input has no tokens")]
    EmptyInput,
    #[error("transcript unavailable for {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("speech failed: {0}")]
    Speech(String),
}

impl Error {
    /// Stable snake_case identifier for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputDecoding { .. } => "input_decoding",
            Self::EmptyInput => "empty_input",
            Self::TranscriptUnavailable { .. } => "transcript_unavailable",
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidConfig(_) => "invalid_config",
            Self::NotConfigured(_) => "not_configured",
            Self::Speech(_) => "speech_failed",
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::TranscriptUnavailable { .. } | Self::Speech(_) => true,
            Self::InputDecoding { .. }
            | Self::EmptyInput
            | Self::InvalidUrl(_)
            | Self::InvalidConfig(_)
            | Self::NotConfigured(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRequest {
    pub video_id: String,
    /// Original URL, when the caller had one. Providers may prefer it over the id.
    pub url: Option<String>,
    /// Caption languages in preference order (e.g. `["en", "en-US"]`).
    pub langs: Vec<String>,
    pub timeout_ms: Option<u64>,
    /// Hard cap on transcript characters.
    pub max_chars: Option<usize>,
}

impl TranscriptRequest {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            url: None,
            langs: vec!["en".to_string(), "en-US".to_string()],
            timeout_ms: None,
            max_chars: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    pub video_id: String,
    pub text: String,
    pub provider: String,
    pub truncated: bool,
}

/// Source of caption text for a video.
///
/// Implementations report any failure (including an empty transcript) as
/// [`Error::TranscriptUnavailable`], so callers never summarize sentinel text.
#[async_trait::async_trait]
pub trait TranscriptProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn transcript(&self, req: &TranscriptRequest) -> Result<Transcript>;
}

/// One-way audible output for a finished summary.
#[async_trait::async_trait]
pub trait SpeechSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn speak(&self, text: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable_snake_case() {
        let all = [
            Error::InputDecoding { valid_up_to: 3 },
            Error::EmptyInput,
            Error::TranscriptUnavailable {
                video_id: "abc".into(),
                reason: "no captions".into(),
            },
            Error::InvalidUrl("x".into()),
            Error::InvalidConfig("x".into()),
            Error::NotConfigured("x".into()),
            Error::Speech("x".into()),
        ];
        for e in &all {
            let c = e.code();
            assert!(!c.is_empty());
            assert!(c.chars().all(|ch| ch.is_ascii_lowercase() || ch == '_'));
        }
    }

    #[test]
    fn only_collaborator_failures_are_retryable() {
        assert!(Error::TranscriptUnavailable {
            video_id: "abc".into(),
            reason: "timeout".into()
        }
        .retryable());
        assert!(!Error::InvalidConfig("chunk_size".into()).retryable());
        assert!(!Error::EmptyInput.retryable());
    }

    #[test]
    fn transcript_request_defaults_to_english_captions() {
        let r = TranscriptRequest::new("dQw4w9WgXcQ");
        assert_eq!(r.langs, vec!["en", "en-US"]);
        assert!(r.timeout().is_none());
    }
}
