use std::collections::BTreeMap;

use capsum_core::{Error, Result, Transcript, TranscriptProvider, TranscriptRequest};

pub mod prompt;
pub mod shellout;
pub mod speech;
pub mod youtube;

/// In-memory transcripts keyed by video id (offline runs, fixtures).
#[derive(Debug, Clone, Default)]
pub struct StaticTranscripts {
    by_id: BTreeMap<String, String>,
}

impl StaticTranscripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, video_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.by_id.insert(video_id.into(), text.into());
        self
    }
}

#[async_trait::async_trait]
impl TranscriptProvider for StaticTranscripts {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn transcript(&self, req: &TranscriptRequest) -> Result<Transcript> {
        let unavailable = |reason: &str| Error::TranscriptUnavailable {
            video_id: req.video_id.clone(),
            reason: reason.to_string(),
        };
        let text = self
            .by_id
            .get(&req.video_id)
            .ok_or_else(|| unavailable("static_unknown_video"))?;
        if text.trim().is_empty() {
            return Err(unavailable("static_empty_transcript"));
        }
        let (text, truncated) = match req.max_chars {
            Some(max) if text.chars().count() > max => (text.chars().take(max).collect(), true),
            _ => (text.clone(), false),
        };
        Ok(Transcript {
            video_id: req.video_id.clone(),
            text,
            provider: self.name().to_string(),
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsum_core::summarize;

    #[tokio::test]
    async fn static_transcripts_feed_the_summarizer() {
        let p = StaticTranscripts::new().with(
            "abc",
            "one two three four five six seven eight nine ten eleven twelve",
        );
        let t = p.transcript(&TranscriptRequest::new("abc")).await.unwrap();
        assert_eq!(t.provider, "static");
        assert!(!t.truncated);

        let s = summarize(&t.text, 4, 0.34).unwrap();
        assert_eq!(s.chunk_count, 3);
        assert_eq!(s.selected.len(), 1);
    }

    #[tokio::test]
    async fn unknown_or_empty_videos_are_unavailable() {
        let p = StaticTranscripts::new().with("blank", "   ");
        for id in ["missing", "blank"] {
            let err = p.transcript(&TranscriptRequest::new(id)).await.unwrap_err();
            assert!(
                matches!(err, Error::TranscriptUnavailable { ref video_id, .. } if video_id == id),
                "{err:?}"
            );
        }
    }

    #[tokio::test]
    async fn static_transcripts_honor_max_chars() {
        let p = StaticTranscripts::new().with("abc", "abcdefghij");
        let mut req = TranscriptRequest::new("abc");
        req.max_chars = Some(4);
        let t = p.transcript(&req).await.unwrap();
        assert_eq!(t.text, "abcd");
        assert!(t.truncated);
    }
}
