//! Resolve the user's input (URL, raw text, file, stdin) into a document.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use capsum_core::{decode_document, Error, TranscriptProvider, TranscriptRequest};
use capsum_local::youtube::video_id_from_str;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
    Video { video_id: String, url: String },
    Text(String),
    File(PathBuf),
    Stdin,
}

impl Source {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Video { .. } => "video",
            Self::Text(_) => "text",
            Self::File(_) => "file",
            Self::Stdin => "stdin",
        }
    }
}

fn looks_like_url(s: &str) -> bool {
    let l = s.to_ascii_lowercase();
    l.starts_with("http://") || l.starts_with("https://") || l.starts_with("www.")
}

/// Classify the positional input. A single whitespace-free token that parses as a
/// YouTube URL is a video; any other URL is rejected; everything else is text.
pub(crate) fn classify(input: Option<&str>, file: Option<&Path>) -> anyhow::Result<Source> {
    if let Some(p) = file {
        return Ok(Source::File(p.to_path_buf()));
    }
    let Some(raw) = input else {
        return Err(Error::EmptyInput.into());
    };
    let s = raw.trim();
    if s == "-" {
        return Ok(Source::Stdin);
    }
    if !s.is_empty() && !s.contains(char::is_whitespace) {
        if let Some(video_id) = video_id_from_str(s) {
            return Ok(Source::Video {
                video_id,
                url: s.to_string(),
            });
        }
        if looks_like_url(s) {
            return Err(Error::InvalidUrl(s.to_string()).into());
        }
    }
    Ok(Source::Text(raw.to_string()))
}

#[derive(Debug, Clone)]
pub(crate) struct Document {
    pub text: String,
    pub transcript_provider: Option<String>,
    pub truncated: bool,
}

impl Document {
    fn plain(text: String) -> Self {
        Self {
            text,
            transcript_provider: None,
            truncated: false,
        }
    }
}

fn decode_owned(bytes: Vec<u8>) -> anyhow::Result<String> {
    decode_document(&bytes)?;
    // Validated above; this conversion cannot fail.
    Ok(String::from_utf8(bytes)?)
}

pub(crate) async fn load(
    source: &Source,
    provider: &dyn TranscriptProvider,
    langs: &[String],
    timeout_ms: Option<u64>,
) -> anyhow::Result<Document> {
    match source {
        Source::Text(t) => Ok(Document::plain(t.clone())),
        Source::File(p) => {
            let bytes =
                std::fs::read(p).with_context(|| format!("read input file {}", p.display()))?;
            Ok(Document::plain(decode_owned(bytes)?))
        }
        Source::Stdin => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("read stdin")?;
            Ok(Document::plain(decode_owned(bytes)?))
        }
        Source::Video { video_id, url } => {
            let mut req = TranscriptRequest::new(video_id.clone());
            req.url = Some(url.clone());
            if !langs.is_empty() {
                req.langs = langs.to_vec();
            }
            req.timeout_ms = timeout_ms;
            let t = provider.transcript(&req).await?;
            Ok(Document {
                text: t.text,
                transcript_provider: Some(t.provider),
                truncated: t.truncated,
            })
        }
    }
}
