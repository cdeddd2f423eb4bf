//! YouTube helpers (video ids, caption transcripts).
//!
//! Design goals:
//! - Bounded (size/time).
//! - Env-configured knobs, no silent network: captions come from `yt-dlp`, which already
//!   tracks YouTube's moving target, rather than from HTML scraping.

use std::path::{Path, PathBuf};
use std::time::Duration;

use capsum_core::{Error, Result, Transcript, TranscriptProvider, TranscriptRequest};
use tokio::process::Command;

use crate::shellout::{env, env_usize, run_bounded, timeout_from_env_ms};

pub fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com"
        || h == "www.youtube.com"
        || h == "m.youtube.com"
        || h == "youtu.be"
        || h.ends_with(".youtube.com")
}

fn plausible_id(s: &str) -> Option<String> {
    let s = s.trim();
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some(s.to_string())
    } else {
        None
    }
}

pub fn youtube_video_id(u: &url::Url) -> Option<String> {
    let host = u.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    // youtu.be/<id>
    if host.eq_ignore_ascii_case("youtu.be") {
        return plausible_id(u.path_segments()?.next()?);
    }

    // youtube.com/watch?v=<id>
    if u.path().starts_with("/watch") {
        if let Some((_, v)) = u.query_pairs().find(|(k, _)| k == "v") {
            return plausible_id(&v);
        }
    }

    // youtube.com/shorts/<id>, /embed/<id>, /live/<id>
    let mut segs = u.path_segments()?;
    let a = segs.next().unwrap_or("");
    let b = segs.next().unwrap_or("");
    if matches!(a, "shorts" | "embed" | "live") {
        return plausible_id(b);
    }

    None
}

/// Like [`youtube_video_id`], but accepts scheme-less input such as `youtu.be/<id>`.
pub fn video_id_from_str(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return None;
    }
    let parsed = url::Url::parse(s)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| url::Url::parse(&format!("https://{s}")).ok())?;
    youtube_video_id(&parsed)
}

pub fn parse_langs(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn strip_cue_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for ch in line.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// WebVTT -> plain caption text, capped at `max_chars`.
///
/// Header/NOTE/STYLE blocks, cue ids, timing lines and inline markup are dropped.
/// Rolling auto-captions repeat the previous line in each cue; consecutive duplicates
/// are collapsed. Cue lines are joined with single spaces.
///
/// Returns the text and whether it was truncated.
pub fn vtt_to_text(vtt: &str, max_chars: usize) -> (String, bool) {
    let mut out = String::new();
    let mut chars = 0usize;
    let mut last: Option<String> = None;

    let normalized = vtt.replace("\r\n", "\n");
    for block in normalized.split("\n\n") {
        let mut lines = block.lines();
        // Everything up to and including the timing line is cue metadata.
        if !lines.by_ref().any(|l| l.contains("-->")) {
            continue;
        }
        for raw in lines {
            let cleaned = strip_cue_markup(raw)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if cleaned.is_empty()
                || cleaned.contains("-->")
                || last.as_deref() == Some(cleaned.as_str())
            {
                continue;
            }
            let sep = usize::from(!out.is_empty());
            let n = cleaned.chars().count();
            if chars + sep + n > max_chars {
                let room = max_chars.saturating_sub(chars + sep);
                if room > 0 {
                    if sep == 1 {
                        out.push(' ');
                    }
                    out.extend(cleaned.chars().take(room));
                }
                return (out, true);
            }
            if sep == 1 {
                out.push(' ');
            }
            out.push_str(&cleaned);
            chars += sep + n;
            last = Some(cleaned);
        }
    }
    (out, false)
}

/// Choose the caption file matching the earliest preferred language, else the first by name.
fn pick_vtt(mut files: Vec<PathBuf>, langs: &[String]) -> Option<PathBuf> {
    files.sort();
    for lang in langs {
        let suffix = format!(".{lang}.vtt");
        if let Some(p) = files.iter().find(|p| {
            p.file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.ends_with(&suffix))
        }) {
            return Some(p.clone());
        }
    }
    files.into_iter().next()
}

fn vtt_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    rd.flatten()
        .map(|ent| ent.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("vtt"))
        .collect()
}

/// Transcript provider backed by the `yt-dlp` CLI.
#[derive(Debug, Clone)]
pub struct YtDlpTranscripts {
    pub binary: String,
    pub timeout: Duration,
    pub max_chars: usize,
}

impl Default for YtDlpTranscripts {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            timeout: Duration::from_secs(60),
            max_chars: 200_000,
        }
    }
}

impl YtDlpTranscripts {
    /// `CAPSUM_YTDLP_BIN`, `CAPSUM_YTDLP_TIMEOUT_MS`, `CAPSUM_YOUTUBE_MAX_CHARS`.
    pub fn from_env() -> Self {
        Self {
            binary: env("CAPSUM_YTDLP_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            timeout: timeout_from_env_ms("CAPSUM_YTDLP_TIMEOUT_MS", 60_000),
            max_chars: env_usize("CAPSUM_YOUTUBE_MAX_CHARS", 200_000).min(2_000_000),
        }
    }

    fn unavailable(req: &TranscriptRequest, reason: impl Into<String>) -> Error {
        Error::TranscriptUnavailable {
            video_id: req.video_id.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl TranscriptProvider for YtDlpTranscripts {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn transcript(&self, req: &TranscriptRequest) -> Result<Transcript> {
        let url = req
            .url
            .clone()
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", req.video_id));
        let langs = if req.langs.is_empty() {
            vec!["en".to_string(), "en-US".to_string()]
        } else {
            req.langs.clone()
        };
        let max_chars = req.max_chars.unwrap_or(self.max_chars);
        let timeout = req.timeout().unwrap_or(self.timeout);

        let tmpdir =
            tempfile::tempdir().map_err(|_| Self::unavailable(req, "youtube_tempdir_failed"))?;
        let out_tmpl = tmpdir.path().join("%(id)s.%(ext)s");

        // Human subs and auto subs both requested; yt-dlp writes whichever exist.
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--skip-download")
            .arg("--write-sub")
            .arg("--write-auto-sub")
            .arg("--sub-lang")
            .arg(langs.join(","))
            .arg("--sub-format")
            .arg("vtt")
            .arg("-o")
            .arg(out_tmpl.to_string_lossy().to_string())
            .arg("--no-warnings")
            .arg(&url);

        tracing::debug!(video_id = %req.video_id, binary = %self.binary, ?timeout, "fetching captions");
        run_bounded(cmd, timeout).await.map_err(|code| {
            let reason = match code {
                "shellout_tool_not_found" => "youtube_ytdlp_not_found",
                "shellout_timeout" => "youtube_ytdlp_timeout",
                "shellout_nonzero_exit" => "youtube_ytdlp_nonzero_exit",
                _ => "youtube_ytdlp_failed",
            };
            tracing::warn!(video_id = %req.video_id, reason, "caption fetch failed");
            Self::unavailable(req, reason)
        })?;

        let Some(path) = pick_vtt(vtt_files(tmpdir.path()), &langs) else {
            return Err(Self::unavailable(req, "youtube_no_captions_found"));
        };
        let vtt = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Self::unavailable(req, format!("youtube_read_failed: {e}")))?;
        let (text, truncated) = vtt_to_text(&vtt, max_chars);
        if text.trim().is_empty() {
            return Err(Self::unavailable(req, "youtube_empty_captions"));
        }
        Ok(Transcript {
            video_id: req.video_id.clone(),
            text,
            provider: self.name().to_string(),
            truncated,
        })
    }
}
