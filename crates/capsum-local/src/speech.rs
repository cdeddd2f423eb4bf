//! Spoken output via local text-to-speech CLIs.
//!
//! The engine is an explicit value built by the caller and handed to whatever needs to
//! speak; there is no process-wide speech state.

use std::path::PathBuf;
use std::time::Duration;

use capsum_core::{Error, Result, SpeechSink};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::shellout::{has, run_bounded_with_stdin, timeout_from_env_ms};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Pick a female voice when the engine has one.
    pub prefer_female: bool,
    /// Speaking rate in words per minute.
    pub rate_wpm: u32,
    /// 0.0..=1.0
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            prefer_female: true,
            rate_wpm: 150,
            volume: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeechEngine {
    EspeakNg,
    Espeak,
    /// macOS `say`.
    Say,
}

impl SpeechEngine {
    /// Preference order used by [`SpeechEngine::detect`].
    pub const ALL: [SpeechEngine; 3] = [Self::EspeakNg, Self::Espeak, Self::Say];

    pub fn binary(self) -> &'static str {
        match self {
            Self::EspeakNg => "espeak-ng",
            Self::Espeak => "espeak",
            Self::Say => "say",
        }
    }

    pub fn detect() -> Option<Self> {
        Self::ALL.into_iter().find(|e| has(e.binary()))
    }
}

#[derive(Debug, Clone)]
pub struct ShellSpeech {
    engine: SpeechEngine,
    settings: VoiceSettings,
    timeout: Duration,
    /// Executable to run instead of the engine's usual binary name.
    program: Option<PathBuf>,
}

impl ShellSpeech {
    pub fn new(engine: SpeechEngine, settings: VoiceSettings) -> Self {
        Self {
            engine,
            settings,
            timeout: timeout_from_env_ms("CAPSUM_SPEECH_TIMEOUT_MS", 600_000),
            program: None,
        }
    }

    /// First installed engine, or `NotConfigured` when there is none.
    pub fn detect(settings: VoiceSettings) -> Result<Self> {
        let engine = SpeechEngine::detect().ok_or_else(|| {
            Error::NotConfigured(
                "no speech engine found on PATH (install espeak-ng, espeak, or use macOS say)"
                    .to_string(),
            )
        })?;
        Ok(Self::new(engine, settings))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `program` with this engine's flags (e.g. a wrapper script or a non-PATH install).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn engine(&self) -> SpeechEngine {
        self.engine
    }

    /// Engine flags. The text itself always travels on stdin, never in argv.
    pub(crate) fn args(&self) -> Vec<String> {
        let s = &self.settings;
        match self.engine {
            SpeechEngine::EspeakNg | SpeechEngine::Espeak => {
                let voice = if s.prefer_female { "en+f3" } else { "en" };
                vec![
                    "-v".to_string(),
                    voice.to_string(),
                    "-s".to_string(),
                    s.rate_wpm.to_string(),
                    // espeak amplitude: 0..200, 100 is normal.
                    "-a".to_string(),
                    ((s.volume.clamp(0.0, 1.0) * 100.0).round() as u32).to_string(),
                    "--stdin".to_string(),
                ]
            }
            SpeechEngine::Say => {
                let mut args = Vec::new();
                if s.prefer_female {
                    args.push("-v".to_string());
                    args.push("Samantha".to_string());
                }
                args.push("-r".to_string());
                args.push(s.rate_wpm.to_string());
                args.push("-f".to_string());
                args.push("-".to_string());
                args
            }
        }
    }

    /// Bytes written to the engine's stdin.
    pub(crate) fn stdin_text(&self, text: &str) -> String {
        match self.engine {
            SpeechEngine::EspeakNg | SpeechEngine::Espeak => text.to_string(),
            // `say` has no volume flag; it takes an embedded command instead.
            SpeechEngine::Say => format!(
                "[[volm {:.2}]] {text}",
                self.settings.volume.clamp(0.0, 1.0)
            ),
        }
    }
}

#[async_trait::async_trait]
impl SpeechSink for ShellSpeech {
    fn name(&self) -> &'static str {
        self.engine.binary()
    }

    async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let program = self
            .program
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.engine.binary()));
        let mut cmd = Command::new(&program);
        cmd.args(self.args());
        tracing::debug!(engine = self.engine.binary(), chars = text.len(), "speaking summary");
        let input = self.stdin_text(text);
        run_bounded_with_stdin(cmd, input.as_bytes(), self.timeout)
            .await
            .map_err(|code| match code {
                "shellout_tool_not_found" => {
                    Error::NotConfigured(format!("{} not found", program.display()))
                }
                other => Error::Speech(other.to_string()),
            })
    }
}
