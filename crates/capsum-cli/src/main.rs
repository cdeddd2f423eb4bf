use anyhow::Result;
use capsum_core::{SpeechSink, Summarizer, SummarizerConfig};
use capsum_local::speech::{ShellSpeech, SpeechEngine, VoiceSettings};
use capsum_local::youtube::{parse_langs, YtDlpTranscripts};
use clap::{Parser, Subcommand};

mod envelope;
mod input;

#[derive(Parser, Debug)]
#[command(name = "capsum")]
#[command(about = "Extractive TF-IDF summaries of long transcripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a YouTube video's captions, raw text, a file, or stdin.
    Summarize(SummarizeCmd),
    /// Report which local tools (yt-dlp, speech engines) are available (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct SummarizeCmd {
    /// YouTube URL, raw text, or `-` to read stdin.
    input: Option<String>,
    /// Read the document from a file instead (UTF-8).
    #[arg(long, conflicts_with = "input")]
    file: Option<std::path::PathBuf>,
    /// Tokens per chunk.
    #[arg(long, env = "CAPSUM_CHUNK_SIZE", default_value_t = capsum_core::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Fraction of chunks kept in the summary, in (0, 1].
    #[arg(long, env = "CAPSUM_RATIO", default_value_t = capsum_core::DEFAULT_SUMMARY_RATIO)]
    ratio: f64,
    /// Case-fold terms before TF-IDF weighting.
    #[arg(
        long,
        env = "CAPSUM_LOWERCASE_TERMS",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false
    )]
    lowercase_terms: bool,
    /// Caption languages in preference order (comma-separated).
    #[arg(long, env = "CAPSUM_YOUTUBE_LANGS", default_value = "en,en-US")]
    langs: String,
    /// Timeout for the caption download (ms). Defaults to CAPSUM_YTDLP_TIMEOUT_MS or 60000.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
    /// Read the summary aloud: no|yes|ask
    #[arg(long, default_value = "no")]
    speak: String,
    /// In text output, print the original document before the summary.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    show_original: bool,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_output_format(s: &str) -> std::result::Result<OutputFormat, capsum_core::Error> {
    match s.trim().to_ascii_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(capsum_core::Error::InvalidConfig(format!(
            "output must be one of json|text (got {other:?})"
        ))),
    }
}

/// For commands without a structured error path: report and exit 2.
fn output_format_or_exit(s: &str) -> OutputFormat {
    parse_output_format(s).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeakMode {
    No,
    Yes,
    Ask,
}

fn parse_speak_mode(s: &str) -> std::result::Result<SpeakMode, capsum_core::Error> {
    match s.trim().to_ascii_lowercase().as_str() {
        "no" | "false" | "0" => Ok(SpeakMode::No),
        "yes" | "true" | "1" => Ok(SpeakMode::Yes),
        "ask" => Ok(SpeakMode::Ask),
        other => Err(capsum_core::Error::InvalidConfig(format!(
            "speak must be one of no|yes|ask (got {other:?})"
        ))),
    }
}

/// Load `CAPSUM_ENV_FILE` (dotenv syntax) into the process environment.
///
/// Variables already set in the environment win. Must run before any threads start.
fn load_env_file() -> Option<String> {
    let path = std::env::var("CAPSUM_ENV_FILE").ok()?;
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    dotenvy::from_path(path)
        .err()
        .map(|e| format!("could not load CAPSUM_ENV_FILE {path}: {e}"))
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stderr only: stdout carries results.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

struct SpeechOutcome {
    requested: bool,
    engine: Option<&'static str>,
    error: Option<serde_json::Value>,
}

impl SpeechOutcome {
    fn skipped() -> Self {
        Self {
            requested: false,
            engine: None,
            error: None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requested": self.requested,
            "ok": self.requested && self.error.is_none(),
            "engine": self.engine,
            "error": self.error,
        })
    }
}

async fn speak_summary(summary: &str, mode: SpeakMode) -> SpeechOutcome {
    let wanted = match mode {
        SpeakMode::No => false,
        SpeakMode::Yes => true,
        SpeakMode::Ask => capsum_local::prompt::confirm(
            std::io::stdin().lock(),
            std::io::stderr(),
            "Do you want to hear the summary?",
        )
        .unwrap_or(false),
    };
    if !wanted {
        return SpeechOutcome::skipped();
    }

    let speech = match ShellSpeech::detect(VoiceSettings::default()) {
        Ok(s) => s,
        Err(e) => {
            let err = anyhow::Error::new(e);
            return SpeechOutcome {
                requested: true,
                engine: None,
                error: Some(envelope::error_obj_from(&err)),
            };
        }
    };
    let engine = Some(speech.name());
    match speech.speak(summary).await {
        Ok(()) => SpeechOutcome {
            requested: true,
            engine,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "speech failed");
            let err = anyhow::Error::new(e);
            SpeechOutcome {
                requested: true,
                engine,
                error: Some(envelope::error_obj_from(&err)),
            }
        }
    }
}

/// Runs the summarize command. Text output is printed here; JSON output is returned.
async fn run_summarize(
    args: &SummarizeCmd,
    request: &serde_json::Value,
) -> Result<Option<serde_json::Value>> {
    // Validate everything before touching the network or stdin.
    let format = parse_output_format(&args.output)?;
    let summarizer = Summarizer::new(SummarizerConfig {
        chunk_size: args.chunk_size,
        summary_ratio: args.ratio,
        lowercase_terms: args.lowercase_terms,
    })?;
    let speak = parse_speak_mode(&args.speak)?;
    let source = input::classify(args.input.as_deref(), args.file.as_deref())?;
    if speak == SpeakMode::Ask && source == input::Source::Stdin {
        return Err(capsum_core::Error::InvalidConfig(
            "--speak ask needs stdin for the answer, but the document is read from stdin; use --speak yes or --file".to_string(),
        )
        .into());
    }

    let provider = YtDlpTranscripts::from_env();
    let langs = parse_langs(&args.langs);
    let doc = input::load(&source, &provider, &langs, args.timeout_ms).await?;

    let summary = summarizer.summarize(&doc.text)?.ensure_non_empty()?;
    tracing::info!(
        source = source.kind(),
        original_words = summary.original_word_count,
        summary_words = summary.summary_word_count,
        "summary ready"
    );

    if format == OutputFormat::Text {
        if args.show_original {
            println!("Original Text:\n{}\n", doc.text);
        }
        println!("Summary:\n{}\n", summary.summary);
        println!("Original Word Count: {}", summary.original_word_count);
        println!("Summary Word Count: {}", summary.summary_word_count);
        let outcome = speak_summary(&summary.summary, speak).await;
        if let Some(e) = &outcome.error {
            eprintln!(
                "warning: could not read the summary aloud: {}",
                e["message"].as_str().unwrap_or("")
            );
        }
        return Ok(None);
    }

    // Speak before printing so the JSON reports how it went.
    let outcome = speak_summary(&summary.summary, speak).await;
    Ok(Some(serde_json::json!({
        "ok": true,
        "request": request,
        "source": source.kind(),
        "transcript": doc.transcript_provider.as_ref().map(|p| serde_json::json!({
            "provider": p,
            "truncated": doc.truncated,
        })),
        "summary": summary.summary,
        "original_text": doc.text,
        "original_word_count": summary.original_word_count,
        "summary_word_count": summary.summary_word_count,
        "chunk_count": summary.chunk_count,
        "selected": summary.selected,
        "speech": outcome.to_json(),
    })))
}

fn main() -> Result<()> {
    // The environment is only mutated here, before the runtime spawns worker threads.
    let env_file_warning = load_env_file();
    init_tracing();
    if let Some(w) = env_file_warning {
        tracing::warn!("{w}");
    }

    let cli = Cli::parse();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Summarize(args) => {
            let t0 = std::time::Instant::now();
            let request = serde_json::json!({
                "chunk_size": args.chunk_size,
                "summary_ratio": args.ratio,
                "lowercase_terms": args.lowercase_terms,
                "langs": parse_langs(&args.langs),
            });
            // Unparseable formats report their error as text.
            let text_mode = !matches!(parse_output_format(&args.output), Ok(OutputFormat::Json));
            match run_summarize(&args, &request).await {
                Ok(Some(mut payload)) => {
                    envelope::add_envelope_fields(
                        &mut payload,
                        "summarize",
                        t0.elapsed().as_millis(),
                    );
                    println!("{payload}");
                }
                Ok(None) => {}
                Err(err) => {
                    let code = envelope::exit_code_for(&err);
                    let error = envelope::error_obj_from(&err);
                    if text_mode {
                        eprintln!("Error: {err:#}");
                        if let Some(h) = error["hint"].as_str().filter(|h| !h.is_empty()) {
                            eprintln!("hint: {h}");
                        }
                    } else {
                        let mut payload = serde_json::json!({
                            "ok": false,
                            "request": request,
                            "error": error,
                        });
                        envelope::add_envelope_fields(
                            &mut payload,
                            "summarize",
                            t0.elapsed().as_millis(),
                        );
                        println!("{payload}");
                    }
                    std::process::exit(code);
                }
            }
        }
        Commands::Doctor(args) => {
            let t0 = std::time::Instant::now();
            let ytdlp_bin = std::env::var("CAPSUM_YTDLP_BIN")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "yt-dlp".to_string());
            let ytdlp_ok = capsum_local::shellout::has(&ytdlp_bin)
                || std::path::Path::new(&ytdlp_bin).is_file();
            let engines = SpeechEngine::ALL
                .into_iter()
                .filter(|e| capsum_local::shellout::has(e.binary()))
                .map(|e| e.binary())
                .collect::<Vec<_>>();

            let checks = vec![
                serde_json::json!({
                    "name": "ytdlp_available",
                    "ok": ytdlp_ok,
                    "optional": false,
                    "message": if ytdlp_ok { "yt-dlp found" } else { "yt-dlp not found" },
                    "hint": if ytdlp_ok { "" } else { "Install yt-dlp (or set CAPSUM_YTDLP_BIN) to summarize YouTube URLs. Text, --file and stdin inputs work without it." },
                }),
                serde_json::json!({
                    "name": "speech_engine_available",
                    "ok": !engines.is_empty(),
                    "optional": true,
                    "message": if engines.is_empty() { "no speech engine found" } else { "speech engine found" },
                    "hint": if engines.is_empty() { "Install espeak-ng (or use macOS `say`) to enable --speak." } else { "" },
                }),
            ];
            let ok = checks.iter().all(|c| {
                c["optional"].as_bool().unwrap_or(false) || c["ok"].as_bool().unwrap_or(false)
            });
            let mut payload = serde_json::json!({
                "ok": ok,
                "name": "capsum",
                "version": env!("CARGO_PKG_VERSION"),
                "platform": {
                    "os": std::env::consts::OS,
                    "arch": std::env::consts::ARCH,
                },
                "configured": {
                    "ytdlp_bin": ytdlp_bin,
                    "speech_engines": engines,
                    "env_file": std::env::var("CAPSUM_ENV_FILE").is_ok(),
                },
                "checks": checks,
            });
            envelope::add_envelope_fields(&mut payload, "doctor", t0.elapsed().as_millis());
            match output_format_or_exit(&args.output) {
                OutputFormat::Text => {
                    println!("capsum {} (ok={})", env!("CARGO_PKG_VERSION"), ok);
                    println!("ytdlp_bin: {}", ytdlp_bin);
                    println!(
                        "speech_engines: {}",
                        if engines.is_empty() {
                            "none".to_string()
                        } else {
                            engines.join(",")
                        }
                    );
                    println!("checks:");
                    if let Some(arr) = payload["checks"].as_array() {
                        for c in arr {
                            let name = c["name"].as_str().unwrap_or("?");
                            let ok = c["ok"].as_bool().unwrap_or(false);
                            println!("- {}: {}", name, if ok { "ok" } else { "fail" });
                        }
                    }
                }
                OutputFormat::Json => println!("{payload}"),
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": envelope::SCHEMA_VERSION,
                "kind": "version",
                "ok": true,
                "name": "capsum",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match output_format_or_exit(&args.output) {
                OutputFormat::Text => println!("capsum {}", env!("CARGO_PKG_VERSION")),
                OutputFormat::Json => println!("{}", v),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_rejects_unknown_values() {
        assert_eq!(parse_output_format("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(parse_output_format(" text").unwrap(), OutputFormat::Text);
        for bad in ["yaml", "", "jsonl"] {
            assert!(
                matches!(
                    parse_output_format(bad),
                    Err(capsum_core::Error::InvalidConfig(_))
                ),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn speak_mode_parses_known_values_only() {
        assert_eq!(parse_speak_mode("ASK").unwrap(), SpeakMode::Ask);
        assert_eq!(parse_speak_mode(" yes ").unwrap(), SpeakMode::Yes);
        assert_eq!(parse_speak_mode("no").unwrap(), SpeakMode::No);
        assert!(matches!(
            parse_speak_mode("loud"),
            Err(capsum_core::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn cli_parses_summarize_defaults() {
        let cli = Cli::try_parse_from(["capsum", "summarize", "some text"]).unwrap();
        let Commands::Summarize(args) = cli.command else {
            panic!("expected summarize");
        };
        assert_eq!(args.input.as_deref(), Some("some text"));
        assert_eq!(args.output, "text");
        assert_eq!(args.speak, "no");
        assert!(args.show_original);
        assert!(!args.lowercase_terms);
    }

    #[test]
    fn lowercase_terms_is_a_bare_flag_or_takes_a_bool() {
        let cli = Cli::try_parse_from(["capsum", "summarize", "--lowercase-terms", "x"]).unwrap();
        let Commands::Summarize(args) = cli.command else {
            panic!("expected summarize");
        };
        assert!(args.lowercase_terms);
        assert_eq!(args.input.as_deref(), Some("x"));

        let cli =
            Cli::try_parse_from(["capsum", "summarize", "--lowercase-terms=false", "x"]).unwrap();
        let Commands::Summarize(args) = cli.command else {
            panic!("expected summarize");
        };
        assert!(!args.lowercase_terms);
    }

    #[test]
    fn file_and_positional_input_conflict() {
        assert!(Cli::try_parse_from(["capsum", "summarize", "x", "--file", "a.txt"]).is_err());
    }
}
