use serde::Serialize;

pub(crate) const SCHEMA_VERSION: u64 = 1;

pub(crate) fn error_hint(code: &str) -> &'static str {
    match code {
        "input_decoding" => "The input is not valid UTF-8. Re-encode the file as UTF-8 and retry.",
        "empty_input" => "The input had no words to summarize. Pass non-empty text, a file, or a video URL with captions.",
        "transcript_unavailable" => "Captions could not be retrieved. Check that the video has (auto) captions in the requested --langs, that `yt-dlp` is installed and current, or pass the transcript text directly.",
        "invalid_url" => "Only YouTube video URLs are recognized (watch?v=, youtu.be/, /shorts/, /embed/, /live/). To summarize other content, pass raw text or --file.",
        "invalid_config" => "chunk_size must be >= 1 and ratio must be in (0, 1].",
        "not_configured" => "A required local tool is missing. Run `capsum doctor` to see what is available.",
        "speech_failed" => "The speech engine exited with an error. The summary itself is unaffected.",
        _ => "",
    }
}

/// Error object for a failure; `capsum_core::Error`s keep their stable code.
pub(crate) fn error_obj_from(err: &anyhow::Error) -> serde_json::Value {
    match err.downcast_ref::<capsum_core::Error>() {
        Some(e) => error_obj(e.code(), e, error_hint(e.code()), e.retryable()),
        None => error_obj("unexpected_error", err, "", false),
    }
}

pub(crate) fn error_obj(
    code: &str,
    message: impl ToString,
    hint: impl ToString,
    retryable: bool,
) -> serde_json::Value {
    #[derive(Serialize)]
    struct ErrorObject<'a> {
        code: &'a str,
        message: String,
        hint: String,
        retryable: bool,
    }

    let e = ErrorObject {
        code,
        message: message.to_string(),
        hint: hint.to_string(),
        retryable,
    };
    match serde_json::to_value(&e) {
        Ok(v) => v,
        Err(_) => serde_json::json!({
            "code": e.code,
            "message": e.message,
            "hint": e.hint,
            "retryable": e.retryable,
        }),
    }
}

pub(crate) fn add_envelope_fields(payload: &mut serde_json::Value, kind: &str, elapsed_ms: u128) {
    payload["schema_version"] = serde_json::json!(SCHEMA_VERSION);
    payload["kind"] = serde_json::json!(kind);
    payload["elapsed_ms"] = serde_json::json!(elapsed_ms);
    // Keep these keys present so clients need no "missing vs null" branching.
    if payload.get("request").is_none() {
        payload["request"] = serde_json::Value::Null;
    }
    if payload.get("error").is_none() {
        payload["error"] = serde_json::Value::Null;
    }
}

/// Process exit code for a failed run.
pub(crate) fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<capsum_core::Error>().map(|e| e.code()) {
        Some("invalid_config" | "invalid_url" | "input_decoding") => 2,
        Some("empty_input") => 3,
        Some("transcript_unavailable") => 4,
        Some("not_configured") => 5,
        _ => 1,
    }
}
