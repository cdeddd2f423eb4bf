//! Bounded shellouts to well-known local CLIs (`yt-dlp`, `espeak-ng`, `say`).
//!
//! - **Opportunistic**: tools are used when present on `PATH`.
//! - **Bounded**: every child runs under a timeout and is killed on expiry.
//! - **Deterministic preference order** when several tools would do.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub(crate) fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn env_usize(key: &str, default: usize) -> usize {
    env(key)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
}

pub fn timeout_from_env_ms(key: &str, default_ms: u64) -> Duration {
    let ms = env(key)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default_ms)
        .clamp(50, 600_000);
    Duration::from_millis(ms)
}

pub fn which(bin: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let cand = dir.join(bin);
        if cand.is_file() {
            return Some(cand);
        }
        if cfg!(windows) {
            let cand = dir.join(format!("{bin}.exe"));
            if cand.is_file() {
                return Some(cand);
            }
        }
    }
    None
}

pub fn has(bin: &str) -> bool {
    which(bin).is_some()
}

/// Run `cmd` to completion, discarding its output, killing it after `timeout`.
///
/// Errors are short stable codes, safe to surface as reasons.
pub async fn run_bounded(cmd: Command, timeout: Duration) -> Result<(), &'static str> {
    run(cmd, None, timeout).await
}

/// Like [`run_bounded`], but writes `input` to the child's stdin and then closes it.
///
/// Arbitrarily large inputs avoid the per-argument size limit of `execve`.
pub async fn run_bounded_with_stdin(
    cmd: Command,
    input: &[u8],
    timeout: Duration,
) -> Result<(), &'static str> {
    run(cmd, Some(input), timeout).await
}

async fn run(mut cmd: Command, input: Option<&[u8]>, timeout: Duration) -> Result<(), &'static str> {
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            "shellout_tool_not_found"
        } else {
            "shellout_spawn_failed"
        }
    })?;

    let stdin = child.stdin.take();
    let finished = tokio::time::timeout(timeout, async {
        if let (Some(mut w), Some(bytes)) = (stdin, input) {
            // A child that exits without reading everything is judged by its status.
            if let Err(e) = w.write_all(bytes).await {
                tracing::debug!(error = %e, "child closed stdin early");
            }
            drop(w);
        }
        child.wait().await
    })
    .await;

    match finished {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(_)) => Err("shellout_nonzero_exit"),
        Ok(Err(_)) => Err("shellout_wait_failed"),
        Err(_elapsed) => {
            let _ = child.kill().await;
            Err("shellout_timeout")
        }
    }
}
