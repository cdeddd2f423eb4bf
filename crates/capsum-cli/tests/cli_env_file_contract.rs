fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("word{i:02}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn summarize_json(env_file: &std::path::Path, chunk_size_env: Option<&str>) -> serde_json::Value {
    let bin = assert_cmd::cargo::cargo_bin!("capsum");
    let mut cmd = std::process::Command::new(bin);
    cmd.args(["summarize", "--output", "json"])
        .arg(words(30))
        .env("CAPSUM_ENV_FILE", env_file)
        .env_remove("CAPSUM_CHUNK_SIZE")
        .env_remove("CAPSUM_RATIO");
    if let Some(v) = chunk_size_env {
        cmd.env("CAPSUM_CHUNK_SIZE", v);
    }
    let out = cmd.output().expect("run capsum summarize");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).expect("parse json")
}

#[test]
fn env_file_supplies_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("capsum.env");
    std::fs::write(&path, "# tuning\nCAPSUM_CHUNK_SIZE=5\nCAPSUM_RATIO=\"0.5\"\n").expect("write");

    let v = summarize_json(&path, None);
    assert_eq!(v["request"]["chunk_size"].as_u64(), Some(5));
    assert_eq!(v["request"]["summary_ratio"].as_f64(), Some(0.5));
    assert_eq!(v["chunk_count"].as_u64(), Some(6));
    assert_eq!(v["selected"].as_array().map(|a| a.len()), Some(3));
}

#[test]
fn process_environment_wins_over_env_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("capsum.env");
    std::fs::write(&path, "CAPSUM_CHUNK_SIZE=5\n").expect("write");

    let v = summarize_json(&path, Some("10"));
    assert_eq!(v["request"]["chunk_size"].as_u64(), Some(10));
    assert_eq!(v["chunk_count"].as_u64(), Some(3));
}

#[test]
fn missing_env_file_warns_but_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bin = assert_cmd::cargo::cargo_bin!("capsum");
    let out = std::process::Command::new(bin)
        .args(["summarize", "--output", "json", "a few words"])
        .env("CAPSUM_ENV_FILE", dir.path().join("absent.env"))
        .env_remove("RUST_LOG")
        .output()
        .expect("run capsum summarize");
    assert!(out.status.success());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("CAPSUM_ENV_FILE"), "stderr: {err}");
}
