//! Headless runs of the pgchat binary against the mock database and LLM.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Builds a command isolated from the caller's config and environment.
fn pgchat(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pgchat"));
    cmd.arg("--config")
        .arg(home.join("config.toml"))
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("XDG_STATE_HOME", home)
        .env_remove("OPENAI_API_KEY")
        .env_remove("PGHOST")
        .env_remove("PGPORT")
        .env_remove("PGUSER")
        .env_remove("PGDATABASE")
        .env_remove("PGPASSWORD");
    cmd
}

/// Headless mock run connected as app@shop.
fn mock_run(home: &Path) -> Command {
    let mut cmd = pgchat(home);
    cmd.args(["--headless", "--mock-db", "--llm", "mock", "-U", "app", "-d", "shop"])
        .env("PGPASSWORD", "secret");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_ask_prints_text_transcript() {
    let home = TempDir::new().unwrap();
    let output = mock_run(home.path())
        .args(["--ask", "How many users?", "--ask", "/quit", "--ask", "never run"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("> How many users?\ncount\n3\n\n> /quit\n\n"));
    assert!(!text.contains("never run"));
    assert!(text.contains("Inputs: 2 processed, 0 failed"));
}

#[test]
fn test_json_output() {
    let home = TempDir::new().unwrap();
    let output = mock_run(home.path())
        .args(["--output", "json", "--ask", "What tables exist?"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["failures"], 0);
    assert_eq!(json["transcript"][0]["outcome"], "reply");
    assert_eq!(json["transcript"][0]["text"], "users, orders");
    assert_eq!(json["messages"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_missing_details_exit_with_failure() {
    let home = TempDir::new().unwrap();
    let output = pgchat(home.path())
        .args(["--headless", "--mock-db", "--llm", "mock", "--ask", "How many users?"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("[halted] Please provide all PostgreSQL connection details"));
    assert!(text.contains("missing: user, password, database"));
}

#[test]
fn test_script_file_to_output_file() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("session.txt");
    let report = home.path().join("report.txt");
    std::fs::write(
        &script,
        "# count things\nHow many orders?\n\n/set database analytics\n/config\n",
    )
    .unwrap();

    let output = mock_run(home.path())
        .arg("--script")
        .arg(&script)
        .arg("--output-file")
        .arg(&report)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let text = std::fs::read_to_string(&report).unwrap();
    assert!(text.contains("> How many orders?\ncount\n3\n"));
    assert!(text.contains("database set to analytics."));
    assert!(text.contains("analytics"));
    assert!(!text.contains("secret"));
    assert!(text.contains("Inputs: 3 processed, 0 failed"));
}

#[test]
fn test_missing_api_key_is_reported() {
    let home = TempDir::new().unwrap();
    let output = pgchat(home.path())
        .args(["--headless", "--mock-db", "--llm", "openai", "-U", "app", "-d", "shop"])
        .args(["--ask", "How many users?"])
        .env("PGPASSWORD", "secret")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Missing Credential"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_headless_without_input_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = pgchat(home.path()).arg("--headless").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--headless requires --script or --ask"));
}
