//! Headless mode integration tests.
//!
//! Runs the built binary with the mock LLM and inspects its output.

use super::create_shop_db;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Runs sqlchat in headless mode from `dir`, which also receives staged copies.
fn run_headless(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let config = dir.join("no-config.toml");
    let output = Command::new(env!("CARGO_BIN_EXE_sqlchat"))
        .current_dir(dir)
        .arg("--config")
        .arg(&config)
        .args(["--headless", "--llm", "mock"])
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute command");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

fn leftover_staging_dirs(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("temp_"))
        .count()
}

#[tokio::test]
async fn test_headless_json_transcript() {
    let dir = TempDir::new().unwrap();
    let path = create_shop_db(dir.path()).await;

    let (code, stdout, stderr) = run_headless(
        dir.path(),
        &[
            "--sqlite",
            path.to_str().unwrap(),
            "--ask",
            "What tables are there?",
            "--output",
            "json",
        ],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["connected"], true);
    assert_eq!(parsed["db_name"], "Your SQLite DB: shop.db");
    assert_eq!(parsed["banners"][0]["level"], "success");
    assert_eq!(parsed["turns"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["turns"][1]["content"], "What tables are there?");
    assert_eq!(
        parsed["turns"][2]["content"],
        "The database contains the following tables: customers, orders"
    );
    assert_eq!(leftover_staging_dirs(dir.path()), 0);
}

#[tokio::test]
async fn test_headless_text_output() {
    let dir = TempDir::new().unwrap();
    let path = create_shop_db(dir.path()).await;
    let uri = format!("sqlite:///{}", path.display());

    let (code, stdout, _) = run_headless(dir.path(), &[&uri, "--ask", "List the tables"]);

    assert_eq!(code, 0);
    assert!(stdout.starts_with("[SUCCESS] Connected to Your SQLite DB: shop.db!\n"));
    assert!(stdout.contains("\n[Human]\nList the tables\n"));
    assert!(stdout.contains("\n[AI]\nThe database contains the following tables: customers, orders\n"));
}

#[tokio::test]
async fn test_headless_script_file() {
    let dir = TempDir::new().unwrap();
    let path = create_shop_db(dir.path()).await;
    let script = dir.path().join("questions.txt");
    std::fs::write(&script, "# smoke test\nFirst question\n\nSecond question\n").unwrap();

    let (code, stdout, _) = run_headless(
        dir.path(),
        &[
            "--sqlite",
            path.to_str().unwrap(),
            "--script",
            script.to_str().unwrap(),
            "--output",
            "json",
        ],
    );

    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let turns = parsed["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 5);
    assert_eq!(turns[1]["content"], "First question");
    assert_eq!(turns[3]["content"], "Second question");
}

#[test]
fn test_headless_incomplete_mysql() {
    let dir = TempDir::new().unwrap();

    let (code, stdout, _) = run_headless(
        dir.path(),
        &[
            "--mysql-host",
            "localhost",
            "--mysql-user",
            "root",
            "--ask",
            "anything",
            "--output",
            "json",
        ],
    );

    assert_eq!(code, 1);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["connected"], false);
    assert_eq!(parsed["banners"][0]["level"], "warning");
    assert_eq!(
        parsed["banners"][0]["text"],
        "Please fill in all MySQL connection details."
    );
    assert!(parsed["turns"].as_array().unwrap().is_empty());
}

#[test]
fn test_headless_requires_questions() {
    let dir = TempDir::new().unwrap();

    let (code, _, stderr) = run_headless(dir.path(), &["--sqlite", "shop.db"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("--headless requires --ask or --script"));
}

#[test]
fn test_headless_requires_connection() {
    let dir = TempDir::new().unwrap();

    let (code, _, stderr) = run_headless(dir.path(), &["--ask", "anything"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("--headless requires a connection"));
}
