//! CLI smoke tests for the blog-admin binary
//!
//! These run the built binary against a throwaway home directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn run_blog_admin(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blog-admin"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute blog-admin")
}

/// Config with a file database under `home`, quiet console and no log file.
fn write_config(home: &Path) -> PathBuf {
    let cfg_path = home.join("config.yaml");
    let yaml = format!(
        r#"
server:
  home_dir: "{}"

database:
  url: "sqlite://blog.db"
  max_conns: 2

logging:
  default:
    console_level: "off"
    file: ""

modules:
  blog:
    default_page_size: 5
"#,
        home.to_string_lossy().replace('\\', "/")
    );
    std::fs::write(&cfg_path, yaml).expect("write config");
    cfg_path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_blog_admin(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let out = stdout(&output);
    assert!(out.contains("blog-admin") || out.contains("Blog Admin"));
    assert!(out.contains("Usage:"), "Should contain usage information");
    for sub in ["check", "migrate", "add-user", "list-projects", "list-posts"] {
        assert!(out.contains(sub), "Should list '{sub}' subcommand");
    }
    assert!(out.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_blog_admin(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");
    let out = stdout(&output);
    assert!(out.contains("blog-admin"));
    assert!(out.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_blog_admin(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_cli_check_with_config() {
    let tmp = TempDir::new().unwrap();
    let cfg = write_config(tmp.path());

    let output = run_blog_admin(&["--config", cfg.to_str().unwrap(), "check"]);
    assert!(
        output.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let out = stdout(&output);
    assert!(out.contains("Configuration check passed"));
    assert!(out.contains("default_page_size=5"));
}

#[test]
fn test_cli_print_config() {
    let tmp = TempDir::new().unwrap();
    let cfg = write_config(tmp.path());

    let output = run_blog_admin(&["--config", cfg.to_str().unwrap(), "--print-config"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("database:"));
    assert!(out.contains("sqlite://blog.db"));
}

#[test]
fn test_cli_mock_database_starts_empty() {
    let tmp = TempDir::new().unwrap();
    let cfg = write_config(tmp.path());

    let output = run_blog_admin(&["--config", cfg.to_str().unwrap(), "--mock", "list-projects"]);
    assert!(
        output.status.success(),
        "list-projects failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("No projects"));
    assert!(!tmp.path().join("blog.db").exists());
}

#[test]
fn test_cli_file_database_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let cfg = write_config(tmp.path());
    let cfg = cfg.to_str().unwrap();

    let output = run_blog_admin(&["--config", cfg, "migrate"]);
    assert!(
        output.status.success(),
        "migrate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Migrations applied"));
    assert!(tmp.path().join("blog.db").exists());

    let output = run_blog_admin(&["--config", cfg, "add-user", "alice", "Alice"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Registered user alice (default)"));

    let output = run_blog_admin(&["--config", cfg, "list-posts"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No posts"));
}

#[test]
fn test_cli_rejects_bad_pagination() {
    let tmp = TempDir::new().unwrap();
    let cfg = write_config(tmp.path());

    let output = run_blog_admin(&[
        "--config",
        cfg.to_str().unwrap(),
        "--mock",
        "list-posts",
        "--limit=abc",
    ]);
    assert!(!output.status.success(), "non-numeric limit should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("limit"));
}
