//! Integration tests for the cfgcache CLI

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const PROBLEMS: &str = r#"[
  {
    "trace": { "kind": "task", "path": ":app:run", "type_name": "Exec" },
    "message": "invocation of 'Task.project' at execution time is unsupported.",
    "documentation": "requirements_use_project_during_execution"
  },
  {
    "trace": {
      "kind": "property",
      "property": "field",
      "name": "thread",
      "trace": { "kind": "task", "path": ":lib:compile", "type_name": "Compile" }
    },
    "message": "cannot serialize object of type 'Thread'",
    "cause": { "message": "Thread is not serializable" }
  },
  {
    "trace": { "kind": "task", "path": ":lib:compile", "type_name": "Compile" },
    "message": "cannot serialize object of type 'Thread'"
  }
]"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(problems: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("problems.json"), problems).unwrap();
        std::fs::write(dir.path().join("config.toml"), "[problems]\nmode = \"fail\"\n").unwrap();
        std::fs::create_dir_all(dir.path().join("cache/entry")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn check(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_cfgcache"))
            .env_remove("CFGCACHE_PROBLEMS")
            .env_remove("CFGCACHE_MAX_PROBLEMS")
            .env_remove("CFGCACHE_REPORTS_ROOT")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path("config.toml"))
            .arg("check")
            .arg("--problems")
            .arg(self.path("problems.json"))
            .arg("--reports-dir")
            .arg(self.path("build"))
            .arg("--cache-dir")
            .arg(self.path("cache"))
            .args(["--key", "entry"])
            .args(args)
            .output()
            .expect("Failed to execute cfgcache")
    }
}

fn report_file(root: &Path) -> std::path::PathBuf {
    root.join("build/reports/configuration-cache/entry/configuration-cache-report.html")
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_cfgcache"))
        .arg("--help")
        .output()
        .expect("Failed to execute cfgcache");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("check"));
}

#[test]
fn test_disallowed_problems_fail_and_discard_entry() {
    let fixture = Fixture::new(PROBLEMS);
    let output = fixture.check(&["--action", "store", "--task", "assemble"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration cache problems found in this build."));
    assert!(stderr.contains(
        "3 problems were found storing the configuration cache, 2 of which seem unique."
    ));
    assert!(stderr.contains("Code: problems.disallowed"));
    assert!(stderr.contains("Configuration cache entry discarded with 3 problems."));
    assert!(report_file(fixture.dir.path()).exists());
    assert!(!fixture.path("cache/entry").exists());
}

#[test]
fn test_warn_mode_keeps_entry_and_succeeds() {
    let fixture = Fixture::new(PROBLEMS);
    let output = fixture.check(&["--action", "store", "--problems-mode", "warn"]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration cache entry stored with 3 problems."));
    assert!(fixture.path("cache/entry").exists());
}

#[test]
fn test_json_mode_reports_result() {
    let fixture = Fixture::new("[]");
    let output = fixture.check(&["--action", "load", "--json"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let result: serde_json::Value =
        serde_json::from_str(stdout.lines().last().expect("result line")).unwrap();
    assert_eq!(result["problemCount"], 0);
    assert_eq!(result["outcome"], "Configuration cache entry reused.");
}

#[test]
fn test_too_many_problems_fail_in_warn_mode() {
    let fixture = Fixture::new(PROBLEMS);
    let output = fixture.check(&[
        "--action",
        "update",
        "--problems-mode",
        "warn",
        "--max-problems",
        "2",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Code: problems.too_many"));
    assert!(!fixture.path("cache/entry").exists());
}

#[test]
fn test_invalid_problems_file() {
    let fixture = Fixture::new("{ not json");
    let output = fixture.check(&["--action", "store"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not a valid problems file"));
}
