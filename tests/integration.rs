use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn mlp_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mlp"))
}

fn write_config(root: &Path, extra: &str) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/mlp.sqlite"

[server]
bind = "127.0.0.1:7340"

[analytics]
path = "{root}/data/search-analytics.json"
{extra}
"#,
        root = root.display(),
        extra = extra
    );

    let config_path = config_dir.join("mlp.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "");
    (tmp, config_path)
}

fn setup_seeded_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_mlp(&config_path, &["seed"]);
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    (tmp, config_path)
}

fn run_mlp(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = mlp_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run mlp binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_mlp(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/mlp.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_mlp(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_mlp(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_seed_only_once() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, _, success) = run_mlp(&config_path, &["seed"]);
    assert!(success);
    assert!(stdout.contains("Seeded 0 reviews"), "got: {}", stdout);
}

#[test]
fn test_search_lists_everything_without_query() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, stderr, success) = run_mlp(&config_path, &["search"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("of 3 reviews"), "got: {}", stdout);
}

#[test]
fn test_search_fuzzy_tolerates_typos() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, _, success) = run_mlp(&config_path, &["search", "cryptografy"]);
    assert!(success);
    assert!(stdout.contains("Quantum Computing Applications in Cryptography"));
    assert!(!stdout.contains("Transformer Architecture"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, _, success) = run_mlp(&config_path, &["search", "zebrafish"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_tag_filter_match_any() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, _, success) = run_mlp(
        &config_path,
        &["search", "--tag", "Security", "--tag", "Materials"],
    );
    assert!(success);
    assert!(stdout.contains("Quantum Computing"));
    assert!(stdout.contains("Sustainable Energy Storage"));
    assert!(!stdout.contains("Transformer Architecture"));
}

#[test]
fn test_search_alphabetical_sort() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, _, success) = run_mlp(&config_path, &["search", "--sort", "alphabetical"]);
    assert!(success);
    let quantum = stdout.find("Quantum Computing").unwrap();
    let energy = stdout.find("Sustainable Energy").unwrap();
    let transformer = stdout.find("Transformer Architecture").unwrap();
    assert!(quantum < energy && energy < transformer, "got: {}", stdout);
}

#[test]
fn test_search_reading_time_bucket() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, _, success) = run_mlp(&config_path, &["search", "--reading-time", "long"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_rejects_unknown_sort() {
    let (_tmp, config_path) = setup_seeded_env();

    let (_, _, success) = run_mlp(&config_path, &["search", "--sort", "popularity"]);
    assert!(!success);
}

#[test]
fn test_search_records_analytics() {
    let (_tmp, config_path) = setup_seeded_env();

    run_mlp(&config_path, &["search", "quantum"]);
    run_mlp(&config_path, &["search", "quantum cryptography"]);
    run_mlp(&config_path, &["search"]);

    let (stdout, _, success) = run_mlp(&config_path, &["analytics", "popular"]);
    assert!(success);
    let first_line = stdout.lines().next().unwrap_or_default();
    assert!(first_line.contains("quantum"), "got: {}", stdout);
    assert!(first_line.contains('2'), "got: {}", stdout);

    let (stdout, _, _) = run_mlp(&config_path, &["analytics", "usage"]);
    // the bare listing is not a meaningful search
    assert!(stdout.contains("searches:      2"), "got: {}", stdout);
}

#[test]
fn test_analytics_disabled() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "enabled = false");
    run_mlp(&config_path, &["seed"]);
    run_mlp(&config_path, &["search", "quantum"]);

    assert!(!tmp.path().join("data/search-analytics.json").exists());
}

#[test]
fn test_get_review() {
    let (_tmp, config_path) = setup_seeded_env();

    let (stdout, _, success) = run_mlp(
        &config_path,
        &["get", "2", "quantum-computing-cryptography-applications"],
    );
    assert!(success);
    assert!(stdout.contains("Quantum Computing Applications in Cryptography"));
    assert!(stdout.contains("Williams, R., Davis, K."));
}

#[test]
fn test_get_missing_review_exits_nonzero() {
    let (_tmp, config_path) = setup_seeded_env();

    let (_, stderr, success) = run_mlp(&config_path, &["get", "2", "wrong-slug"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_export_json() {
    let (tmp, config_path) = setup_seeded_env();
    let out = tmp.path().join("out/reviews.json");

    let (_, stderr, success) = run_mlp(
        &config_path,
        &["export", "--format", "json", "--output", out.to_str().unwrap()],
    );
    assert!(success, "export failed: {}", stderr);

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["review_count"], 3);
    assert_eq!(value["platform"], "MLP Research");
    assert!(value["reviews"][0]["exported_metadata"]["permalink"]
        .as_str()
        .unwrap()
        .starts_with("https://mlp-research.com/mlp/reviews/"));
}

#[test]
fn test_export_markdown_filtered() {
    let (tmp, config_path) = setup_seeded_env();
    let out = tmp.path().join("reviews.md");

    let (_, _, success) = run_mlp(
        &config_path,
        &[
            "export",
            "--domain",
            "Materials Science",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success);

    let md = fs::read_to_string(&out).unwrap();
    assert!(md.starts_with("# Sustainable Energy Storage Systems"));
    assert!(md.contains("**Word Count:** 4,156"));
    assert!(!md.contains("Quantum"));
}

#[test]
fn test_invalid_config_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "\n[discovery]\npage_size = 0");

    let (_, stderr, success) = run_mlp(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("page_size"), "got: {}", stderr);
}
