use std::path::Path;
use std::process::{Command, Output};

fn repopulse(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

fn groups(dir: &Path, contributors: &str) -> (Output, String) {
    std::fs::write(dir.join("contributors.csv"), contributors).unwrap();
    let output = repopulse(
        dir,
        &["groups", "--input", "contributors.csv", "--output", "data/groups.csv"],
    );
    let written = std::fs::read_to_string(dir.join("data/groups.csv")).unwrap_or_default();
    (output, written)
}

#[test]
fn missing_input_fails_without_writing() {
    let dir = tempfile::tempdir().unwrap();

    let output = repopulse(
        dir.path(),
        &["groups", "--input", "absent.csv", "--output", "groups.csv"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.csv"));
    assert!(!dir.path().join("groups.csv").exists());
}

#[test]
fn empty_input_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();

    let (output, written) = groups(dir.path(), "repo,contributors\n");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(written, "repo_name,repo_group\n");
}

#[test]
fn six_repositories_split_two_one_three() {
    let dir = tempfile::tempdir().unwrap();

    let (output, written) = groups(
        dir.path(),
        "repo,contributors\nf,2\nc,1\na,0\ne,2\nb,0\nd,2\n",
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(written, "repo_name,repo_group\na,1\nb,1\nc,2\nd,3\ne,3\nf,3\n");
}

#[test]
fn malformed_count_is_kept_as_zero() {
    let dir = tempfile::tempdir().unwrap();

    let (output, written) = groups(
        dir.path(),
        "repo,contributors\nbusy,10\nbroken,n/a\nmid,5\n",
    );

    assert!(output.status.success());
    assert_eq!(written, "repo_name,repo_group\nbroken,1\nbusy,3\nmid,2\n");
}

#[test]
fn json_report_lists_group_sizes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("c.csv"), "repo,contributors\none,1\ntwo,2\nthree,3\n").unwrap();

    let output = repopulse(
        dir.path(),
        &["groups", "--input", "c.csv", "--output", "g.csv", "--format", "json"],
    );

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total"], 3);
    assert_eq!(report["sizes"]["low"], 1);
    assert_eq!(report["sizes"]["medium"], 1);
    assert_eq!(report["sizes"]["high"], 1);
    assert_eq!(report["ranges"][2]["group"], 3);
}

#[test]
fn classify_then_summarize_offline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("raw.json"),
        r#"{"api":{"repo":"api","owner":"acme","commits":["feat: search","fix: crash","Update README"]}}"#,
    )
    .unwrap();

    let output = repopulse(
        dir.path(),
        &[
            "commits",
            "classify",
            "--input",
            "raw.json",
            "--output",
            "types.csv",
            "--unclassified",
            "other.json",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("types.csv")).unwrap(),
        "repo,feat,fix,refactor,ci,chore,other,total_commits\napi,1,1,0,0,0,1,3\n"
    );

    std::fs::write(dir.path().join("groups.csv"), "repo_name,repo_group\napi,1\nweb,3\n").unwrap();
    std::fs::write(
        dir.path().join("scores.csv"),
        "repo_url,score\nhttps://github.com/acme/api,72.5\n",
    )
    .unwrap();
    let output = repopulse(
        dir.path(),
        &["summary", "--groups", "groups.csv", "--scores", "scores.csv", "--format", "json"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["groups"][0]["stats"]["median"], 72.5);
    assert!(summary["groups"][1]["stats"].is_null());
    assert_eq!(summary["unscored"][0], "web");
}
