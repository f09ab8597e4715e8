use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "repopulse init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".repopulse.toml");
    assert!(config_path.exists(), ".repopulse.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[paths]"));
    assert!(content.contains("[github]"));
    assert!(content.contains("[sonar]"));

    // Every option is commented out, so parsing yields the defaults
    let config: repopulse_core::PulseConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.github.rate_limit_wait_secs, 300);
    assert_eq!(config.paths.groups_csv, std::path::PathBuf::from("data/repos_groups.csv"));
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".repopulse.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(
        std::fs::read_to_string(dir.path().join(".repopulse.toml")).unwrap(),
        "# existing"
    );
}

#[test]
fn config_file_paths_are_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".repopulse.toml"),
        "[paths]\ncontributors_csv = \"in.csv\"\ngroups_csv = \"out/groups.csv\"\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("in.csv"), "repo,contributors\nsolo,3\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .arg("groups")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/groups.csv")).unwrap(),
        "repo_name,repo_group\nsolo,1\n"
    );
}
