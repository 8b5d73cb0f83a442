use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nexus(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nexus").unwrap();
    cmd.current_dir(dir.path()).env("NEXUS_ROOT", dir.path());
    cmd
}

fn init_corpus(dir: &TempDir) {
    nexus(dir).arg("init").assert().success();
    nexus(dir)
        .args(["project", "add", "nexus", "--prefix", "NEX"])
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// nexus init / project
// ---------------------------------------------------------------------------

#[test]
fn init_creates_corpus_dir() {
    let dir = TempDir::new().unwrap();
    nexus(&dir).arg("init").assert().success();
    assert!(dir.path().join(".context").is_dir());
}

#[test]
fn project_add_and_list() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);

    assert!(dir.path().join(".context/nexus/project.yaml").exists());
    assert!(dir.path().join(".context/nexus/index.md").exists());

    nexus(&dir)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NEX"));
}

#[test]
fn project_add_duplicate_prefix_fails() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);

    nexus(&dir)
        .args(["project", "add", "other", "--prefix", "NEX"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate project prefix"));
}

// ---------------------------------------------------------------------------
// nexus context create / list
// ---------------------------------------------------------------------------

#[test]
fn context_create_and_list() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);

    nexus(&dir)
        .args(["context", "create", "nexus", "--title", "User Login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NEX_001"));

    assert!(dir
        .path()
        .join(".context/nexus/NEX_001-user-login.md")
        .exists());

    nexus(&dir)
        .args(["context", "list", "nexus"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User Login"));
}

#[test]
fn context_show_displays_document() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);
    nexus(&dir)
        .args(["context", "create", "nexus", "--title", "User Login"])
        .assert()
        .success();

    nexus(&dir)
        .args(["context", "show", "NEX_001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NEX_001: User Login"))
        .stdout(predicate::str::contains("## Outcome"));

    nexus(&dir)
        .args(["context", "show", "NEX_042"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NEX_042"));
}

#[test]
fn context_create_missing_project_fails() {
    let dir = TempDir::new().unwrap();
    nexus(&dir).arg("init").assert().success();

    nexus(&dir)
        .args(["context", "create", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project not found"));
}

#[test]
fn context_create_json_output() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);

    let output = nexus(&dir)
        .args(["--json", "context", "create", "nexus", "--title", "First"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["id"], "NEX_001");
}

// ---------------------------------------------------------------------------
// nexus context delete / move / reorder
// ---------------------------------------------------------------------------

#[test]
fn delete_with_reorder_shifts_files() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);
    for title in ["First", "Second", "Third"] {
        nexus(&dir)
            .args(["context", "create", "nexus", "--title", title])
            .assert()
            .success();
    }

    nexus(&dir)
        .args(["context", "delete", "NEX_001", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NEX_003 -> NEX_002"));

    let ctx = dir.path().join(".context/nexus");
    assert!(ctx.join("NEX_001-second.md").exists());
    assert!(ctx.join("NEX_002-third.md").exists());
    assert!(!ctx.join("NEX_003-third.md").exists());
}

#[test]
fn delete_without_reorder_leaves_gap() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);
    for title in ["First", "Second"] {
        nexus(&dir)
            .args(["context", "create", "nexus", "--title", title])
            .assert()
            .success();
    }

    nexus(&dir)
        .args(["context", "delete", "NEX_001", "--no-reorder", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gaps will remain"));

    let ctx = dir.path().join(".context/nexus");
    assert!(!ctx.join("NEX_001-first.md").exists());
    assert!(ctx.join("NEX_002-second.md").exists());
}

#[test]
fn move_rewrites_ids() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);
    for title in ["First", "Second", "Third"] {
        nexus(&dir)
            .args(["context", "create", "nexus", "--title", title])
            .assert()
            .success();
    }

    nexus(&dir)
        .args(["context", "move", "NEX_003", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NEX_003 -> NEX_001"));

    let first = dir.path().join(".context/nexus/NEX_001-third.md");
    let content = std::fs::read_to_string(first).unwrap();
    assert!(content.contains("context_id: NEX_001"));
    assert!(content.contains("# NEX_001: Third"));
}

#[test]
fn move_out_of_range_fails() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);
    nexus(&dir)
        .args(["context", "create", "nexus", "--title", "Only"])
        .assert()
        .success();

    nexus(&dir)
        .args(["context", "move", "NEX_001", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn reorder_compacts_and_reports_json() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);
    for title in ["First", "Second", "Third"] {
        nexus(&dir)
            .args(["context", "create", "nexus", "--title", title])
            .assert()
            .success();
    }
    nexus(&dir)
        .args(["context", "delete", "NEX_002", "--no-reorder", "--force"])
        .assert()
        .success();

    let output = nexus(&dir)
        .args(["--json", "context", "reorder", "nexus"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["operation"], "reorder");
    assert_eq!(parsed["remapped"][0]["from"], "NEX_003");
    assert_eq!(parsed["remapped"][0]["to"], "NEX_002");
}

#[test]
fn json_delete_requires_force() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);
    nexus(&dir)
        .args(["context", "create", "nexus", "--title", "Keep"])
        .assert()
        .success();

    nexus(&dir)
        .args(["--json", "context", "delete", "NEX_001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert!(dir.path().join(".context/nexus/NEX_001-keep.md").exists());
}

#[test]
fn delete_unknown_id_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    init_corpus(&dir);

    nexus(&dir)
        .args(["context", "delete", "NEX_099", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NEX_099"));
}
