//! CLI smoke tests
//!
//! Each test runs the `td` binary against its own temp home and state dir,
//! so no real config, log or saved state is touched.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn td(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("td").expect("td binary");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("DEEPSEEK_API_KEY")
        .arg("--state-dir")
        .arg(home.path().join("state"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    td(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("progress"))
        .stdout(predicate::str::contains("DEEPSEEK_API_KEY"));
}

#[test]
fn test_templates_lists_all() {
    let home = TempDir::new().unwrap();
    td(&home)
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("agile"))
        .stdout(predicate::str::contains("marketResearch"))
        .stdout(predicate::str::contains("userResearch"));
}

#[test]
fn test_template_then_show() {
    let home = TempDir::new().unwrap();
    td(&home)
        .args(["template", "waterfall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded template 'waterfall'"));

    assert!(home.path().join("state/taskDecomposerProject.json").exists());

    td(&home)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Waterfall project"))
        .stdout(predicate::str::contains("3 months"));
}

#[test]
fn test_unknown_template_fails() {
    let home = TempDir::new().unwrap();
    td(&home)
        .args(["template", "kanban"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown template 'kanban'"));
}

#[test]
fn test_empty_state_commands() {
    let home = TempDir::new().unwrap();
    td(&home)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing saved yet"));

    td(&home)
        .args(["progress", "1", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Subtask not found"));

    td(&home).arg("export").assert().failure();
    td(&home).arg("graph").assert().failure();
}

#[test]
fn test_run_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    td(&home)
        .args(["run", "Plan a conference"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEEPSEEK_API_KEY"));
}

#[test]
fn test_reset_clears_saved_form() {
    let home = TempDir::new().unwrap();
    td(&home).args(["template", "event"]).assert().success();
    td(&home).arg("reset").assert().success();

    assert!(!home.path().join("state/taskDecomposerProject.json").exists());
    td(&home)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing saved yet"));
}

#[test]
fn test_moved_node_kept_after_edit() {
    let home = TempDir::new().unwrap();
    let state_dir = home.path().join("state");
    std::fs::create_dir_all(&state_dir).unwrap();
    std::fs::write(
        state_dir.join("taskDecomposerProject.json"),
        r#"{"mainTask": "Ship v2", "subtasks": [
            {"id": "1", "title": "Develop API"},
            {"id": "2", "title": "Test API", "dependencies": ["1"]}
        ]}"#,
    )
    .unwrap();

    td(&home)
        .args(["move", "2", "120", "-40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("moved 2"));

    td(&home)
        .args(["edit", "2", "--title", "Test API again"])
        .assert()
        .success();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(state_dir.join("nodePositions.json")).unwrap()).unwrap();
    assert_eq!(saved["task_2"]["x"], 120.0);
    assert_eq!(saved["task_2"]["y"], -40.0);

    let graph = td(&home).args(["graph", "--format", "json"]).assert().success();
    let graph: serde_json::Value = serde_json::from_slice(&graph.get_output().stdout).unwrap();
    let node = graph["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == "task_2")
        .unwrap();
    assert_eq!(node["title"], "Test API again");
    assert_eq!(node["position"]["x"], 120.0);

    td(&home)
        .args(["move", "task_9", "1", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Graph node not found"));
}
