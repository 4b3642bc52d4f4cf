use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

struct Workspace {
    root: PathBuf,
}

impl Workspace {
    fn new(tag: &str) -> Self {
        let root = std::env::temp_dir().join(format!("sandmenu_test_cli_{}", tag));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("config")).expect("create config dir");
        fs::create_dir_all(root.join("Programs").join("Tools")).expect("create programs");
        fs::write(root.join("Programs").join("app.exe"), "").unwrap();
        fs::write(root.join("Programs").join("setup.BAT"), "").unwrap();
        fs::write(root.join("Programs").join("readme.md"), "").unwrap();
        Self { root }
    }

    fn path(&self, rel: &str) -> String {
        self.root.join(rel).to_string_lossy().to_string()
    }

    fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sandmenu").expect("binary");
        cmd.env("RUST_LOG", "off")
            .arg("--config-dir")
            .arg(self.config_dir())
            .arg("--start-exe")
            .arg(self.root.join("no-sandboxie").join("Start.exe"));
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().expect("run");
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("json output")
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_str().expect("string").to_string())
        .collect()
}

#[test]
fn state_on_first_run_writes_config() {
    let ws = Workspace::new("first_run");
    let state = ws.json(&["state"]);

    assert_eq!(state["selectedSandbox"], "DefaultBox");
    assert_eq!(
        strings(&state["availableSandboxes"]),
        vec!["DefaultBox", "__ask__"]
    );
    assert!(ws.config_dir().join("config.json").exists());
}

#[test]
fn add_folder_lists_only_launchable_entries() {
    let ws = Workspace::new("add_folder");
    let programs = ws.path("Programs");
    let state = ws.json(&["add-folder", programs.as_str()]);

    assert!(strings(&state["folderPaths"]).contains(&programs));
    assert_eq!(state["currentFolder"], programs.as_str());

    let names: Vec<&str> = state["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Tools", "app.exe", "setup.BAT"]);
    assert_eq!(state["files"][0]["type"], "folder");
    assert_eq!(state["files"][2]["type"], "bat");

    // Persisted: a second invocation sees the same folder.
    let again = ws.json(&["state"]);
    assert_eq!(again["currentFolder"], programs.as_str());
}

#[test]
fn adding_a_missing_folder_fails() {
    let ws = Workspace::new("missing_folder");
    ws.cmd()
        .args(["add-folder", ws.path("Nowhere").as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("folder not found"));
}

#[test]
fn sentinel_sandboxes_survive_removal() {
    let ws = Workspace::new("sentinels");
    ws.json(&["add-sandbox", "Work"]);
    ws.json(&["remove-sandbox", "DefaultBox"]);
    let state = ws.json(&["remove-sandbox", "__ask__"]);

    assert_eq!(
        strings(&state["availableSandboxes"]),
        vec!["DefaultBox", "__ask__", "Work"]
    );

    let state = ws.json(&["remove-sandbox", "Work"]);
    assert_eq!(
        strings(&state["availableSandboxes"]),
        vec!["DefaultBox", "__ask__"]
    );
}

#[test]
fn blank_sandbox_name_is_rejected() {
    let ws = Workspace::new("blank_sandbox");
    ws.cmd()
        .args(["add-sandbox", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sandbox name is empty"));
}

#[test]
fn launching_a_missing_file_reports_pid_zero() {
    let ws = Workspace::new("launch_missing");
    let output = ws
        .cmd()
        .args(["launch", ws.path("Programs/gone.exe").as_str()])
        .output()
        .expect("run");

    assert!(!output.status.success());
    let outcome: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(outcome["success"], false);
    assert_eq!(outcome["pid"], 0);
    assert!(outcome["message"]
        .as_str()
        .unwrap()
        .starts_with("file not found"));
}

#[test]
fn launching_without_sandboxie_fails() {
    let ws = Workspace::new("launch_no_tool");
    ws.cmd()
        .args(["launch", ws.path("Programs/app.exe").as_str(), "--sandbox", "Work"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"pid\": 0"));
}

#[test]
fn list_propagates_filesystem_errors() {
    let ws = Workspace::new("list_missing");
    ws.cmd()
        .args(["list", ws.path("Nowhere").as_str()])
        .assert()
        .failure();
}

#[test]
fn list_defaults_to_current_folder() {
    let ws = Workspace::new("list_current");
    ws.json(&["add-folder", ws.path("Programs").as_str()]);
    let files = ws.json(&["list"]);

    assert_eq!(files.as_array().unwrap().len(), 3);
    let app = ws.root.join("Programs").join("app.exe");
    assert_eq!(files[1]["path"], app.to_string_lossy().to_string());
}

#[test]
fn use_folder_requires_tracked_folder() {
    let ws = Workspace::new("use_folder");
    ws.cmd()
        .args(["use-folder", ws.path("Programs").as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not tracked"));
}

#[test]
fn config_path_points_into_config_dir() {
    let ws = Workspace::new("config_path");
    let expected = ws.config_dir().join("config.json");
    ws.cmd()
        .arg("config-path")
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().to_string()));
}

#[test]
fn selected_sandbox_round_trips_when_unlisted() {
    let ws = Workspace::new("select_unlisted");
    ws.json(&["select-sandbox", "Scratch"]);
    let state = ws.json(&["state"]);

    assert_eq!(state["selectedSandbox"], "Scratch");
    assert!(!strings(&state["availableSandboxes"]).contains(&"Scratch".to_string()));
    assert!(ws.config_dir().join("config.json").exists());
}
