//! End-to-end runs of the `updata` binary against a shell-script executor.
//! The exit status is the contract with the scheduler, so these assert on it
//! directly.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const EXECUTOR_SCRIPT: &str = r#"
mode="$1"
case "$mode" in
  --install-only)
    echo "installing" >&2
    exit "${INSTALL_EXIT:-0}"
    ;;
  --reboot-only)
    echo "rebooting" >&2
    exit "${REBOOT_EXIT:-0}"
    ;;
esac
exit 99
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Plan, marker directory and executor script all present, direct
    /// execution enabled.
    fn new() -> Self {
        let fixture = Self::bare(true);
        std::fs::write(fixture.plan(), r#"[{"action": "install", "packages": ["kernel"]}]"#).unwrap();
        std::fs::create_dir(fixture.markers()).unwrap();
        fixture
    }

    fn bare(direct_execution: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let fixture = Self { dir };
        std::fs::write(fixture.path("executor.sh"), EXECUTOR_SCRIPT).unwrap();
        let config = format!(
            "[orchestrator]\n\
             marker_dir = {:?}\n\
             plan_file = {:?}\n\
             direct_execution = {}\n\
             \n\
             [executor]\n\
             program = \"sh\"\n\
             extra_args = [{:?}]\n",
            fixture.markers().display().to_string(),
            fixture.plan().display().to_string(),
            direct_execution,
            fixture.path("executor.sh").display().to_string(),
        );
        std::fs::write(fixture.path("updata.toml"), config).unwrap();
        fixture
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn plan(&self) -> PathBuf {
        self.path("plan.json")
    }

    fn markers(&self) -> PathBuf {
        self.path("markers")
    }

    fn marker(&self, name: &str) -> PathBuf {
        self.markers().join(name)
    }

    fn updata(&self) -> Command {
        let mut cmd = Command::cargo_bin("updata").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("UPDATA__ORCHESTRATOR__DIRECT_EXECUTION")
            .arg("--config")
            .arg(self.path("updata.toml"));
        cmd
    }
}

fn touch(path: &Path) {
    std::fs::write(path, "").unwrap();
}

#[test]
fn test_not_configured_exits_3() {
    let fixture = Fixture::bare(false);
    fixture.updata().arg("run").assert().code(3);
    assert!(!fixture.markers().exists());
}

#[test]
fn test_missing_plan_exits_5() {
    let fixture = Fixture::bare(true);
    std::fs::create_dir(fixture.markers()).unwrap();
    fixture.updata().arg("run").assert().code(5);
}

#[test]
fn test_missing_marker_dir_exits_6() {
    let fixture = Fixture::bare(true);
    touch(&fixture.plan());
    fixture.updata().arg("run").assert().code(6);
    assert!(!fixture.markers().exists());
}

#[test]
fn test_no_subcommand_runs_the_update() {
    let fixture = Fixture::new();
    fixture.updata().assert().code(0);
    assert!(fixture.marker("attempt-started").exists());
}

#[test]
fn test_full_update_across_reboot() {
    let fixture = Fixture::new();

    fixture.updata().arg("run").assert().success();
    assert!(fixture.marker("install-phase-done").exists());
    assert!(fixture.marker("reboot-phase-started").exists());
    assert!(!fixture.marker("update-finished").exists());

    fixture.updata().arg("run").assert().success();
    assert!(fixture.marker("update-finished").exists());

    // nothing left to do, still success
    fixture.updata().arg("run").assert().success();
}

#[test]
fn test_install_failure_then_retry_failure() {
    let fixture = Fixture::new();

    fixture.updata().arg("run").env("INSTALL_EXIT", "4").assert().code(0);
    assert_eq!(
        std::fs::read_to_string(fixture.marker("install-exit-code")).unwrap().trim(),
        "4"
    );
    assert_eq!(
        std::fs::read_to_string(fixture.marker("install-failure")).unwrap(),
        "installing\n"
    );

    fixture.updata().arg("run").env("INSTALL_EXIT", "4").assert().code(11);
    assert!(fixture.marker("install-failure-repeated").exists());

    fixture.updata().arg("run").assert().code(12);
}

#[test]
fn test_reboot_failures_map_to_distinct_codes() {
    let request_failed = Fixture::new();
    request_failed
        .updata()
        .arg("run")
        .env("REBOOT_EXIT", "10")
        .assert()
        .code(21);

    let other = Fixture::new();
    other.updata().arg("run").env("REBOOT_EXIT", "2").assert().code(20);
    assert!(other.marker("reboot-failure").exists());
}

#[test]
fn test_bad_state_exits_7_and_leaves_markers_alone() {
    let fixture = Fixture::new();
    touch(&fixture.marker("attempt-started"));
    std::fs::write(fixture.marker("install-exit-code"), "1\n").unwrap();

    fixture.updata().arg("run").assert().code(7);

    assert!(fixture.marker("attempt-started").exists());
    assert!(fixture.marker("install-exit-code").exists());
}

#[test]
fn test_missing_executor_is_operational_error() {
    let fixture = Fixture::new();
    let config = std::fs::read_to_string(fixture.path("updata.toml"))
        .unwrap()
        .replace("program = \"sh\"", "program = \"/nonexistent/updata_execute\"");
    std::fs::write(fixture.path("updata.toml"), config).unwrap();

    fixture.updata().arg("run").assert().code(1);
}

#[test]
fn test_status_is_read_only() {
    let fixture = Fixture::new();
    touch(&fixture.marker("attempt-started"));
    touch(&fixture.marker("install-phase-done"));
    touch(&fixture.marker("install-failure"));

    fixture
        .updata()
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"US\""))
        .stdout(predicate::str::contains("install-failure"));

    assert!(fixture.marker("install-failure").exists());
}

#[test]
fn test_status_human_output() {
    let fixture = Fixture::new();

    fixture
        .updata()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("State: init"))
        .stdout(predicate::str::contains("1 step"));
}

#[test]
fn test_graph_renders_dot_and_markdown() {
    let fixture = Fixture::new();

    fixture
        .updata()
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"))
        .stdout(predicate::str::contains("FRF"));

    fixture
        .updata()
        .args(["graph", "--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| `UF` |"));
}

#[test]
fn test_config_shows_file_values() {
    let fixture = Fixture::new();

    fixture
        .updata()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("direct_execution = true"))
        .stdout(predicate::str::contains("executor.sh"));
}

#[test]
fn test_environment_overrides_config_file() {
    let fixture = Fixture::new();

    fixture
        .updata()
        .env("UPDATA__ORCHESTRATOR__DIRECT_EXECUTION", "false")
        .arg("run")
        .assert()
        .code(3);
}
