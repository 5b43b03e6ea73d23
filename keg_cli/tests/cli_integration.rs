use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("keg.toml");
    fs::write(&path, body).unwrap();
    path
}

// Tap a 10 l keg, stay quiet past the liveness window, come back.
fn write_trace(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("trace.csv");
    let mut f = fs::File::create(&path).unwrap();
    writeln!(f, "offset_s,weight").unwrap();
    writeln!(f, "0,16400").unwrap();
    writeln!(f, "5,16600").unwrap();
    writeln!(f, "60,").unwrap();
    writeln!(f, "900,").unwrap();
    path
}

fn keg() -> Command {
    Command::cargo_bin("keg").unwrap()
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["replay"], 2, "required", "stderr")]
#[case(&["status"], 0, "active keg: none", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[store]\nbackend = \"memory\"\n");

    let mut cmd = keg();
    cmd.current_dir(dir.path()).arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn replay_taps_and_reports_transitions() {
    let dir = tempdir().unwrap();
    let trace = write_trace(&dir);

    keg()
        .current_dir(dir.path())
        .arg("replay")
        .arg("--trace")
        .arg(&trace)
        .assert()
        .success()
        .stdout(predicate::str::contains("event pub_open at t+0s"))
        .stdout(predicate::str::contains("event new_keg_tapped at t+5s"))
        .stdout(predicate::str::contains("event pub_close at t+900s"))
        .stdout(predicate::str::contains("final: keg=10 left=20 total=0"));
}

#[test]
fn replay_json_ends_with_a_summary_line() {
    let dir = tempdir().unwrap();
    let trace = write_trace(&dir);

    let out = keg()
        .current_dir(dir.path())
        .arg("--json")
        .arg("replay")
        .arg("--trace")
        .arg(&trace)
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    // one line per row plus the summary
    assert_eq!(lines.len(), 5);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["candidate_keg"], 10);
    assert_eq!(first["is_open"], true);

    let summary: serde_json::Value = serde_json::from_str(lines[4]).unwrap();
    assert_eq!(
        summary["events"],
        serde_json::json!(["pub_opened", "new_keg_tapped", "pub_closed"])
    );
    assert_eq!(summary["scale"]["active_keg"], 10);
    assert_eq!(summary["scale"]["beers_left"], 20);
}

#[test]
fn replay_can_start_from_a_tapped_keg() {
    let dir = tempdir().unwrap();
    let trace = dir.path().join("empty.csv");
    fs::write(&trace, "offset_s,weight\n0,6050\n").unwrap();

    keg()
        .current_dir(dir.path())
        .args(["replay", "--keg", "10", "--trace"])
        .arg(&trace)
        .assert()
        .success()
        .stdout(predicate::str::contains("final: keg=0 left=0 total=20"));
}

#[test]
fn replay_reports_bad_trace_header() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.csv");
    fs::write(&bad, "time,grams\n0,16400\n").unwrap();

    keg()
        .current_dir(dir.path())
        .arg("replay")
        .arg("--trace")
        .arg(&bad)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid headers in trace CSV"));
}

#[test]
fn invalid_config_exits_with_code_2() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[store]\ntimeout_ms = 0\n");

    keg()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("status")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("store.timeout_ms must be > 0"));
}

#[test]
fn json_mode_prints_structured_errors() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[logging]\nrotation = \"weekly\"\n");

    let out = keg()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("status")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));

    let stderr = String::from_utf8(out.stderr).unwrap();
    let line = stderr.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "InvalidConfig");
    assert_eq!(v["exit_code"], 2);
}

#[test]
fn status_reads_the_file_store() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("var").join("state.json");
    fs::create_dir_all(state.parent().unwrap()).unwrap();
    let doc = serde_json::json!({
        "values": {
            "active_keg": "30",
            "weight": "25000",
            "beers_left": "30",
            "beers_total": "120",
            "warehouse": "0,0,2,0,0"
        },
        "events": ["pub_open AT 2024-05-17T17:00:00Z"]
    });
    fs::write(&state, doc.to_string()).unwrap();
    let cfg = write_config(
        &dir,
        &format!(
            "[store]\nbackend = \"file\"\npath = {:?}\n",
            state.display().to_string()
        ),
    );

    keg()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("active keg: 30 l"))
        .stdout(predicate::str::contains("beers total: 120"))
        .stdout(predicate::str::contains("(80 beers)"))
        .stdout(predicate::str::contains("last event: pub_open AT 2024-05-17T17:00:00Z"));
}

#[test]
fn corrupt_state_file_is_a_store_error() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state.json");
    fs::write(&state, "{ not json").unwrap();
    let cfg = write_config(
        &dir,
        &format!(
            "[store]\nbackend = \"file\"\npath = {:?}\n",
            state.display().to_string()
        ),
    );

    keg()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not valid JSON"));
}
