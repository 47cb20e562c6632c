use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo;
use rstest::rstest;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write temp file");
    path
}

#[test]
fn test_stdio_session_exits_cleanly_on_eof() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.write_stdin("").assert().success().code(0);

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unwritable_debug_log_fails_before_session() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.args(["--debug", "/no/such/dir/x.log"])
        .write_stdin("")
        .assert()
        .failure()
        .code(254);

    Ok(())
}

#[cfg(unix)]
#[rstest]
#[case::unsupported_network(vec!["--net", "udp", "--addr", "127.0.0.1:1"], 255)]
#[case::dbg_unwritable_debug_log(vec!["dbg", "--debug", "/no/such/dir/x.log", "--algod", ""], 254)]
#[case::dbg_missing_config(vec!["dbg", "--config", "/no/such/config.json"], 252)]
#[case::dbg_missing_replay(vec!["dbg", "--replay", "/no/such/replay.json"], 251)]
#[case::dbg_invalid_endpoint(vec!["dbg", "--algod", "ftp://node.example.com"], 250)]
fn test_construction_failures_map_to_exit_codes(#[case] args: Vec<&str>, #[case] code: i32) {
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.args(args).write_stdin("").assert().failure().code(code);
}

#[cfg(unix)]
#[test]
fn test_dbg_rejects_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = write_file(&dir, "c.json", "{\"stopOnEntry\": ");
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.arg("dbg")
        .arg("--config")
        .arg(&config)
        .write_stdin("")
        .assert()
        .failure()
        .code(252);

    Ok(())
}

#[test]
fn test_dbg_replay_session_exits_cleanly_on_eof() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let replay = write_file(&dir, "r.json", r#"{"txn-groups": []}"#);
    let config = write_file(&dir, "c.json", r#"{"stopOnEntry": true}"#);
    let log = dir.path().join("dap.log");
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.arg("dbg")
        .arg("--replay")
        .arg(&replay)
        .arg("--config")
        .arg(&config)
        .arg("--debug")
        .arg(&log)
        .write_stdin("")
        .assert()
        .success()
        .code(0);

    assert!(log.exists());

    Ok(())
}

#[cfg(unix)]
#[rstest]
#[case::default_mode(vec!["-debug", "/no/such/dir/x.log"], 254)]
#[case::default_mode_network(vec!["-net", "udp", "-addr", "127.0.0.1:1"], 255)]
#[case::dbg(vec!["dbg", "-replay", "/no/such/replay.json", "-algod", ""], 251)]
fn test_single_dash_flags_are_accepted(#[case] args: Vec<&str>, #[case] code: i32) {
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.args(args).write_stdin("").assert().failure().code(code);
}

#[test]
fn test_single_dash_empty_address_serves_stdio() {
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.args(["-addr", ""]).write_stdin("").assert().success().code(0);
}

#[test]
fn test_unknown_flag_is_a_usage_error() {
    let mut cmd = cargo::cargo_bin_cmd!("tealsp");

    cmd.arg("--bogus").assert().failure().code(2);
}
