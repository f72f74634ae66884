use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::Path;

fn simulate(dir: &Path, seed: &str, days: &str, episodes: &str) {
    let mut cmd = cargo_bin_cmd!("gridramp");
    cmd.arg("simulate").arg("--out-dir").arg(dir);
    cmd.args(["--seed", seed, "--days", days, "--episodes", episodes]);
    cmd.assert().success();
}

#[test]
fn simulate_then_edac_detects_every_episode() {
    let dir = tempfile::tempdir().expect("tempdir");
    simulate(dir.path(), "11", "1", "2");

    let out = dir.path().join("analysis");
    let mut cmd = cargo_bin_cmd!("gridramp");
    cmd.arg("edac")
        .arg("--input")
        .arg(dir.path().join("edac.csv"))
        .arg("--out-dir")
        .arg(&out)
        .arg("--json");
    let stdout = cmd.assert().success().get_output().stdout.clone();

    let stdout = String::from_utf8(stdout).expect("utf8");
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("event json"))
        .collect();
    assert_eq!(events.len(), 2);
    for event in &events {
        let onset = event["onset"].as_str().expect("onset");
        let trigger = event["trigger"].as_str().expect("trigger");
        let recovery = event["recovery"].as_str().expect("recovery");
        // ISO timestamps order lexicographically
        assert!(onset <= trigger && trigger <= recovery);
        assert!(event["duration_secs"].as_f64().expect("duration") >= 0.0);
        assert!(event["min_slope_mw_per_h"].as_f64().expect("slope") < 0.0);
        assert!(event["frequency_hz"].as_f64().expect("freq") < 59.3);
    }
    assert!(events[0]["trigger"].as_str() < events[1]["trigger"].as_str());

    let table = fs::read_to_string(out.join("events.csv")).expect("events table");
    let mut lines = table.lines();
    assert_eq!(
        lines.next().expect("header"),
        "day,onset,recovery,duration_s,min_slope_mw_per_s,min_slope_time,frequency_hz,trigger_time"
    );
    assert_eq!(lines.count(), 2);
}

#[test]
fn a_quiet_stream_writes_an_empty_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    simulate(dir.path(), "5", "1", "0");

    let out = dir.path().join("analysis");
    let mut cmd = cargo_bin_cmd!("gridramp");
    cmd.arg("edac")
        .arg("--input")
        .arg(dir.path().join("edac.csv"))
        .arg("--out-dir")
        .arg(&out)
        .arg("--json");
    cmd.assert().success().stdout("");

    let table = fs::read_to_string(out.join("events.csv")).expect("events table");
    assert_eq!(table.lines().count(), 1);
}

#[test]
fn a_config_file_overrides_the_set_point() {
    let dir = tempfile::tempdir().expect("tempdir");
    simulate(dir.path(), "11", "1", "1");

    // a set point below the episode floor selects nothing
    let config = dir.path().join("gridramp.toml");
    fs::write(&config, "[edac]\nthreshold_hz = 50.0\n").expect("write config");

    let out = dir.path().join("analysis");
    let mut cmd = cargo_bin_cmd!("gridramp");
    cmd.arg("edac")
        .arg("--input")
        .arg(dir.path().join("edac.csv"))
        .arg("--out-dir")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .arg("--json");
    cmd.assert().success().stdout("");

    let table = fs::read_to_string(out.join("events.csv")).expect("events table");
    assert_eq!(table.lines().count(), 1);
}
