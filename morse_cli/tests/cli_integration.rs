use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Config tuned for quick simulated captures
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[track]
primary = "red"
secondary = "white"
background = ["brown"]

[drive]
speed_dps = 200

[monitors]
obstruction_threshold = 10.0
obstruction_poll_ms = 2
boundary_poll_ms = 2
button_poll_ms = 5

[capture]
poll_ms = 2
obstruction_idle_ms = 2
max_run_ms = 20000

[recovery]
timeout_ms = 2000

[output]
# do not keep the process around after printing
hold_ms = 0

[simulation]
unit_ms = 40
lead_ms = 100
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["decode", "--morse", "... --- ..."], 0, "Text: SOS", "stdout")]
#[case(&["decode"], 2, "required", "stderr")]
#[case(&["decode", "--morse", "..x"], 1, "only contain", "stderr")]
#[case(&["encode", "sos"], 0, "Morse: ... --- ...", "stdout")]
#[case(&["capture", "--message", "sos"], 0, "Text: SOS", "stdout")]
#[case(&["capture", "--message", "sos", "--max-run-ms", "1"], 4, "max run time", "stderr")]
#[case(&["capture"], 2, "required", "stderr")]
#[case(&["encode", "sos", "--unit-ms", "18446744073709551615"], 1, "unit_ms must be between", "stderr")]
#[case(&["capture", "--message", "sos", "--unit-ms", "0"], 1, "unit_ms must be between", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("morse").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
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

#[rstest]
fn cli_reports_bad_alphabet_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let bad_csv = dir.path().join("alphabet.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "morse,letter").unwrap();
    writeln!(f, ".-,A").unwrap();

    let mut cmd = Command::cargo_bin("morse").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--alphabet")
        .arg(&bad_csv)
        .arg("self-check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid CSV headers"));
}

#[rstest]
fn custom_alphabet_drives_decoding() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let csv = dir.path().join("alphabet.csv");
    fs::write(&csv, "code,symbol\n.-,alpha\n-...,bravo\n").unwrap();

    let mut cmd = Command::cargo_bin("morse").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--alphabet")
        .arg(&csv)
        .arg("decode")
        .arg("--morse")
        .arg(".- -...");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Text: alphabravo"));
}

#[rstest]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[track]\nprimary = \"red\"\nsecondary = \"red\"\n").unwrap();

    let mut cmd = Command::cargo_bin("morse").unwrap();
    cmd.arg("--config").arg(&cfg).arg("self-check");

    cmd.assert().code(1).stderr(
        predicate::str::contains("Configuration is invalid")
            .and(predicate::str::contains("track.primary and track.secondary must differ")),
    );
}

#[rstest]
fn invalid_config_reports_config_reason_in_json() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[simulation]\nunit_ms = 600000\n").unwrap();

    let mut cmd = Command::cargo_bin("morse").unwrap();
    cmd.arg("--config").arg(&cfg).arg("--json").arg("self-check");

    let out = cmd.assert().code(1).get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["reason"], "Config");
    assert!(
        v["message"]
            .as_str()
            .unwrap()
            .contains("simulation.unit_ms must be between 1 and 60000")
    );
}

#[rstest]
fn drive_speed_beyond_motor_limit_is_a_drive_fault() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let text = fs::read_to_string(&cfg)
        .unwrap()
        .replace("speed_dps = 200", "speed_dps = 5000");
    fs::write(&cfg, text).unwrap();

    let mut cmd = Command::cargo_bin("morse").unwrap();
    cmd.arg("--config").arg(&cfg).args(["capture", "--message", "e"]);

    cmd.assert()
        .code(6)
        .stderr(predicate::str::contains("The drive rejected a command"));
}

#[rstest]
fn recorded_capture_decodes_offline() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    // "-.. .-" with one boundary artifact splitting the first dash
    let segments = dir.path().join("capture.csv");
    fs::write(
        &segments,
        "kind,duration_s\n\
         signal,0.2\nboundary,0.5\nsignal,0.1\ngap,0.1\n\
         signal,0.1\ngap,0.1\nsignal,0.1\ngap,0.3\n\
         signal,0.1\ngap,0.1\nsignal,0.3\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("morse").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("decode")
        .arg("--segments")
        .arg(&segments);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Morse: -.. .-"))
        .stdout(predicate::str::contains("Text: DA"));
}

#[rstest]
fn too_short_capture_is_not_an_error() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let segments = dir.path().join("capture.csv");
    fs::write(&segments, "kind,duration_s\nsignal,0.1\n").unwrap();

    let mut cmd = Command::cargo_bin("morse").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("decode")
        .arg("--segments")
        .arg(&segments);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("no message captured"));
}

#[rstest]
fn encoded_tape_can_be_captured() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let tape = dir.path().join("tape.csv");

    Command::cargo_bin("morse")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("encode")
        .arg("sos")
        .arg("--tape-out")
        .arg(&tape)
        .assert()
        .success()
        .stdout(predicate::str::contains("Morse: ... --- ..."));

    let written = fs::read_to_string(&tape).unwrap();
    assert!(written.starts_with("color,travel_ms,realign_ms\nbrown,100,\nred,40,"));

    Command::cargo_bin("morse")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("capture")
        .arg("--tape")
        .arg(&tape)
        .assert()
        .success()
        .stdout(predicate::str::contains("Text: SOS"));
}
