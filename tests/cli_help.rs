use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_flags() {
    cargo_bin_cmd!("mdtail")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--events"))
        .stdout(predicate::str::contains("--no-spinner"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("mdtail")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}

#[test]
fn test_requires_terminal_on_stdout() {
    // With stdout captured (not a tty), startup fails before any rendering.
    cargo_bin_cmd!("mdtail")
        .write_stdin("# hello\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs a terminal"));
}
