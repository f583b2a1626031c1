//! CLI argument parsing tests for the sockowner command.
//!
//! These tests verify that command-line arguments are correctly parsed
//! and rejected before any lookup takes place.

use assert_cmd::Command;
use predicates::prelude::*;

fn sockowner_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sockowner"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        sockowner_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Find the process owning"))
            .stdout(predicate::str::contains("--proc-root"))
            .stdout(predicate::str::contains("--json"));
    }

    #[test]
    fn test_version() {
        sockowner_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("sockowner"));
    }

    #[test]
    fn test_missing_arguments() {
        sockowner_cmd()
            .arg("tcp")
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }
}

mod arguments {
    use super::*;

    #[test]
    fn test_invalid_network() {
        sockowner_cmd()
            .args(["sctp", "127.0.0.1:51000", "93.184.216.34:443"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid network: sctp"));
    }

    #[test]
    fn test_invalid_local_address() {
        sockowner_cmd()
            .args(["tcp", "localhost", "93.184.216.34:443"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn test_missing_port() {
        sockowner_cmd()
            .args(["udp", "127.0.0.1:53", "10.0.0.1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("<REMOTE>"));
    }

    #[test]
    fn test_unknown_connection_fails() {
        sockowner_cmd()
            .args(["tcp", "127.0.0.1:1", "127.0.0.1:2"])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty());
    }
}

mod config_file {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_config() {
        sockowner_cmd()
            .args(["--config", "/nonexistent/sockowner.json"])
            .args(["tcp", "127.0.0.1:51000", "93.184.216.34:443"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read config"));
    }

    #[test]
    fn test_unknown_config_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "proc_root": "/proc", "cache_size": 10 }}"#).unwrap();

        sockowner_cmd()
            .arg("--config")
            .arg(file.path())
            .args(["tcp", "127.0.0.1:51000", "93.184.216.34:443"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid config"));
    }
}
