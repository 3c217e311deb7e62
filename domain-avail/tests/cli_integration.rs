// domain-avail/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::{tempdir, TempDir};

/// Command isolated from any config files on the host.
fn domain_avail(sandbox: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("domain-avail").unwrap();
    cmd.current_dir(sandbox.path())
        .env("HOME", sandbox.path())
        .env("XDG_CONFIG_HOME", sandbox.path())
        .env_remove("DA_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Answer a single WHOIS connection with `response`, returning the port.
fn one_shot_whois_server(response: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((mut socket, _)) = listener.accept() {
            let mut buf = [0u8; 512];
            let _ = socket.read(&mut buf);
            let _ = socket.write_all(response.as_bytes());
        }
    });

    port
}

#[test]
fn test_help_lists_commands() {
    let sandbox = tempdir().unwrap();
    domain_avail(&sandbox)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_check_help_shows_lookup_flags() {
    let sandbox = tempdir().unwrap();
    domain_avail(&sandbox)
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-dns"))
        .stdout(predicate::str::contains("--follow"))
        .stdout(predicate::str::contains("--max-concurrency"));
}

#[test]
fn test_invalid_domain_exits_with_input_error() {
    let sandbox = tempdir().unwrap();
    domain_avail(&sandbox)
        .args(["check", "example.com;not a domain"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"not a domain\" is not a valid domain"));
}

#[test]
fn test_empty_domains_exits_with_input_error() {
    let sandbox = tempdir().unwrap();
    domain_avail(&sandbox)
        .args(["check", ""])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("domains parameter is required"));
}

#[test]
fn test_follow_out_of_range_is_rejected() {
    let sandbox = tempdir().unwrap();
    domain_avail(&sandbox)
        .args(["check", "example.com", "--follow", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--follow"));
}

#[test]
fn test_missing_config_file_fails_startup() {
    let sandbox = tempdir().unwrap();
    domain_avail(&sandbox)
        .args(["check", "example.com", "--config", "does-not-exist.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_invalid_config_file_fails_startup() {
    let sandbox = tempdir().unwrap();
    let path = sandbox.path().join("bad.toml");
    fs::write(&path, "[lookup]\nfollow = 3\n").unwrap();

    domain_avail(&sandbox)
        .args(["check", "example.com", "--config"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("lookup.follow must be 0 or 1"));
}

#[test]
fn test_check_against_local_whois_server() {
    let sandbox = tempdir().unwrap();
    let port = one_shot_whois_server("No match for \"FRESH-NAME.TEST\".\r\n");
    let config = format!(
        "[lookup]\ndns_precheck = false\n\n[whois]\nport = {}\n\n[whois.servers]\ntest = \"127.0.0.1\"\n",
        port
    );
    fs::write(sandbox.path().join("domain-avail.toml"), config).unwrap();

    domain_avail(&sandbox)
        .args(["check", "fresh-name.test"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "[{\"domain\":\"fresh-name.test\",\"available\":true}]\n",
        ));
}
