// CLI integration tests against a scripted stand-in for the ipset executable.
#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;

const LIST_OUTPUT: &str = "Name: foo
Type: hash:ip
Revision: 4
Header: family inet hashsize 1024 maxelem 65536
Size in memory: 248
References: 2
Number of entries: 2
Members:
1.1.1.1
1.1.1.2
";

const SAVE_OUTPUT: &str = "create foo hash:ip family inet hashsize 1024 maxelem 65536
add foo 1.1.1.1
add foo 1.1.1.2
";

/// Writes an `ipset` replacement that logs each argv line to `calls.log`.
fn fake_ipset(dir: &Path) -> PathBuf {
    let log = dir.join("calls.log");
    let restored = dir.join("restored");
    let script = format!(
        r#"#!/bin/sh
echo "$*" >> '{log}'
case "$1" in
  version)
    echo "ipset v7.1, protocol version: 7"
    ;;
  list)
    cat <<'OUT'
{list}OUT
    ;;
  save)
    cat <<'OUT'
{save}OUT
    ;;
  test)
    if [ "$3" = "1.1.1.1" ]; then
      echo "Warning: $3 is in set $2." >&2
    else
      echo "$3 is NOT in set $2." >&2
      exit 1
    fi
    ;;
  create)
    if [ "$2" = "taken" ]; then
      echo "ipset v7.1: Set cannot be created: set with the same name already exists" >&2
      exit 1
    fi
    ;;
  restore)
    cat >> '{restored}'
    ;;
esac
exit 0
"#,
        log = log.display(),
        restored = restored.display(),
        list = LIST_OUTPUT,
        save = SAVE_OUTPUT,
    );
    let path = dir.join("ipset");
    fs::write(&path, script).expect("write fake ipset");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake ipset");
    path
}

fn cmd(ipset: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ipsetctl"));
    command.arg("--ipset").arg(ipset);
    command
}

fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn parse_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

// Log lines may precede the error envelope; it is always the last line.
fn stderr_error(output: &Output) -> Value {
    let text = String::from_utf8_lossy(&output.stderr);
    let line = text.lines().last().expect("error line");
    let value: Value = serde_json::from_str(line).expect("valid json");
    value["error"].clone()
}

#[test]
fn check_reports_resolved_program() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let check = cmd(&ipset).arg("check").output().expect("check");
    assert!(check.status.success());
    let json = parse_json(&check.stdout);
    assert_eq!(json["supported"], true);
    assert!(json["program"].as_str().expect("program").ends_with("ipset"));
    assert_eq!(calls(temp.path()), vec!["version"]);
}

#[test]
fn create_passes_compiled_arguments() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let create = cmd(&ipset)
        .args([
            "create",
            "blocklist",
            "hash:ip",
            "--timeout",
            "1h",
            "--exist",
            "--family",
            "inet",
            "--hashsize",
            "1024",
            "--packets",
            "5",
        ])
        .output()
        .expect("create");
    assert!(create.status.success());
    assert!(create.stdout.is_empty());
    assert_eq!(
        calls(temp.path()),
        vec!["create blocklist hash:ip timeout 3600 -exist family inet hashsize 1024"]
    );
}

#[test]
fn tool_failure_exits_with_command_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let create = cmd(&ipset)
        .args(["create", "taken", "hash:ip"])
        .output()
        .expect("create");
    assert_eq!(create.status.code(), Some(5));
    let error = stderr_error(&create);
    assert_eq!(error["kind"], "Command");
    assert!(
        error["message"]
            .as_str()
            .expect("message")
            .starts_with("ipset: can't create taken hash:ip: ipset v7.1: Set cannot be created")
    );
}

#[test]
fn test_reports_presence_through_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let present = cmd(&ipset)
        .args(["test", "foo", "1.1.1.1"])
        .output()
        .expect("test present");
    assert!(present.status.success());
    assert_eq!(parse_json(&present.stdout)["present"], true);

    let absent = cmd(&ipset)
        .args(["test", "foo", "1.1.1.9"])
        .output()
        .expect("test absent");
    assert_eq!(absent.status.code(), Some(8));
    assert_eq!(parse_json(&absent.stdout)["present"], false);
    assert!(absent.stderr.is_empty());
}

#[test]
fn list_emits_parsed_info() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let list = cmd(&ipset)
        .args(["list", "foo", "--type", "hash:ip", "--resolve"])
        .output()
        .expect("list");
    assert!(list.status.success());
    let json = parse_json(&list.stdout);
    assert_eq!(json["name"], "foo");
    assert_eq!(json["type"], "hash:ip");
    assert_eq!(json["revision"], 4);
    assert_eq!(json["header"], "family inet hashsize 1024 maxelem 65536");
    assert_eq!(json["size_in_memory"], 248);
    assert_eq!(json["references"], 2);
    assert_eq!(json["entries"], serde_json::json!(["1.1.1.1", "1.1.1.2"]));
    assert_eq!(calls(temp.path()), vec!["list foo -resolve"]);
}

#[test]
fn list_raw_passes_output_through() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let list = cmd(&ipset)
        .args(["list", "foo", "--raw"])
        .output()
        .expect("list");
    assert!(list.status.success());
    assert_eq!(String::from_utf8_lossy(&list.stdout), LIST_OUTPUT);
}

#[test]
fn save_to_file_is_private() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());
    let target = temp.path().join("foo.save");

    let save = cmd(&ipset)
        .args(["save", "foo", "-o"])
        .arg(&target)
        .output()
        .expect("save");
    assert!(save.status.success());
    assert_eq!(fs::read_to_string(&target).expect("read"), SAVE_OUTPUT);
    let mode = fs::metadata(&target).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn restore_from_stdin_is_chunked() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());
    let input = "add foo 1.1.1.1\nadd foo 1.1.1.2\nadd foo 1.1.1.3\n";

    let mut child = cmd(&ipset)
        .args(["--max-restore-size", "20", "restore", "foo", "hash:ip", "--exist"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn restore");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    let restore = child.wait_with_output().expect("restore");
    assert!(restore.status.success());

    assert_eq!(
        fs::read_to_string(temp.path().join("restored")).expect("restored"),
        input
    );
    let sessions = calls(temp.path());
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().all(|line| line == "restore -exist"));
}

#[test]
fn flush_without_name_flushes_all() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let flush = cmd(&ipset).arg("flush").output().expect("flush");
    assert!(flush.status.success());
    let rename = cmd(&ipset)
        .args(["rename", "foo", "bar"])
        .output()
        .expect("rename");
    assert!(rename.status.success());
    assert_eq!(calls(temp.path()), vec!["flush", "rename foo bar"]);
}

#[test]
fn missing_executable_exits_with_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("no-such-ipset");

    let check = cmd(&missing).arg("check").output().expect("check");
    assert_eq!(check.status.code(), Some(3));
    let error = stderr_error(&check);
    assert_eq!(error["kind"], "NotFound");
    assert!(error["hint"].as_str().expect("hint").contains("--ipset"));
}

#[test]
fn unknown_set_type_is_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let create = cmd(&ipset)
        .args(["create", "foo", "hash:bogus"])
        .output()
        .expect("create");
    assert_eq!(create.status.code(), Some(2));
    let error = stderr_error(&create);
    assert_eq!(error["kind"], "Usage");
    assert!(error["hint"].as_str().expect("hint").contains("ipsetctl types"));
    assert!(calls(temp.path()).is_empty());
}

#[test]
fn types_lists_every_set_type() {
    let temp = tempfile::tempdir().expect("tempdir");
    let ipset = fake_ipset(temp.path());

    let types = cmd(&ipset).arg("types").output().expect("types");
    assert!(types.status.success());
    let json = parse_json(&types.stdout);
    let names = json["types"].as_array().expect("types array");
    assert_eq!(names.len(), 16);
    assert!(names.iter().any(|name| name == "hash:net,iface"));
    assert!(names.iter().any(|name| name == "list:set"));
}
