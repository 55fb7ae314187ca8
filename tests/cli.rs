//! Integration tests for the `yaml-walk` command line

use std::io::Write;
use std::process::{Command, Stdio};

use indoc::indoc;
use similar::TextDiff;

/// Run yaml-walk with given args and stdin, return (stdout, stderr, exit code)
fn run(args: &[&str], stdin_data: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_yaml-walk"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn yaml-walk");

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(stdin_data.as_bytes())
            .expect("Failed to write to stdin");
    }

    let output = child.wait_with_output().expect("Failed to wait on child");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn assert_output_eq(actual: &str, expected: &str) {
    if actual != expected {
        let diff = TextDiff::from_lines(expected, actual);
        eprintln!();
        for line in diff
            .unified_diff()
            .header("expected", "actual")
            .to_string()
            .lines()
        {
            if line.starts_with('-') {
                eprintln!("\x1b[31m{}\x1b[0m", line);
            } else if line.starts_with('+') {
                eprintln!("\x1b[32m{}\x1b[0m", line);
            } else if line.starts_with('@') {
                eprintln!("\x1b[36m{}\x1b[0m", line);
            } else {
                eprintln!("{}", line);
            }
        }
        panic!("Output mismatch - see diff above");
    }
}

fn assert_ok(args: &[&str], stdin_data: &str, expected: &str) {
    let (stdout, stderr, code) = run(args, stdin_data);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert_output_eq(&stdout, expected);
}

const SERVICE: &str = indoc! {"
    name: web
    owner:
      team: infra
    ports:
    - http
    - https
"};

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_get_value() {
    assert_ok(&["get-value", "owner.team"], SERVICE, "infra");
    assert_ok(&["get-value", "ports.-1"], SERVICE, "https");
}

#[test]
fn test_get_value_wildcard() {
    assert_ok(&["get-value", "ports.*"], SERVICE, "http\nhttps");
}

#[test]
fn test_get_value_as_yaml() {
    assert_ok(&["-y", "get-value", "owner"], SERVICE, "team: infra\n");
}

#[test]
fn test_get_value_default() {
    assert_ok(&["get-value", "owner.email", "none"], SERVICE, "none");
}

#[test]
fn test_get_value_missing() {
    let (stdout, stderr, code) = run(&["get-value", "owner.email"], SERVICE);
    assert_eq!(code, 127);
    assert!(stdout.is_empty());
    assert!(
        stderr.contains("invalid path 'owner.email'"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_get_value_missing_quiet() {
    let (stdout, stderr, code) = run(&["-q", "get-value", "owner.email"], SERVICE);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.is_empty(), "stderr: {}", stderr);
}

#[test]
fn test_scalars() {
    assert_ok(&["scalars"], SERVICE, "web\ninfra\nhttp\nhttps\n");
    assert_ok(&["scalars", "ports"], SERVICE, "http\nhttps\n");
}

#[test]
fn test_scalars_breadth_first() {
    assert_ok(&["scalars", "-b"], SERVICE, "web\ninfra\nhttp\nhttps\n");
    assert_ok(
        &["scalars", "--breadth-first"],
        indoc! {"
            deep:
              deeper: [x]
            shallow: [y]
        "},
        "y\nx\n",
    );
}

#[test]
fn test_scalars_max_depth() {
    assert_ok(&["scalars", "-d", "0"], SERVICE, "web\n");
}

#[test]
fn test_keys() {
    assert_ok(&["keys"], SERVICE, "name\nowner\nports\n");
    assert_ok(&["keys", "owner"], SERVICE, "team\n");
}

#[test]
fn test_key_values() {
    assert_ok(&["key-values", "owner"], SERVICE, "team\ninfra\n");
}

#[test]
fn test_keys_of_sequence_fails() {
    let (_, stderr, code) = run(&["keys", "ports"], SERVICE);
    assert_eq!(code, 127);
    assert!(stderr.contains("expected node kind"), "stderr: {}", stderr);
}

const MERGED: &str = indoc! {"
    base: &b {a: 1, b: 2}
    svc: {<<: *b, b: 20}
"};

#[test]
fn test_keys_resolve_merges() {
    assert_ok(&["keys", "svc"], MERGED, "a\nb\n");
    assert_ok(&["keys", "svc", "--merges-last"], MERGED, "b\na\n");
    assert_ok(
        &["keys", "svc", "--allow-duplicate-merge-keys"],
        MERGED,
        "a\nb\nb\n",
    );
}

#[test]
fn test_key_values_resolve_merges() {
    assert_ok(&["key-values", "svc"], MERGED, "a\n1\nb\n20\n");
    assert_ok(
        &["key-values", "svc", "--merges-last"],
        MERGED,
        "b\n20\na\n1\n",
    );
    assert_ok(
        &["key-values", "svc", "--allow-duplicate-merge-keys"],
        MERGED,
        "a\n1\nb\n2\nb\n20\n",
    );
}

#[test]
fn test_get_value_through_alias() {
    assert_ok(
        &["-y", "get-value", "svc"],
        "base: &b {a: 1}\nsvc: *b\n",
        "a: 1\n",
    );
}

// =============================================================================
// Edits
// =============================================================================

#[test]
fn test_set_value_simple() {
    assert_ok(&["set-value", "name", "new"], "name: old\n", "name: new\n");
}

#[test]
fn test_set_value_nested_path() {
    assert_ok(
        &["set-value", "config.host", "localhost"],
        "config: {}\n",
        "config:\n  host: localhost\n",
    );
}

#[test]
fn test_set_value_creates_missing_keys() {
    assert_ok(
        &["set-value", "a.b.c", "deep"],
        "\n",
        indoc! {"
            a:
              b:
                c: deep
        "},
    );
}

#[test]
fn test_set_value_yaml() {
    assert_ok(
        &["set-value", "-y", "owner", "{team: ops}"],
        "owner: nobody\n",
        "owner:\n  team: ops\n",
    );
}

#[test]
fn test_set_value_through_scalar_fails() {
    let (_, stderr, code) = run(&["set-value", "name.first", "x"], "name: web\n");
    assert_eq!(code, 127);
    assert!(
        stderr.contains("cannot set key 'first' on a scalar"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_set_value_keeps_anchors_and_aliases() {
    assert_ok(
        &["set-value", "svc.b", "twenty"],
        MERGED,
        indoc! {"
            base: &b
              a: 1
              b: 2
            svc:
              <<: *b
              b: twenty
        "},
    );
}

#[test]
fn test_append() {
    assert_ok(
        &["append", "ports", "grpc"],
        SERVICE,
        indoc! {"
            name: web
            owner:
              team: infra
            ports:
            - http
            - https
            - grpc
        "},
    );
}

#[test]
fn test_append_creates_sequence() {
    assert_ok(&["append", "tags", "x"], "name: n\n", "name: n\ntags:\n- x\n");
}

#[test]
fn test_del() {
    assert_ok(
        &["del", "owner"],
        SERVICE,
        indoc! {"
            name: web
            ports:
            - http
            - https
        "},
    );
    assert_ok(
        &["del", "ports.0"],
        SERVICE,
        indoc! {"
            name: web
            owner:
              team: infra
            ports:
            - https
        "},
    );
}

#[test]
fn test_del_key_read_as_other_type() {
    let doc = "true: x\nnull: y\nname: z\n";
    assert_ok(&["del", "true"], doc, "null: y\nname: z\n");
    assert_ok(&["del", "null"], doc, "true: x\nname: z\n");
    assert_ok(&["get-value", "true"], doc, "x");
}

#[test]
fn test_del_missing_quiet() {
    let (stdout, _, code) = run(&["-q", "del", "nothing"], SERVICE);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
}

// =============================================================================
// Input and flags
// =============================================================================

#[test]
fn test_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.yaml");
    std::fs::write(&path, SERVICE).unwrap();
    let path = path.to_str().unwrap();

    assert_ok(&["-f", path, "get-value", "name"], "", "web");
    assert_ok(&["get-value", "name", "--file", path], "", "web");
}

#[test]
fn test_missing_file_is_named() {
    let (_, stderr, code) = run(&["-f", "/nonexistent/service.yaml", "keys"], "");
    assert_eq!(code, 127);
    assert!(stderr.contains("/nonexistent/service.yaml"), "stderr: {}", stderr);
}

#[test]
fn test_missing_action() {
    let (_, stderr, code) = run(&[], "");
    assert_eq!(code, 127);
    assert!(stderr.contains("Missing action"), "stderr: {}", stderr);
}

#[test]
fn test_color_flags_conflict() {
    let (_, stderr, code) = run(&["--color", "--no-color", "keys"], SERVICE);
    assert_eq!(code, 127);
    assert!(stderr.contains("Cannot use both"), "stderr: {}", stderr);
}

#[test]
fn test_version() {
    let (stdout, stderr, code) = run(&["-V"], "");
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.starts_with(&format!("version: {}\n", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.contains("libfyaml: "));
    assert!(stdout.contains("Rust: "));
}
