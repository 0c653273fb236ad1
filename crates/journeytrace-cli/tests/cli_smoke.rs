use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "journeytrace-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_journeytrace<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_journeytrace");
    Command::new(bin)
        .args(args)
        .output()
        .expect("journeytrace command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_signin_logs(path: &Path) {
    let logs = serde_json::json!([
        {
            "id": "log-1",
            "timestamp": "2024-05-01T10:00:00Z",
            "policyId": "B2C_1A_signup_signin",
            "correlationId": "corr-1",
            "clips": [
                {"kind": "Headers", "content": {
                    "correlationId": "corr-1",
                    "tenantId": "contoso.onmicrosoft.com",
                    "policyId": "B2C_1A_signup_signin",
                    "eventInstance": "Event:AUTH",
                }},
                {"kind": "Action", "content": "Web.TPEngine.StateMachineHandlers.ExecuteCurrentStepHandler"},
                {"kind": "HandlerResult", "content": {
                    "result": true,
                    "statebag": {"ORCH_CS": {"v": "1"}},
                }},
                {"kind": "Action", "content": "Web.TPEngine.StateMachineHandlers.SendClaimsHandler"},
                {"kind": "HandlerResult", "content": {
                    "statebag": {"Complex-CLMS": {"email": "user@contoso.com"}},
                }},
            ],
        }
    ]);
    fs::write(path, serde_json::to_string_pretty(&logs).expect("logs json"))
        .expect("logs file should be written");
}

fn write_exception_logs(path: &Path) {
    let logs = serde_json::json!([
        {
            "id": "log-1",
            "timestamp": "2024-05-01T10:00:00Z",
            "policyId": "B2C_1A_signup_signin",
            "correlationId": "corr-1",
            "clips": [
                {"kind": "Headers", "content": {
                    "correlationId": "corr-1",
                    "tenantId": "contoso.onmicrosoft.com",
                    "policyId": "B2C_1A_signup_signin",
                    "eventInstance": "Event:AUTH",
                }},
                {"kind": "Exception", "content": {
                    "kind": "System.InvalidOperationException",
                    "hResult": "0x80131509",
                    "message": "The policy could not be loaded.",
                }},
            ],
        }
    ]);
    fs::write(path, serde_json::to_string_pretty(&logs).expect("logs json"))
        .expect("logs file should be written");
}

#[test]
fn parse_json_reports_the_reconstructed_trace() {
    let dir = TempDirGuard::new("parse-json");
    let logs = dir.path().join("logs.json");
    write_signin_logs(&logs);

    let output = run_journeytrace(["parse", logs.to_str().expect("utf8 path"), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["success"], Value::Bool(true));
    assert_eq!(payload["mainJourneyId"], "B2C_1A_signup_signin");
    assert_eq!(payload["steps"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["sessions"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["finalClaims"]["email"], "user@contoso.com");
    assert_eq!(payload["flowTree"]["kind"], "Root");
}

#[test]
fn parse_text_output_renders_a_summary() {
    let dir = TempDirGuard::new("parse-text");
    let logs = dir.path().join("logs.json");
    write_signin_logs(&logs);

    let output = run_journeytrace(["parse", logs.to_str().expect("utf8 path")]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    assert!(stdout.contains("Journey: B2C_1A_signup_signin"));
    assert!(stdout.contains("Steps: 1"));
}

#[test]
fn errored_trace_exits_nonzero_unless_partial_allowed() {
    let dir = TempDirGuard::new("parse-errors");
    let logs = dir.path().join("logs.json");
    write_exception_logs(&logs);

    let strict = run_journeytrace(["parse", logs.to_str().expect("utf8 path"), "--json"]);
    assert_failure(&strict);
    let payload = parse_json_stdout(&strict);
    assert_eq!(payload["success"], Value::Bool(false));

    let partial = run_journeytrace([
        "parse",
        logs.to_str().expect("utf8 path"),
        "--json",
        "--allow-partial",
    ]);
    assert_success(&partial);
}

#[test]
fn unreadable_input_is_a_usage_error() {
    let output = run_journeytrace(["parse", "/nonexistent/logs.json"]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn inspect_counts_clip_kinds_per_log() {
    let dir = TempDirGuard::new("inspect");
    let logs = dir.path().join("logs.json");
    write_signin_logs(&logs);

    let output = run_journeytrace(["inspect", logs.to_str().expect("utf8 path"), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["logCount"], 1);
    let log = &payload["logs"][0];
    assert_eq!(log["clipKinds"]["Headers"], 1);
    assert_eq!(log["clipKinds"]["Action"], 2);
    assert_eq!(log["clipKinds"]["HandlerResult"], 2);
    assert_eq!(
        log["handlers"][0],
        "Web.TPEngine.StateMachineHandlers.ExecuteCurrentStepHandler"
    );
}
