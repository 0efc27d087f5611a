//! End-to-end tests for the `inoreader-mcp` binary
//!
//! Drives the stdio server with canned JSON-RPC lines and checks the
//! newline-delimited responses on stdout, plus the `auth` subcommands that
//! need no network.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn base_command(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("inoreader-mcp").unwrap();
    cmd.env("INOREADER_APP_ID", "1000000001")
        .env("INOREADER_APP_KEY", "test_app_key")
        .env("INOREADER_TOKEN_PATH", dir.path().join("tokens.json"))
        .env_remove("INOREADER_USERNAME")
        .env_remove("INOREADER_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn run_session(input: &str) -> Vec<Value> {
    let dir = TempDir::new().unwrap();
    let output = base_command(&dir)
        .arg("serve")
        .write_stdin(input.to_string())
        .output()
        .expect("binary runs");
    assert!(output.status.success(), "server exited with {:?}", output.status);

    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout carries only JSON-RPC"))
        .collect()
}

#[test]
fn test_initialize_handshake() {
    let responses = run_session(concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"0"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
    ));

    assert_eq!(responses.len(), 1);
    let result = &responses[0]["result"];
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "inoreader-mcp");
    assert!(result["capabilities"]["tools"].is_object());
}

#[test]
fn test_tools_list_reports_full_catalog() {
    let responses = run_session("{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n");

    let tools = responses[0]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 19);
    assert_eq!(tools[0]["name"], "inoreader_list_feeds");
    assert_eq!(tools[18]["name"], "inoreader_untag_article");
}

#[test]
fn test_unknown_method_and_malformed_line() {
    let responses = run_session(concat!(
        "this is not json\n",
        r#"{"jsonrpc":"2.0","id":"a","method":"resources/list"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":"b","method":"ping"}"#,
        "\n",
    ));

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], "a");
    assert_eq!(responses[0]["error"]["code"], -32601);
    assert_eq!(responses[1]["id"], "b");
    assert!(responses[1]["result"].is_object());
}

#[test]
fn test_tool_call_without_tokens_is_error_result() {
    let responses = run_session(concat!(
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"inoreader_stats","arguments":{}}}"#,
        "\n",
    ));

    let result = &responses[0]["result"];
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Not authenticated"), "{text}");
}

#[test]
fn test_serve_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = base_command(&dir);
    cmd.env_remove("INOREADER_APP_ID")
        .env_remove("INOREADER_APP_KEY")
        .arg("serve")
        .write_stdin("");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("INOREADER_APP_ID"));
}

#[test]
fn test_auth_status_without_tokens() {
    let dir = TempDir::new().unwrap();
    base_command(&dir)
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not authenticated"));
}

#[test]
fn test_auth_login_prints_authorization_url() {
    let dir = TempDir::new().unwrap();
    base_command(&dir)
        .args(["auth", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oauth2/auth?client_id=1000000001"));

    assert!(dir.path().join("oauth_state.txt").exists());
}
