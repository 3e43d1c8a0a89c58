//! End-to-end exercise of the agent host binary over its stdio protocol:
//! spawn the real process, then drive initialize, list_tools, and
//! call_tool through its stdin/stdout.

use proposal_backend::pool::protocol::{Request, RequestBody, Response, ResponseBody};
use serde_json::json;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

fn spawn_host(agent_id: &str, data_dir: &std::path::Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_agent_host"))
        .arg(agent_id)
        .env("ANTHROPIC_API_KEY", "test-key")
        .env("TAVILY_API_KEY", "test-key")
        .env("DATA_DIR", data_dir)
        .env("EXPORT_DIR", data_dir.join("exports"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to spawn agent host")
}

async fn roundtrip(
    stdin: &mut ChildStdin,
    lines: &mut Lines<BufReader<ChildStdout>>,
    request: Request,
) -> Response {
    let mut line = serde_json::to_string(&request).unwrap();
    line.push('\n');
    stdin.write_all(line.as_bytes()).await.unwrap();
    stdin.flush().await.unwrap();

    loop {
        let raw = tokio::time::timeout(RESPONSE_TIMEOUT, lines.next_line())
            .await
            .expect("timed out waiting for agent response")
            .expect("failed to read from agent")
            .expect("agent closed stdout");
        if raw.trim().is_empty() {
            continue;
        }
        let response: Response = serde_json::from_str(&raw).expect("invalid response line");
        if response.id == request.id {
            return response;
        }
    }
}

fn call(id: &str, tool_name: &str, arguments: serde_json::Value) -> Request {
    Request {
        id: id.to_string(),
        body: RequestBody::CallTool {
            tool_name: tool_name.to_string(),
            arguments,
        },
    }
}

#[tokio::test]
async fn test_stdio_round_trip_against_spawned_host() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = spawn_host("pricing", dir.path());
    let mut stdin = child.stdin.take().unwrap();
    let mut lines = BufReader::new(child.stdout.take().unwrap()).lines();

    let response = roundtrip(
        &mut stdin,
        &mut lines,
        Request {
            id: "init".to_string(),
            body: RequestBody::Initialize,
        },
    )
    .await;
    match response.result {
        Some(ResponseBody::Initialized {
            agent_id,
            tool_count,
        }) => {
            assert_eq!(agent_id, "pricing");
            assert_eq!(tool_count, 3);
        }
        other => panic!("unexpected initialize response: {:?}", other),
    }

    let response = roundtrip(
        &mut stdin,
        &mut lines,
        Request {
            id: "tools".to_string(),
            body: RequestBody::ListTools,
        },
    )
    .await;
    match response.result {
        Some(ResponseBody::Tools(descriptors)) => {
            assert_eq!(descriptors.len(), 3);
            assert!(descriptors.iter().any(|d| d.name == "get_rate_card"));
            assert!(descriptors.iter().all(|d| d.input_schema.is_object()));
        }
        other => panic!("unexpected list_tools response: {:?}", other),
    }

    // Unknown tools keep the pool-level error shape over the wire.
    let response = roundtrip(
        &mut stdin,
        &mut lines,
        call("unknown", "nonexistent", json!({})),
    )
    .await;
    match response.result {
        Some(ResponseBody::ToolOutput { content, .. }) => {
            assert_eq!(
                content,
                r#"{"error":"Tool 'nonexistent' not found on agent 'pricing'"}"#
            );
        }
        other => panic!("unexpected call_tool response: {:?}", other),
    }

    // Validation failures surface as protocol errors before any network use.
    let response = roundtrip(
        &mut stdin,
        &mut lines,
        call(
            "bad-input",
            "estimate_project",
            json!({"project_description": "short", "duration_weeks": 12}),
        ),
    )
    .await;
    assert!(response.result.is_none());
    assert!(response.error.is_some());

    // Closing stdin shuts the host down cleanly.
    drop(stdin);
    let status = tokio::time::timeout(RESPONSE_TIMEOUT, child.wait())
        .await
        .expect("timed out waiting for host exit")
        .unwrap();
    assert!(status.success());
}
