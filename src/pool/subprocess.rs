//! Pool variant that runs each agent as a host subprocess and speaks the
//! line-delimited JSON-RPC protocol over its stdio.

use crate::agents::{AgentCard, AgentStatus};
use crate::pool::protocol::{Request, RequestBody, Response, ResponseBody};
use crate::pool::{PoolToolOutput, ToolDescriptor, ToolPool};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Upper bound for one request round trip. Generation tools can take a
/// couple of minutes under retry backoff.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(300);

struct ConnectionIo {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

struct AgentConnection {
    agent_name: String,
    io: Mutex<ConnectionIo>,
    cancel: CancellationToken,
}

impl AgentConnection {
    async fn request(&self, body: RequestBody) -> Result<ResponseBody, String> {
        let request = Request {
            id: Uuid::new_v4().to_string(),
            body,
        };
        let mut line = serde_json::to_string(&request)
            .map_err(|e| format!("failed to encode request: {}", e))?;
        line.push('\n');

        let mut io = self.io.lock().await;
        io.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| format!("failed to write to agent: {}", e))?;
        io.stdin
            .flush()
            .await
            .map_err(|e| format!("failed to write to agent: {}", e))?;

        loop {
            let next = tokio::time::timeout(RESPONSE_TIMEOUT, io.lines.next_line())
                .await
                .map_err(|_| "timed out waiting for agent response".to_string())?
                .map_err(|e| format!("failed to read from agent: {}", e))?;
            let Some(raw) = next else {
                return Err("agent process closed the connection".to_string());
            };
            if raw.trim().is_empty() {
                continue;
            }
            let response: Response = serde_json::from_str(&raw)
                .map_err(|e| format!("invalid agent response: {}", e))?;
            if response.id != request.id {
                log::warn!("[pool] Dropping stale response with id {}", response.id);
                continue;
            }
            return match (response.result, response.error) {
                (Some(body), _) => Ok(body),
                (None, Some(message)) => Err(message),
                (None, None) => Err("empty agent response".to_string()),
            };
        }
    }
}

/// Resolve a bare command name to a sibling of the current executable
/// when one exists, so agent hosts run from the same build.
fn resolve_command(name: &str) -> PathBuf {
    if !name.contains(std::path::MAIN_SEPARATOR) {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let sibling = dir.join(name);
                if sibling.exists() {
                    return sibling;
                }
            }
        }
    }
    PathBuf::from(name)
}

pub struct SubprocessPool {
    connections: DashMap<String, AgentConnection>,
}

impl SubprocessPool {
    pub fn new() -> Self {
        SubprocessPool {
            connections: DashMap::new(),
        }
    }
}

impl Default for SubprocessPool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolPool for SubprocessPool {
    async fn connect(&self, card: &AgentCard) -> Result<(), String> {
        if card.status == AgentStatus::Offline {
            log::warn!(
                "[pool] Agent '{}' is offline, skipping connection",
                card.agent_id
            );
            return Ok(());
        }
        let Some(program) = card.server_command.first() else {
            return Err(format!("agent '{}' has no server command", card.agent_id));
        };

        let mut child = Command::new(resolve_command(program))
            .args(&card.server_command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start agent '{}': {}", card.agent_id, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| format!("no stdin for agent '{}'", card.agent_id))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| format!("no stdout for agent '{}'", card.agent_id))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| format!("no stderr for agent '{}'", card.agent_id))?;

        let cancel = CancellationToken::new();
        let stderr_cancel = cancel.clone();
        let stderr_agent = card.agent_id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                tokio::select! {
                    _ = stderr_cancel.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(text)) => log::debug!("[agent:{}] {}", stderr_agent, text),
                        _ => break,
                    },
                }
            }
        });

        let connection = AgentConnection {
            agent_name: card.name.clone(),
            io: Mutex::new(ConnectionIo {
                child,
                stdin,
                lines: BufReader::new(stdout).lines(),
            }),
            cancel,
        };

        match connection.request(RequestBody::Initialize).await {
            Ok(ResponseBody::Initialized {
                agent_id,
                tool_count,
            }) => {
                log::info!(
                    "[pool] Connected to agent '{}' ({} tools)",
                    card.name,
                    tool_count
                );
                if agent_id != card.agent_id {
                    log::warn!(
                        "[pool] Agent identifies as '{}' but card says '{}'",
                        agent_id,
                        card.agent_id
                    );
                }
            }
            Ok(_) => {
                return Err(format!(
                    "agent '{}' gave an unexpected initialize response",
                    card.agent_id
                ))
            }
            Err(e) => {
                return Err(format!(
                    "agent '{}' failed to initialize: {}",
                    card.agent_id, e
                ))
            }
        }

        self.connections.insert(card.agent_id.clone(), connection);
        Ok(())
    }

    async fn disconnect_all(&self) {
        let ids: Vec<String> = self
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for id in ids {
            if let Some((_, connection)) = self.connections.remove(&id) {
                connection.cancel.cancel();
                let mut io = connection.io.lock().await;
                if let Err(e) = io.child.start_kill() {
                    log::debug!("[pool] Could not kill agent '{}': {}", id, e);
                }
                let _ = io.child.wait().await;
                log::info!("[pool] Disconnected from agent '{}'", connection.agent_name);
            }
        }
    }

    fn connected_agents(&self) -> Vec<String> {
        self.connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    async fn list_tools(&self) -> HashMap<String, Vec<ToolDescriptor>> {
        let mut all_tools = HashMap::new();
        let ids = self.connected_agents();
        for id in ids {
            let Some(connection) = self.connections.get(&id) else {
                continue;
            };
            match connection.request(RequestBody::ListTools).await {
                Ok(ResponseBody::Tools(descriptors)) => {
                    all_tools.insert(id, descriptors);
                }
                Ok(_) => log::error!("[pool] Unexpected list_tools response from '{}'", id),
                Err(e) => log::error!("[pool] Failed to list tools on '{}': {}", id, e),
            }
        }
        all_tools
    }

    async fn call(&self, agent_id: &str, tool_name: &str, arguments: Value) -> PoolToolOutput {
        let Some(connection) = self.connections.get(agent_id) else {
            return PoolToolOutput::agent_not_found(agent_id);
        };
        match connection
            .request(RequestBody::CallTool {
                tool_name: tool_name.to_string(),
                arguments,
            })
            .await
        {
            Ok(ResponseBody::ToolOutput { content, kind }) => PoolToolOutput::text(content, kind),
            Ok(_) => PoolToolOutput::call_failed("unexpected agent response"),
            Err(e) => {
                log::error!("[pool] Error calling {}/{}: {}", agent_id, tool_name, e);
                PoolToolOutput::call_failed(&e)
            }
        }
    }
}
