//! Agent host process.
//!
//! Serves one agent's tools over line-delimited JSON-RPC on stdio:
//! requests in on stdin, responses out on stdout, logs on stderr.
//! Started by the subprocess pool as `agent_host <agent_id>`.

use proposal_backend::ai::{ClaudeClient, LinearBackoff, TavilyClient};
use proposal_backend::config::Config;
use proposal_backend::pool::host::handle_request;
use proposal_backend::pool::protocol::{Request, Response};
use proposal_backend::tools::{create_agent_registry, ToolContext};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let Some(agent_id) = std::env::args().nth(1) else {
        eprintln!("usage: agent_host <agent_id>");
        return ExitCode::FAILURE;
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(missing) => {
            eprintln!("Missing required environment variables: {}", missing.join(", "));
            return ExitCode::FAILURE;
        }
    };

    let Some(registry) = create_agent_registry(&agent_id) else {
        eprintln!("Unknown agent id '{}'", agent_id);
        return ExitCode::FAILURE;
    };

    let claude = match ClaudeClient::new(
        &config.anthropic_api_key,
        None,
        Arc::new(LinearBackoff::default()),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to build API client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let context = ToolContext {
        generator: claude,
        search: Arc::new(TavilyClient::new(&config.tavily_api_key, None)),
        data_dir: config.data_dir.clone(),
        export_dir: config.export_dir.clone(),
    };

    log::info!("[agent_host] Serving agent '{}' ({} tools)", agent_id, registry.len());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("[agent_host] stdin error: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(&agent_id, &registry, &context, request).await,
            Err(e) => Response::err(String::new(), format!("invalid request: {}", e)),
        };

        let mut encoded = match serde_json::to_string(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::error!("[agent_host] Failed to encode response: {}", e);
                continue;
            }
        };
        encoded.push('\n');
        if stdout.write_all(encoded.as_bytes()).await.is_err() {
            break;
        }
        let _ = stdout.flush().await;
    }

    log::info!("[agent_host] Agent '{}' shutting down", agent_id);
    ExitCode::SUCCESS
}
