//! Interactive console for the proposal assistant.
//!
//! Reads user messages from stdin and runs them through the orchestrator.
//! Slash commands: /new resets the conversation, /agents lists connected
//! agents, /quit exits.

use proposal_backend::agents::agent_registry;
use proposal_backend::ai::{ClaudeClient, LinearBackoff, TavilyClient};
use proposal_backend::config::{Config, PoolMode};
use proposal_backend::orchestrator::Orchestrator;
use proposal_backend::pool::{InProcessPool, SubprocessPool, ToolPool};
use proposal_backend::tools::{create_default_registry, ToolContext};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(missing) => {
            eprintln!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
            return ExitCode::FAILURE;
        }
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

    let pool: Arc<dyn ToolPool> = match config.pool_mode {
        PoolMode::Subprocess => {
            log::info!("[main] Using subprocess agent pool");
            Arc::new(SubprocessPool::new())
        }
        PoolMode::InProcess => {
            log::info!("[main] Using in-process agent pool");
            let context = ToolContext {
                generator: claude.clone(),
                search: Arc::new(TavilyClient::new(&config.tavily_api_key, None)),
                data_dir: config.data_dir.clone(),
                export_dir: config.export_dir.clone(),
            };
            Arc::new(InProcessPool::new(create_default_registry(), context))
        }
    };

    let mut orchestrator = Orchestrator::new(
        claude,
        pool.clone(),
        agent_registry(),
        config.orchestrator_model.clone(),
        config.max_iterations,
    );
    orchestrator.start().await;

    println!("Smart Proposal Agent. Commands: /new, /agents, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if stdout.write_all(b"> ").await.is_err() {
            break;
        }
        let _ = stdout.flush().await;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("[main] stdin error: {}", e);
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/new" => {
                orchestrator.reset_conversation();
                println!("Conversation reset.");
            }
            "/agents" => {
                let connected = pool.connected_agents();
                if connected.is_empty() {
                    println!("No agents connected.");
                } else {
                    println!("Connected agents: {}", connected.join(", "));
                }
            }
            message => match orchestrator.chat(message).await {
                Ok(reply) => println!("\n{}\n", reply),
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    orchestrator.stop().await;
    ExitCode::SUCCESS
}
