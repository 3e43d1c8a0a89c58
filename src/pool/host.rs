//! Host side of the stdio protocol: serves one agent's registry.
//!
//! Lives in the library rather than the `agent_host` binary so the error
//! shapes stay in lockstep with the in-process pool and can be tested
//! against it directly.

use crate::pool::protocol::{Request, RequestBody, Response, ResponseBody};
use crate::pool::{PoolToolOutput, ToolDescriptor};
use crate::tools::{ToolContext, ToolRegistry};
use serde_json::Value;

/// Serve one protocol request against the agent's registry.
pub async fn handle_request(
    agent_id: &str,
    registry: &ToolRegistry,
    context: &ToolContext,
    request: Request,
) -> Response {
    match request.body {
        RequestBody::Initialize => Response::ok(
            request.id,
            ResponseBody::Initialized {
                agent_id: agent_id.to_string(),
                tool_count: registry.len(),
            },
        ),
        RequestBody::ListTools => {
            let descriptors: Vec<ToolDescriptor> = registry
                .tools_for_agent(agent_id)
                .into_iter()
                .map(|definition| ToolDescriptor {
                    name: definition.name,
                    description: definition.description,
                    input_schema: serde_json::to_value(definition.input_schema)
                        .unwrap_or(Value::Null),
                })
                .collect();
            Response::ok(request.id, ResponseBody::Tools(descriptors))
        }
        RequestBody::CallTool {
            tool_name,
            arguments,
        } => {
            // Unknown tools render the pool-level error shape, not a
            // protocol error, so both pool variants report them the same.
            let Some(tool) = registry.get(agent_id, &tool_name) else {
                let output = PoolToolOutput::tool_not_found(agent_id, &tool_name);
                return Response::ok(
                    request.id,
                    ResponseBody::ToolOutput {
                        content: output.content,
                        kind: output.kind,
                    },
                );
            };

            let result = tool.execute(arguments, context).await;
            if result.success {
                Response::ok(
                    request.id,
                    ResponseBody::ToolOutput {
                        content: result.content,
                        kind: result.kind,
                    },
                )
            } else {
                Response::err(
                    request.id,
                    result.error.unwrap_or_else(|| "unknown error".to_string()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent_registry;
    use crate::pool::{InProcessPool, ToolPool};
    use crate::tools::registry::test_support::{test_context, StubGenerator, StubSearch};
    use crate::tools::{create_agent_registry, create_default_registry};
    use serde_json::json;
    use std::sync::Arc;

    fn request(id: &str, body: RequestBody) -> Request {
        Request {
            id: id.to_string(),
            body,
        }
    }

    fn context(dir: &tempfile::TempDir) -> ToolContext {
        test_context(
            Arc::new(StubGenerator::new("{}")),
            Arc::new(StubSearch::empty()),
            dir.path(),
        )
    }

    #[tokio::test]
    async fn test_initialize_reports_identity_and_tool_count() {
        let dir = tempfile::tempdir().unwrap();
        let registry = create_agent_registry("pricing").unwrap();

        let response = handle_request(
            "pricing",
            &registry,
            &context(&dir),
            request("1", RequestBody::Initialize),
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
    }

    #[tokio::test]
    async fn test_unknown_tool_matches_in_process_error_shape() {
        let dir = tempfile::tempdir().unwrap();
        let registry = create_agent_registry("pricing").unwrap();

        let response = handle_request(
            "pricing",
            &registry,
            &context(&dir),
            request(
                "1",
                RequestBody::CallTool {
                    tool_name: "nonexistent".to_string(),
                    arguments: json!({}),
                },
            ),
        )
        .await;

        let Some(ResponseBody::ToolOutput { content, .. }) = response.result else {
            panic!("expected tool output, got {:?}", response.error);
        };
        assert_eq!(
            content,
            r#"{"error":"Tool 'nonexistent' not found on agent 'pricing'"}"#
        );

        let pool = InProcessPool::new(create_default_registry(), context(&dir));
        for card in agent_registry() {
            pool.connect(&card).await.unwrap();
        }
        let out = pool.call("pricing", "nonexistent", json!({})).await;
        assert_eq!(out.content, content);
    }

    #[tokio::test]
    async fn test_validation_failure_becomes_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = create_agent_registry("client_research").unwrap();

        let response = handle_request(
            "client_research",
            &registry,
            &context(&dir),
            request(
                "1",
                RequestBody::CallTool {
                    tool_name: "search_company_info".to_string(),
                    arguments: json!({"company_name": ""}),
                },
            ),
        )
        .await;

        assert!(response.result.is_none());
        assert!(response.error.is_some());
    }
}
