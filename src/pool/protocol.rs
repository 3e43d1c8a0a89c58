//! Line-delimited JSON-RPC protocol between the orchestrator and agent
//! host processes. One request per line on stdin, one response per line
//! on stdout; stderr is reserved for logs.

use crate::pool::ToolDescriptor;
use crate::tools::types::ToolResultKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum RequestBody {
    Initialize,
    ListTools,
    CallTool { tool_name: String, arguments: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseBody {
    Initialized {
        agent_id: String,
        tool_count: usize,
    },
    Tools(Vec<ToolDescriptor>),
    ToolOutput {
        content: String,
        kind: ToolResultKind,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResponseBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(id: String, body: ResponseBody) -> Self {
        Response {
            id,
            result: Some(body),
            error: None,
        }
    }

    pub fn err(id: String, message: String) -> Self {
        Response {
            id,
            result: None,
            error: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = Request {
            id: "abc".to_string(),
            body: RequestBody::CallTool {
                tool_name: "get_rate_card".to_string(),
                arguments: json!({"response_format": "json"}),
            },
        };
        let wire: Value = serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(wire["id"], "abc");
        assert_eq!(wire["method"], "call_tool");
        assert_eq!(wire["params"]["tool_name"], "get_rate_card");
    }

    #[test]
    fn test_response_roundtrip_carries_kind() {
        let response = Response::ok(
            "1".to_string(),
            ResponseBody::ToolOutput {
                content: "# doc".to_string(),
                kind: ToolResultKind::Proposal {
                    client_name: "Acme".to_string(),
                },
            },
        );
        let encoded = serde_json::to_string(&response).unwrap();
        let decoded: Response = serde_json::from_str(&encoded).unwrap();
        match decoded.result {
            Some(ResponseBody::ToolOutput { kind, .. }) => {
                assert_eq!(
                    kind,
                    ToolResultKind::Proposal {
                        client_name: "Acme".to_string()
                    }
                );
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_error_response_omits_result() {
        let encoded =
            serde_json::to_string(&Response::err("2".to_string(), "nope".to_string())).unwrap();
        assert!(!encoded.contains("result"));
        assert!(encoded.contains("nope"));
    }
}
