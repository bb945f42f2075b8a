// JSON-RPC 2.0 shapes exchanged with a child over stdin/stdout.
//
// Children are treated as opaque MCP servers: we only need enough of the
// protocol to initialize, list tools, and forward calls. Tool payloads are
// passed through as raw `serde_json::Value` rather than modeled strongly,
// since the gateway never interprets their contents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const CLIENT_NAME: &str = "mcproxy";
pub const CLIENT_VERSION: &str = "2.0.0";

pub const INIT_REQUEST_ID: i64 = 1;
pub const CALL_REQUEST_ID: i64 = 2;
pub const TOOLS_LIST_REQUEST_ID: i64 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
	pub jsonrpc: &'static str,
	pub id: i64,
	pub method: &'static str,
	pub params: Value,
}

impl JsonRpcRequest {
	pub fn new(id: i64, method: &'static str, params: Value) -> Self {
		Self {
			jsonrpc: "2.0",
			id,
			method,
			params,
		}
	}

	pub fn initialize() -> Self {
		Self::new(
			INIT_REQUEST_ID,
			"initialize",
			serde_json::json!({
				"protocolVersion": PROTOCOL_VERSION,
				"capabilities": {},
				"clientInfo": {
					"name": CLIENT_NAME,
					"version": CLIENT_VERSION,
				},
			}),
		)
	}

	pub fn tools_list() -> Self {
		Self::new(TOOLS_LIST_REQUEST_ID, "tools/list", serde_json::json!({}))
	}

	pub fn tools_call(tool: &str, arguments: Value) -> Self {
		Self::new(
			CALL_REQUEST_ID,
			"tools/call",
			serde_json::json!({ "name": tool, "arguments": arguments }),
		)
	}
}

/// A notification carries no id and expects no reply.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
	pub jsonrpc: &'static str,
	pub method: &'static str,
	pub params: Value,
}

impl JsonRpcNotification {
	pub fn initialized() -> Self {
		Self {
			jsonrpc: "2.0",
			method: "notifications/initialized",
			params: serde_json::json!({}),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
	pub code: i64,
	pub message: String,
	#[serde(default)]
	pub data: Option<Value>,
}

/// A loosely-typed reply: we only care about `id`, `result`, and `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
	#[serde(default)]
	pub id: Option<Value>,
	#[serde(default)]
	pub result: Option<Value>,
	#[serde(default)]
	pub error: Option<JsonRpcError>,
}

/// Opaque passthrough tool description sourced from a child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(rename = "inputSchema", default)]
	pub input_schema: Value,
	/// Populated by the Pool after discovery; absent on the wire from the child.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub server: Option<String>,
}

pub fn serialize_line(value: &impl Serialize) -> Result<String, serde_json::Error> {
	let mut line = serde_json::to_string(value)?;
	line.push('\n');
	Ok(line)
}
