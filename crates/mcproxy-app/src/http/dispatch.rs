// JSON-RPC 2.0 method dispatch for `POST /message` (and its `/sse` alias).
// Grounded on `server.py`'s `handle_message` / `handle_initialize` /
// `handle_tools_list` / `handle_tools_call`, generalised from v1's raw
// per-child tool catalogue to v2's two meta-tools.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mcproxy::NamespaceGraph;
use serde_json::{json, Value};

use super::meta_tools;
use super::namespace::{is_known, resolve_namespace};
use crate::error::{self, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
use crate::state::AppState;

pub async fn handle_message(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
	let namespace = resolve_namespace(None, &headers);
	if let Some(name) = &namespace {
		if !is_known(&state.pool.config(), name) {
			return StatusCode::NOT_FOUND.into_response();
		}
	}

	let request: Value = match serde_json::from_slice(&body) {
		Ok(value) => value,
		Err(e) => return Json(error::rpc_error(Value::Null, PARSE_ERROR, format!("parse error: {e}"))).into_response(),
	};

	let id = request.get("id").cloned().unwrap_or(Value::Null);
	let Some(method) = request.get("method").and_then(Value::as_str) else {
		return Json(error::rpc_error(id, INVALID_REQUEST, "missing required field 'method'")).into_response();
	};
	let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

	let response = match method {
		"initialize" => handle_initialize(&state, namespace.as_deref(), id),
		"tools/list" => handle_tools_list(id),
		"tools/call" => handle_tools_call(&state, namespace.as_deref(), id, params).await,
		other => error::rpc_error(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
	};

	Json(response).into_response()
}

fn handle_initialize(state: &AppState, namespace: Option<&str>, id: Value) -> Value {
	let mut result = json!({
		"protocolVersion": crate::state::PROTOCOL_VERSION,
		"capabilities": {"tools": {}},
		"serverInfo": {"name": crate::state::SERVER_NAME, "version": crate::state::SERVER_VERSION},
	});

	if let Some(name) = namespace {
		let config = state.pool.config();
		if let Ok(servers) = NamespaceGraph::new(&config).resolve(Some(name)) {
			result["namespace"] = json!({"name": name, "servers": servers});
		}
	}

	error::rpc_result(id, result)
}

fn handle_tools_list(id: Value) -> Value {
	error::rpc_result(id, json!({"tools": [meta_tools::search_tool_def(), meta_tools::execute_tool_def()]}))
}

async fn handle_tools_call(state: &AppState, namespace: Option<&str>, id: Value, params: Value) -> Value {
	let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
	match params.get("name").and_then(Value::as_str) {
		Some("search") => meta_tools::search(state, namespace, id, arguments).await,
		Some("execute") => meta_tools::execute(state, namespace, id, arguments).await,
		Some(other) => error::rpc_error(id, error::INVALID_PARAMS, format!("unknown tool '{other}'")),
		None => error::rpc_error(id, error::INVALID_PARAMS, "missing required parameter 'name'"),
	}
}
