// The two meta-tools a v2 endpoint exposes through `tools/list`/`tools/call`:
// `search` (Manifest Registry lookup) and `execute` (Sandbox Runner). Every
// real child tool is reached indirectly, through `execute`'s driver-injected
// `api` proxy — never listed or called directly by a client.

use std::collections::HashMap;

use mcproxy::{Manifest, NamespaceGraph};
use serde_json::{Value, json};

use crate::error::{self, INVALID_PARAMS};
use crate::state::AppState;

pub fn search_tool_def() -> Value {
	json!({
		"name": "search",
		"description": "Search the aggregated tool catalogue visible to the caller's namespace.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"query": {"type": "string", "description": "Fuzzy search query; empty or single-char browses the catalogue."},
				"namespace": {"type": "string", "description": "Overrides the endpoint's namespace, if the endpoint has none."},
				"depth": {"type": "integer", "minimum": 0, "maximum": 3, "description": "0=servers, 1=+categories, 2=+tool names, 3=+descriptions and schemas."},
			},
			"required": ["query"],
		},
	})
}

pub fn execute_tool_def() -> Value {
	json!({
		"name": "execute",
		"description": "Run Python code in a sandboxed subprocess scoped to a namespace, with an injected `api` capability proxy.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"code": {"type": "string", "description": "Python source. A top-level `run` callable, sync or async, is invoked if present."},
				"namespace": {"type": "string", "description": "Required unless the endpoint already scopes one."},
				"timeout": {"type": "number", "description": "Seconds to wait before the subprocess is killed (default 30)."},
				"deps": {"type": "array", "items": {"type": "string"}, "description": "Extra packages to provision for the run."},
			},
			"required": ["code"],
		},
	})
}

fn requested_namespace(endpoint_namespace: Option<&str>, arguments: &Value) -> Option<String> {
	endpoint_namespace
		.map(str::to_string)
		.or_else(|| arguments.get("namespace").and_then(Value::as_str).map(str::to_string))
}

pub async fn search(state: &AppState, endpoint_namespace: Option<&str>, id: Value, arguments: Value) -> Value {
	let Some(query) = arguments.get("query").and_then(Value::as_str) else {
		return error::rpc_error(id, INVALID_PARAMS, "missing required parameter 'query'");
	};
	let depth = arguments.get("depth").and_then(Value::as_u64).unwrap_or(1).min(3) as u8;
	let namespace = requested_namespace(endpoint_namespace, &arguments);

	let config = state.pool.config();
	let graph = NamespaceGraph::new(&config);
	let allowed = match graph.resolve(namespace.as_deref()) {
		Ok(servers) => servers,
		Err(e) => return error::rpc_error(id, error::namespace_error_code(&e), e.to_string()),
	};

	match state.manifest.search(query, Some(&allowed), depth).await {
		Some(result) => error::rpc_result(id, serde_json::to_value(result).expect("SearchResult always serializes")),
		None => error::rpc_result(id, json!({"results": [], "total_matches": 0})),
	}
}

pub async fn execute(state: &AppState, endpoint_namespace: Option<&str>, id: Value, arguments: Value) -> Value {
	let Some(code) = arguments.get("code").and_then(Value::as_str) else {
		return error::rpc_error(id, INVALID_PARAMS, "missing required parameter 'code'");
	};
	let namespace = requested_namespace(endpoint_namespace, &arguments).unwrap_or_default();

	if !namespace.trim().is_empty() {
		let config = state.pool.config();
		let graph = NamespaceGraph::new(&config);
		if let Err(e) = graph.resolve(Some(&namespace)) {
			return error::rpc_error(id, error::namespace_error_code(&e), e.to_string());
		}
	}

	let timeout = arguments.get("timeout").and_then(Value::as_f64).map(std::time::Duration::from_secs_f64);
	let deps: Vec<String> = arguments
		.get("deps")
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
		.unwrap_or_default();

	let snapshot = state
		.manifest
		.snapshot()
		.await
		.unwrap_or_else(|| Manifest::build(&HashMap::new(), chrono::Utc::now().to_rfc3339()));
	let sandbox_manifest = mcproxy::sandbox::SandboxManifest::build(&snapshot, &state.pool.config());

	let result = state.sandbox().execute(code, &namespace, timeout, &deps, &sandbox_manifest).await;
	error::rpc_result(id, serde_json::to_value(result).expect("ExecuteResult always serializes"))
}
