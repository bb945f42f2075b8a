// JSON-RPC error-code mapping, per §7's taxonomy table. The gateway's
// subsystem errors (`ChildError`, `NamespaceError`, ...) carry their own rich
// `Display` messages; this module's only job is picking the right numeric
// code for each and folding the message through unchanged.

use mcproxy::NamespaceError;
use serde_json::Value;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32000;

pub fn rpc_result(id: Value, result: Value) -> Value {
	serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result})
}

pub fn rpc_error(id: Value, code: i32, message: impl Into<String>) -> Value {
	serde_json::json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message.into()}})
}

/// Namespace/group resolution failures: a caller naming an unknown namespace
/// or group made a bad request (`-32602`); `AccessDenied` — a namespace that
/// resolves but doesn't grant the target server — is the access-control
/// failure §7 maps to `-32000`.
pub fn namespace_error_code(error: &NamespaceError) -> i32 {
	match error {
		NamespaceError::AccessDenied { .. } => INTERNAL_ERROR,
		NamespaceError::UnknownNamespace(_) | NamespaceError::UnknownGroup(_) => INVALID_PARAMS,
		_ => INTERNAL_ERROR,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_namespace_maps_to_invalid_params() {
		let error = NamespaceError::UnknownNamespace("ghost".to_string());
		assert_eq!(namespace_error_code(&error), INVALID_PARAMS);
	}

	#[test]
	fn access_denied_maps_to_internal_error() {
		let error = NamespaceError::AccessDenied {
			namespace: "browser".to_string(),
			server: "filesystem".to_string(),
		};
		assert_eq!(namespace_error_code(&error), INTERNAL_ERROR);
	}

	#[test]
	fn rpc_error_shape_carries_code_and_message() {
		let value = rpc_error(serde_json::json!(1), METHOD_NOT_FOUND, "nope");
		assert_eq!(value["error"]["code"], serde_json::json!(METHOD_NOT_FOUND));
		assert_eq!(value["error"]["message"], serde_json::json!("nope"));
	}
}
