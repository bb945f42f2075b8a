// Wraps validated user code with the driver scaffold that gets executed in
// the sandbox subprocess: an embedded manifest, a namespace-scoped
// capability proxy, and the result-collection footer.
//
// The executed program is still Python (the sandbox itself, per §4.G, is a
// `uv run python -c ...` subprocess) — this gateway is a Rust process that
// *generates and launches* that Python driver, the same role `_wrap_code`
// plays in `api_sandbox.py`. `DynamicProxy.__getattr__` forwards any
// attribute access as a tool call recorded into `pending_calls`; it never
// performs a real round-trip from inside the subprocess, matching §2's data
// flow note.

use super::manifest::SandboxManifest;

/// Builds the full driver source to hand to `python -c`.
pub fn wrap_code(user_code: &str, namespace: &str, manifest: &SandboxManifest) -> String {
	let manifest_json = serde_json::to_string(manifest).expect("SandboxManifest always serializes");
	let user_code_literal = serde_json::to_string(user_code).expect("a Rust &str always serializes to JSON");
	let namespace_literal = serde_json::to_string(namespace).expect("a Rust &str always serializes to JSON");

	format!(
		r#"
import json

class _ToolExecutor:
    def __init__(self):
        self._pending = []

    def __call__(self, server, tool, args):
        self._pending.append({{"server": server, "tool": tool, "args": args}})
        return {{"_pending_call": True, "server": server, "tool": tool, "args": args}}

    def get_pending(self):
        return self._pending

_executor = _ToolExecutor()
_manifest_data = {manifest_json}


class _Registry:
    def __init__(self, data):
        self.servers = data.get("servers", {{}})
        self.namespaces = data.get("namespaces", {{}})

    def get_server(self, name):
        return self.servers.get(name)

    def get_namespace(self, name):
        return self.namespaces.get(name)

    def get_tools_for_server(self, server_name):
        server = self.get_server(server_name)
        return server.get("tools", []) if server else []


_registry = _Registry(_manifest_data)


class _AccessControl:
    def __init__(self, registry):
        self.registry = registry

    def can_access(self, namespace, target_server):
        ns_config = self.registry.get_namespace(namespace)
        if not ns_config:
            return False, f"Namespace '{{namespace}}' not found"
        allowed = self._resolve_allowed_servers(namespace)
        if target_server in allowed:
            return True, ""
        return False, (
            f"Namespace '{{namespace}}' does not have access to server '{{target_server}}'. "
            f"Allowed servers: {{', '.join(sorted(allowed)) or 'none'}}"
        )

    def _resolve_allowed_servers(self, namespace):
        resolved = set()
        visiting = set()

        def _resolve(ns):
            if ns in visiting:
                return
            visiting.add(ns)
            ns_config = self.registry.get_namespace(ns)
            if not ns_config:
                return
            resolved.update(ns_config.get("servers", []))
            for parent in ns_config.get("extends", []):
                _resolve(parent)

        _resolve(namespace)
        return resolved


_access_control = _AccessControl(_registry)


class _DynamicProxy:
    def __init__(self, server_name, namespace, access_control, tool_executor):
        self._server_name = server_name
        self._namespace = namespace
        self._access_control = access_control
        self._tool_executor = tool_executor

    def __getattr__(self, tool_name):
        def _call(**kwargs):
            return self._tool_executor(self._server_name, tool_name, kwargs)

        return _call


class _APIProxy:
    def __init__(self, namespace, access_control, tool_executor, registry):
        self._namespace = namespace
        self._access_control = access_control
        self._tool_executor = tool_executor
        self._registry = registry

    def server(self, name):
        can_access, error = self._access_control.can_access(self._namespace, name)
        if not can_access:
            raise PermissionError(error)
        return _DynamicProxy(name, self._namespace, self._access_control, self._tool_executor)

    def call_tool(self, server, tool, args):
        can_access, error = self._access_control.can_access(self._namespace, server)
        if not can_access:
            raise PermissionError(error)
        return self._tool_executor(server, tool, args)

    def manifest(self):
        allowed = self._access_control._resolve_allowed_servers(self._namespace)
        return {{
            "namespace": self._namespace,
            "allowed_servers": sorted(allowed),
            "servers": {{n: self._registry.get_server(n) for n in allowed if self._registry.get_server(n)}},
        }}


api = _APIProxy({namespace_literal}, _access_control, _executor, _registry)

_result = None
_error = None

try:
    import asyncio

    local_vars = {{"__builtins__": __builtins__, "api": api, "asyncio": asyncio}}
    exec({user_code_literal}, local_vars, local_vars)
    if "run" in local_vars and callable(local_vars["run"]):
        run_func = local_vars["run"]
        if asyncio.iscoroutinefunction(run_func):
            _result = asyncio.run(run_func())
        else:
            _result = run_func()
except Exception:
    import traceback

    _error = traceback.format_exc()

print(json.dumps({{"result": _result, "traceback": _error, "pending_calls": _executor.get_pending()}}))
"#
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn embeds_namespace_and_user_code_as_valid_literals() {
		let manifest = SandboxManifest::default();
		let wrapped = wrap_code("x = 1", "default", &manifest);
		assert!(wrapped.contains("\"default\""));
		assert!(wrapped.contains("x = 1"));
	}

	#[test]
	fn escapes_quotes_in_user_code_safely() {
		let manifest = SandboxManifest::default();
		let wrapped = wrap_code(r#"print("hi")"#, "default", &manifest);
		assert!(wrapped.contains(r#"\"hi\""#));
	}
}
