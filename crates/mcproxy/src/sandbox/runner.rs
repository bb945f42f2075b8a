// Sandbox Runner: wraps validated code, launches a fresh subprocess to
// execute it, and parses the structured result.
//
// Grounded on `api_sandbox.py`'s `SandboxExecutor.execute` /
// `_build_env` / `_run_uv_subprocess` for the control flow and the exact
// success/timeout/nonzero-exit/bad-json result shapes.

use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::error;

use super::manifest::SandboxManifest;
use super::validator;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const OUTPUT_PREVIEW_BYTES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecuteStatus {
	Success,
	Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResult {
	pub status: ExecuteStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub traceback: Option<String>,
	/// Tool invocations the driver recorded instead of performing — the
	/// sandbox never calls out over a socket, per §2's data flow note.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub pending_calls: Vec<Value>,
	pub execution_time_ms: u128,
}

impl ExecuteResult {
	fn error(traceback: impl Into<String>, execution_time_ms: u128) -> Self {
		Self {
			status: ExecuteStatus::Error,
			result: None,
			traceback: Some(traceback.into()),
			pending_calls: Vec::new(),
			execution_time_ms,
		}
	}
}

pub struct SandboxRunner {
	uv_path: String,
	default_timeout: Duration,
}

impl SandboxRunner {
	pub fn new(uv_path: impl Into<String>, default_timeout: Duration) -> Self {
		Self {
			uv_path: uv_path.into(),
			default_timeout,
		}
	}

	/// Runs `code` in a fresh subprocess scoped to `namespace`. The gateway
	/// must supply an explicit, non-empty namespace — §4.G's contract makes
	/// this the caller's responsibility, not a permissive default.
	pub async fn execute(
		&self,
		code: &str,
		namespace: &str,
		timeout: Option<Duration>,
		dependencies: &[String],
		manifest: &SandboxManifest,
	) -> ExecuteResult {
		if namespace.trim().is_empty() {
			return ExecuteResult::error("a non-empty namespace is required to execute sandboxed code", 0);
		}

		if let Err(reason) = validator::validate(code) {
			return ExecuteResult::error(format!("Validation error: {reason}"), 0);
		}

		let wrapped = super::wrapper::wrap_code(code, namespace, manifest);
		let timeout = timeout.unwrap_or(self.default_timeout);

		let start = Instant::now();

		let mut command = Command::new(&self.uv_path);
		command.arg("run");
		for dep in dependencies {
			command.arg("--with").arg(dep);
		}
		command.arg("python").arg("-c").arg(&wrapped);
		command.env_clear();
		command.env("PYTHONIOENCODING", "utf-8");
		command.env("PYTHONUNBUFFERED", "1");
		command.env("SANDBOX_NAMESPACE", namespace);
		command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

		let child = match command.spawn() {
			Ok(child) => child,
			Err(source) => {
				error!(target: "sandbox", "failed to spawn sandbox subprocess: {}", source);
				return ExecuteResult::error(source.to_string(), start.elapsed().as_millis());
			},
		};

		match tokio::time::timeout(timeout, child.wait_with_output()).await {
			Err(_elapsed) => ExecuteResult::error(
				format!("Execution timed out after {} seconds", timeout.as_secs()),
				start.elapsed().as_millis(),
			),
			Ok(Err(source)) => ExecuteResult::error(source.to_string(), start.elapsed().as_millis()),
			Ok(Ok(output)) => {
				let elapsed = start.elapsed().as_millis();
				if !output.status.success() {
					let stderr = String::from_utf8_lossy(&output.stderr);
					let traceback = if stderr.trim().is_empty() {
						format!("Process exited with code {}", output.status.code().unwrap_or(-1))
					} else {
						stderr.into_owned()
					};
					return ExecuteResult::error(traceback, elapsed);
				}

				let stdout = String::from_utf8_lossy(&output.stdout);
				match serde_json::from_str::<Value>(&stdout) {
					Ok(parsed) => ExecuteResult {
						status: ExecuteStatus::Success,
						result: parsed.get("result").cloned(),
						traceback: parsed.get("traceback").and_then(|v| v.as_str()).map(|s| s.to_string()),
						pending_calls: parsed
							.get("pending_calls")
							.and_then(|v| v.as_array())
							.cloned()
							.unwrap_or_default(),
						execution_time_ms: elapsed,
					},
					Err(parse_error) => {
						let preview: String = stdout.chars().take(OUTPUT_PREVIEW_BYTES).collect();
						ExecuteResult::error(format!("Failed to parse result: {parse_error}\nOutput: {preview}"), elapsed)
					},
				}
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn manifest() -> SandboxManifest {
		SandboxManifest::default()
	}

	#[tokio::test]
	async fn rejects_empty_namespace_without_launching_anything() {
		let runner = SandboxRunner::new("uv", DEFAULT_TIMEOUT);
		let result = runner.execute("x = 1", "", None, &[], &manifest()).await;
		assert_eq!(result.status, ExecuteStatus::Error);
		assert_eq!(result.execution_time_ms, 0);
	}

	#[tokio::test]
	async fn rejects_invalid_code_without_launching_a_subprocess() {
		let runner = SandboxRunner::new("uv", DEFAULT_TIMEOUT);
		let result = runner.execute("import os", "default", None, &[], &manifest()).await;
		assert_eq!(result.status, ExecuteStatus::Error);
		assert!(result.traceback.unwrap().starts_with("Validation error"));
		assert_eq!(result.execution_time_ms, 0);
	}

	#[tokio::test]
	async fn unresolvable_interpreter_surfaces_as_error_result() {
		let runner = SandboxRunner::new("/nonexistent/definitely-not-uv", Duration::from_secs(1));
		let result = runner.execute("x = 1", "default", None, &[], &manifest()).await;
		assert_eq!(result.status, ExecuteStatus::Error);
	}
}
