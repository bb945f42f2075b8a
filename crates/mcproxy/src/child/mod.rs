// Child-process supervisor: one instance per spawned MCP server.
//
// Grounded on `server_manager.py`'s `ServerProcess` for the lifecycle and
// protocol sequencing, and on the teacher's `mcp/registry/client.rs` for the
// general shape of an async resource with a typed error surface.

pub mod error;
pub mod protocol;
pub mod reader;

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub use error::ChildError;
pub use protocol::Tool;
use protocol::{JsonRpcNotification, JsonRpcRequest, serialize_line};
use reader::{ChildStdoutReader, ReaderError};

use crate::config::ServerSpec;

pub const CALL_TIMEOUT: Duration = Duration::from_secs(350);
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const RESTART_BACKOFF: Duration = Duration::from_secs(2);
pub const MAX_RESTARTS: u32 = 3;

/// Where a child sits in its start/stop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
	Spawned,
	Initialising,
	Ready,
	Dead,
	Stopping,
	Terminated,
}

struct Io {
	stdin: tokio::process::ChildStdin,
	reader: ChildStdoutReader,
}

/// Runtime record for one spawned child, matching §3's `ChildProcess`.
pub struct ChildProcess {
	pub spec: ServerSpec,
	state: Mutex<ChildState>,
	process: Mutex<Option<Child>>,
	io: Mutex<Option<Io>>,
	/// Serialises the send-then-await-reply cycle; acquired by both
	/// `initialize`/`tools/list` during startup and by `call` afterwards.
	exclusion: Mutex<()>,
	tools: Mutex<Vec<Tool>>,
	restart_count: AtomicU32,
}

impl ChildProcess {
	pub fn new(spec: ServerSpec) -> Self {
		Self {
			spec,
			state: Mutex::new(ChildState::Spawned),
			process: Mutex::new(None),
			io: Mutex::new(None),
			exclusion: Mutex::new(()),
			tools: Mutex::new(Vec::new()),
			restart_count: AtomicU32::new(0),
		}
	}

	pub fn name(&self) -> &str {
		&self.spec.name
	}

	pub async fn state(&self) -> ChildState {
		*self.state.lock().await
	}

    pub async fn is_alive(&self) -> bool {
		let mut guard = self.process.lock().await;
		match guard.as_mut() {
			Some(child) => matches!(child.try_wait(), Ok(None)),
			None => false,
		}
	}

	pub async fn tools(&self) -> Vec<Tool> {
		self.tools.lock().await.clone()
	}

	/// Fork-exec the child, run the initialize/initialized/tools-list
	/// handshake, and store the discovered tool list. Resets the restart
	/// counter on success.
	pub async fn start(&self) -> Result<(), ChildError> {
		*self.state.lock().await = ChildState::Spawned;

		let mut command = Command::new(&self.spec.command);
		command
			.args(&self.spec.args)
			.envs(&self.spec.env)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());

		let mut child = command.spawn().map_err(|source| ChildError::Spawn {
			name: self.spec.name.clone(),
			source,
		})?;

		let stdin = child.stdin.take().expect("piped stdin");
		let stdout = child.stdout.take().expect("piped stdout");
		if let Some(stderr) = child.stderr.take() {
			spawn_stderr_logger(self.spec.name.clone(), stderr);
		}

		*self.process.lock().await = Some(child);
		*self.io.lock().await = Some(Io {
			stdin,
			reader: ChildStdoutReader::new(stdout),
		});
		*self.state.lock().await = ChildState::Initialising;

		let timeout = Duration::from_secs(self.spec.timeout.max(1));

		let exclusion = self.exclusion.lock().await;
		if let Err(e) = self.handshake(timeout).await {
			drop(exclusion);
			*self.state.lock().await = ChildState::Dead;
			return Err(e);
		}
		drop(exclusion);

		self.restart_count.store(0, Ordering::SeqCst);
		*self.state.lock().await = ChildState::Ready;
		info!(target: "child", "child '{}' ready with {} tools", self.spec.name, self.tools.lock().await.len());
		Ok(())
	}

	async fn handshake(&self, timeout: Duration) -> Result<(), ChildError> {
		self.send(&JsonRpcRequest::initialize()).await?;
		let reply = self.await_reply(timeout).await?;
		let Some(reply) = reply else {
			return Err(ChildError::InitStreamClosed {
				name: self.spec.name.clone(),
			});
		};
		if let Some(error) = reply.get("error") {
			return Err(ChildError::InitError {
				name: self.spec.name.clone(),
				message: error.get("message").and_then(|m| m.as_str()).unwrap_or("unknown").to_string(),
			});
		}

		self.send_notification(&JsonRpcNotification::initialized()).await?;

		self.send(&JsonRpcRequest::tools_list()).await?;
		let reply = self.await_reply(timeout).await?;
		let Some(reply) = reply else {
			return Err(ChildError::InitStreamClosed {
				name: self.spec.name.clone(),
			});
		};

		let tools: Vec<Tool> = reply
			.get("result")
			.and_then(|r| r.get("tools"))
			.cloned()
			.map(serde_json::from_value)
			.transpose()
			.map_err(ChildError::Serialize)?
			.unwrap_or_default();

		*self.tools.lock().await = tools;
		Ok(())
	}

	async fn send(&self, request: &JsonRpcRequest) -> Result<(), ChildError> {
		let line = serialize_line(request)?;
		let mut guard = self.io.lock().await;
		let io = guard.as_mut().expect("io present after spawn");
		io.stdin.write_all(line.as_bytes()).await.map_err(|source| ChildError::Write {
			name: self.spec.name.clone(),
			source,
		})?;
		io.stdin.flush().await.map_err(|source| ChildError::Write {
			name: self.spec.name.clone(),
			source,
		})
	}

	async fn send_notification(&self, notification: &JsonRpcNotification) -> Result<(), ChildError> {
		let line = serialize_line(notification)?;
		let mut guard = self.io.lock().await;
		let io = guard.as_mut().expect("io present after spawn");
		io.stdin.write_all(line.as_bytes()).await.map_err(|source| ChildError::Write {
			name: self.spec.name.clone(),
			source,
		})?;
		io.stdin.flush().await.map_err(|source| ChildError::Write {
			name: self.spec.name.clone(),
			source,
		})
	}

	async fn await_reply(&self, timeout: Duration) -> Result<Option<serde_json::Value>, ChildError> {
		let mut guard = self.io.lock().await;
		let io = guard.as_mut().expect("io present after spawn");
		match tokio::time::timeout(timeout, io.reader.read_message()).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(ReaderError::Eof | ReaderError::Overflow(_) | ReaderError::Timeout)) => Ok(None),
			Ok(Err(ReaderError::Io(_))) => Ok(None),
			Err(_elapsed) => Err(ChildError::InitTimeout {
				name: self.spec.name.clone(),
			}),
		}
	}

	/// Graceful termination with a hard-kill fallback. Idempotent.
	pub async fn stop(&self) -> Result<(), ChildError> {
		*self.state.lock().await = ChildState::Stopping;
		let mut guard = self.process.lock().await;
		let Some(mut child) = guard.take() else {
			*self.state.lock().await = ChildState::Terminated;
			return Ok(());
		};

		#[cfg(unix)]
		{
			if let Some(pid) = child.id() {
				// SAFETY: pid is a live child we own; SIGTERM is a request, not destructive.
				unsafe {
					libc::kill(pid as i32, libc::SIGTERM);
				}
			}
		}

		let waited = tokio::time::timeout(STOP_GRACE_PERIOD, child.wait()).await;
		if waited.is_err() {
			warn!(target: "child", "child '{}' did not exit gracefully, killing", self.spec.name);
			let _ = child.kill().await;
			let _ = child.wait().await;
		}

		*self.io.lock().await = None;
		*self.state.lock().await = ChildState::Terminated;
		Ok(())
	}

	/// Sends `tools/call` and awaits the reply under the exclusion token.
	/// Attempts a bounded restart first if the child is not alive.
	pub async fn call(&self, tool: &str, arguments: serde_json::Value) -> Result<serde_json::Value, ChildError> {
		if !self.is_alive().await {
			self.restart_if_dead().await?;
		}

		let _exclusion = self.exclusion.lock().await;
		self.send(&JsonRpcRequest::tools_call(tool, arguments)).await?;
		let reply = tokio::time::timeout(CALL_TIMEOUT, self.await_reply_unbounded()).await;

		let reply = match reply {
			Ok(Ok(Some(reply))) => reply,
			Ok(Ok(None)) => {
				return Err(ChildError::NoResponse {
					name: self.spec.name.clone(),
				});
			},
			Ok(Err(e)) => return Err(e),
			Err(_elapsed) => {
				return Err(ChildError::NoResponse {
					name: self.spec.name.clone(),
				});
			},
		};

		if let Some(error) = reply.get("error") {
			return Err(ChildError::remote_error(
				self.spec.name.clone(),
				tool,
				error.get("message").and_then(|m| m.as_str()).unwrap_or("unknown"),
				error.get("data").cloned(),
			));
		}

		Ok(reply.get("result").cloned().unwrap_or(serde_json::Value::Null))
	}

	async fn await_reply_unbounded(&self) -> Result<Option<serde_json::Value>, ChildError> {
		let mut guard = self.io.lock().await;
		let io = guard.as_mut().expect("io present after spawn");
		match io.reader.read_message().await {
			Ok(value) => Ok(value),
			Err(_) => Ok(None),
		}
	}

	/// Bounded restart: increments the counter, refuses once the bound is
	/// exceeded, otherwise backs off ~2s and re-runs the start protocol.
	pub async fn restart_if_dead(&self) -> Result<(), ChildError> {
		let previous = self.restart_count.fetch_add(1, Ordering::SeqCst);
		if previous >= MAX_RESTARTS {
			self.restart_count.store(MAX_RESTARTS, Ordering::SeqCst);
			*self.state.lock().await = ChildState::Dead;
			return Err(ChildError::RestartBoundExceeded {
				name: self.spec.name.clone(),
			});
		}

		warn!(target: "child", "child '{}' crashed, restarting (attempt {})", self.spec.name, previous + 1);
		tokio::time::sleep(RESTART_BACKOFF).await;
		self.start().await
	}
}

fn spawn_stderr_logger(name: String, stderr: tokio::process::ChildStderr) {
	use tokio::io::{AsyncBufReadExt, BufReader};
	tokio::spawn(async move {
		let mut lines = BufReader::new(stderr).lines();
		while let Ok(Some(line)) = lines.next_line().await {
			if !line.trim().is_empty() {
				tracing::debug!(target: "child", "[{}] {}", name, line);
			}
		}
	});
}

pub type SharedChild = Arc<ChildProcess>;
