// Child-process supervisor error types

use thiserror::Error;

/// Errors raised while spawning, initialising, or calling a single child.
#[derive(Error, Debug)]
pub enum ChildError {
	#[error("failed to spawn child '{name}': {source}")]
	Spawn {
		name: String,
		#[source]
		source: std::io::Error,
	},

	#[error("child '{name}' did not respond to initialize within the startup timeout")]
	InitTimeout { name: String },

	#[error("child '{name}' returned an error during initialize: {message}")]
	InitError { name: String, message: String },

	#[error("child '{name}' closed its stream during initialize")]
	InitStreamClosed { name: String },

	#[error("child '{name}' gave no reply to tools/call")]
	NoResponse { name: String },

	#[error("child '{name}' returned a remote error for tool '{tool}': {message}")]
	RemoteError {
		name: String,
		tool: String,
		message: String,
		data: Option<serde_json::Value>,
	},

	#[error("child '{name}' has exceeded its restart bound and is permanently dead")]
	RestartBoundExceeded { name: String },

	#[error("unknown server '{0}'")]
	UnknownServer(String),

	#[error("failed to write to child '{name}' stdin: {source}")]
	Write {
		name: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to serialize message to child '{name}': {0}")]
	Serialize(#[from] serde_json::Error),
}

impl ChildError {
	pub fn remote_error(
		name: impl Into<String>,
		tool: impl Into<String>,
		message: impl Into<String>,
		data: Option<serde_json::Value>,
	) -> Self {
		Self::RemoteError {
			name: name.into(),
			tool: tool.into(),
			message: message.into(),
			data,
		}
	}
}
