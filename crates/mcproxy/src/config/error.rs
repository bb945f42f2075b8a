// Configuration loading/validation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("failed to read config file '{path}': {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file '{path}' as JSON: {source}")]
	Parse {
		path: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid configuration: {0}")]
	Schema(String),
}

impl ConfigError {
	pub fn schema(message: impl Into<String>) -> Self {
		Self::Schema(message.into())
	}
}
