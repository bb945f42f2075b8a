// Manifest registry error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
	#[error("unknown event type '{0}'")]
	UnknownEventType(String),

	#[error("failed to read manifest cache: {0}")]
	CacheIo(#[from] std::io::Error),

	#[error("failed to parse manifest cache: {0}")]
	CacheParse(#[from] serde_json::Error),
}
