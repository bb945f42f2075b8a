// Hot-reload controller error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloadError {
	#[error("a reload is already in progress, this request was refused")]
	AlreadyReloading,

	#[error(transparent)]
	Config(#[from] crate::config::ConfigError),

	#[error("error while stopping child '{name}' during reload: {source}")]
	Stop {
		name: String,
		#[source]
		source: crate::child::ChildError,
	},
}
