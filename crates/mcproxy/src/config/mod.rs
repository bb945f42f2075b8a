// Configuration data model and loading.
//
// Mirrors `config_watcher.py`'s `load_config` / `validate_schema` /
// `interpolate_env_vars` split: load reads and parses, validate_schema checks
// shape before anything downstream trusts it, and interpolation expands
// `${VAR}` placeholders against the process environment.

mod env;
pub mod error;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use env::load_dotenv;
pub use error::ConfigError;

fn default_timeout() -> u64 {
	60
}

fn default_enabled() -> bool {
	true
}

/// Declarative configuration for a single child. Immutable once loaded;
/// replaced wholesale (never mutated in place) on hot-reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSpec {
	pub name: String,
	pub command: String,
	#[serde(default)]
	pub args: Vec<String>,
	#[serde(default)]
	pub env: BTreeMap<String, String>,
	#[serde(default = "default_timeout")]
	pub timeout: u64,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
}

impl ServerSpec {
	/// The fields the hot-reload diff compares to decide whether a server
	/// with an unchanged name needs to be restarted.
	pub fn reload_fields_eq(&self, other: &ServerSpec) -> bool {
		self.command == other.command
			&& self.args == other.args
			&& self.env == other.env
			&& self.timeout == other.timeout
			&& self.enabled == other.enabled
	}
}

/// A namespace definition as it appears in the config file: either a bare
/// list of server names, or the full object form with `extends`/`isolated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamespaceDef {
	Servers(Vec<String>),
	Full {
		#[serde(default)]
		servers: Vec<String>,
		#[serde(default)]
		extends: Vec<String>,
		#[serde(default)]
		isolated: bool,
	},
}

impl NamespaceDef {
	pub fn servers(&self) -> &[String] {
		match self {
			NamespaceDef::Servers(s) => s,
			NamespaceDef::Full { servers, .. } => servers,
		}
	}

	pub fn extends(&self) -> &[String] {
		match self {
			NamespaceDef::Servers(_) => &[],
			NamespaceDef::Full { extends, .. } => extends,
		}
	}

	pub fn isolated(&self) -> bool {
		match self {
			NamespaceDef::Servers(_) => false,
			NamespaceDef::Full { isolated, .. } => *isolated,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDef {
	pub namespaces: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestsConfig {
	pub startup_dwell_secs: Option<u64>,
	pub per_server_ttl: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
	pub timeout_secs: Option<u64>,
	pub memory_mb: Option<u64>,
	pub uv_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub servers: Vec<ServerSpec>,
	#[serde(default)]
	pub namespaces: BTreeMap<String, NamespaceDef>,
	#[serde(default)]
	pub groups: BTreeMap<String, GroupDef>,
	#[serde(default)]
	pub manifests: ManifestsConfig,
	#[serde(default)]
	pub sandbox: SandboxConfig,
}

/// Loads, validates, and interpolates a config file in one call — the
/// contract callers (initial load and the hot-reload watcher) both rely on.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
	let raw = fs_err::read_to_string(path).map_err(|source| ConfigError::Io {
		path: path.display().to_string(),
		source,
	})?;

	let mut value: serde_json::Value =
		serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
			path: path.display().to_string(),
			source,
		})?;

	validate_schema(&value)?;
	env::interpolate_env_vars(&mut value);

	serde_json::from_value(value).map_err(|source| ConfigError::Parse {
		path: path.display().to_string(),
		source,
	})
}

/// Structural validation ahead of interpolation/deserialization, matching
/// the original's `validate_schema`: required fields and basic type checks,
/// not the deeper namespace/group graph validation (see `namespace::validate`).
pub fn validate_schema(value: &serde_json::Value) -> Result<(), ConfigError> {
	let obj = value
		.as_object()
		.ok_or_else(|| ConfigError::schema("config root must be a JSON object"))?;

	let servers = obj
		.get("servers")
		.and_then(|v| v.as_array())
		.ok_or_else(|| ConfigError::schema("'servers' is required and must be an array"))?;

	for (idx, server) in servers.iter().enumerate() {
		let server = server
			.as_object()
			.ok_or_else(|| ConfigError::schema(format!("servers[{idx}] must be an object")))?;

		let name = server
			.get("name")
			.and_then(|v| v.as_str())
			.filter(|s| !s.is_empty())
			.ok_or_else(|| ConfigError::schema(format!("servers[{idx}].name must be a non-empty string")))?;

		server
			.get("command")
			.and_then(|v| v.as_str())
			.filter(|s| !s.is_empty())
			.ok_or_else(|| ConfigError::schema(format!("servers[{name}].command must be a non-empty string")))?;

		if let Some(args) = server.get("args") {
			if !args.is_array() {
				return Err(ConfigError::schema(format!("servers[{name}].args must be an array")));
			}
		}
		if let Some(env) = server.get("env") {
			if !env.is_object() {
				return Err(ConfigError::schema(format!("servers[{name}].env must be an object")));
			}
		}
		if let Some(timeout) = server.get("timeout") {
			if !timeout.is_u64() && !timeout.is_i64() {
				return Err(ConfigError::schema(format!("servers[{name}].timeout must be an integer")));
			}
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validates_minimal_config() {
		let value = serde_json::json!({
			"servers": [{"name": "echo", "command": "echo-server"}]
		});
		assert!(validate_schema(&value).is_ok());
	}

	#[test]
	fn rejects_missing_servers_key() {
		let value = serde_json::json!({});
		assert!(validate_schema(&value).is_err());
	}

	#[test]
	fn rejects_server_without_command() {
		let value = serde_json::json!({"servers": [{"name": "echo"}]});
		assert!(validate_schema(&value).is_err());
	}

	#[test]
	fn parses_namespace_list_form() {
		let def: NamespaceDef = serde_json::from_str(r#"["a", "b"]"#).unwrap();
		assert_eq!(def.servers(), &["a".to_string(), "b".to_string()]);
		assert!(def.extends().is_empty());
		assert!(!def.isolated());
	}

	#[test]
	fn parses_namespace_full_form() {
		let def: NamespaceDef =
			serde_json::from_str(r#"{"servers": [], "extends": ["browser"], "isolated": true}"#).unwrap();
		assert!(def.servers().is_empty());
		assert_eq!(def.extends(), &["browser".to_string()]);
		assert!(def.isolated());
	}

	#[test]
	fn reload_fields_eq_ignores_name() {
		let a = ServerSpec {
			name: "a".into(),
			command: "cmd".into(),
			args: vec![],
			env: BTreeMap::new(),
			timeout: 60,
			enabled: true,
		};
		let mut b = a.clone();
		b.name = "different".into();
		assert!(a.reload_fields_eq(&b));
		b.timeout = 61;
		assert!(!a.reload_fields_eq(&b));
	}
}
