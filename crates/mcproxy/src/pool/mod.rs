// Supervisor Pool: the collection of Child Supervisors the gateway manages.
//
// Grounded on `server_manager.py`'s `ServerManager` for staggered startup
// and catalogue aggregation, and on the teacher's `mcp/registry/store.rs`
// for holding hot-swappable shared state (`ArcSwap`) safely across readers
// and the single writer (the hot-reload controller).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use tracing::{info, warn};

use crate::child::{ChildError, ChildProcess, SharedChild, Tool};
use crate::config::Config;

const STARTUP_STAGGER: Duration = Duration::from_millis(500);

/// Holds every live `ChildProcess`, keyed by server name, plus the config
/// revision that produced them. Reads take a point-in-time snapshot; writes
/// (add/remove) only ever come from `spawn_all`/`stop_all` or the hot-reload
/// controller — never from request handling.
pub struct SupervisorPool {
	children: DashMap<String, SharedChild>,
	config: ArcSwap<Config>,
}

impl SupervisorPool {
	pub fn new(config: Config) -> Self {
		Self {
			children: DashMap::new(),
			config: ArcSwap::new(Arc::new(config)),
		}
	}

	pub fn config(&self) -> Arc<Config> {
		self.config.load_full()
	}

	pub fn replace_config(&self, config: Config) {
		self.config.store(Arc::new(config));
	}

	pub fn child_names(&self) -> Vec<String> {
		self.children.iter().map(|e| e.key().clone()).collect()
	}

	pub fn get(&self, name: &str) -> Option<SharedChild> {
		self.children.get(name).map(|e| Arc::clone(e.value()))
	}

	/// Inserts a new child record without starting it — callers spawn it
	/// themselves so the stagger delay lives in one place (`spawn_all`) and
	/// in the hot-reload controller's `to_add` handling.
	pub fn insert(&self, child: SharedChild) {
		self.children.insert(child.name().to_string(), child);
	}

	pub fn remove(&self, name: &str) -> Option<SharedChild> {
		self.children.remove(name).map(|(_, child)| child)
	}

	/// Creates and begins starting a `ChildProcess` for every enabled spec
	/// in the current config, in order, with a ~500ms stagger between
	/// launches. A single failing start never blocks the rest.
	pub async fn spawn_all(&self) {
		let config = self.config.load();
		for spec in config.servers.iter().filter(|s| s.enabled) {
			let child: SharedChild = Arc::new(ChildProcess::new(spec.clone()));
			self.insert(Arc::clone(&child));

			let name = child.name().to_string();
			tokio::spawn(async move {
				if let Err(e) = child.start().await {
					warn!(target: "pool", "child '{}' failed to start: {}", name, e);
				}
			});

			tokio::time::sleep(STARTUP_STAGGER).await;
		}
	}

	/// Stops every child concurrently and clears the map.
	pub async fn stop_all(&self) {
		let names: Vec<String> = self.child_names();
		let stops = names.into_iter().filter_map(|name| self.remove(&name)).map(|child| async move {
			if let Err(e) = child.stop().await {
				warn!(target: "pool", "error stopping child '{}': {}", child.name(), e);
			}
		});
		futures::future::join_all(stops).await;
		info!(target: "pool", "all children stopped");
	}

	/// Tool lists for every alive child, keyed by server name. Dead
	/// children are omitted — callers treat this as a snapshot.
	pub async fn all_tools(&self) -> HashMap<String, Vec<Tool>> {
		let mut out = HashMap::new();
		for entry in self.children.iter() {
			let child = entry.value();
			if child.is_alive().await {
				out.insert(child.name().to_string(), child.tools().await);
			}
		}
		out
	}

	/// Routes a call to a known child, triggering a restart attempt first
	/// if it is not currently alive.
	pub async fn call(&self, server: &str, tool: &str, arguments: serde_json::Value) -> Result<serde_json::Value, ChildError> {
		let child = self
			.get(server)
			.ok_or_else(|| ChildError::UnknownServer(server.to_string()))?;
		child.call(tool, arguments).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;
	use crate::config::ServerSpec;

	fn spec(name: &str) -> ServerSpec {
		ServerSpec {
			name: name.to_string(),
			command: "true".to_string(),
			args: vec![],
			env: BTreeMap::new(),
			timeout: 5,
			enabled: true,
		}
	}

	#[tokio::test]
	async fn unknown_server_is_an_error() {
		let pool = SupervisorPool::new(Config {
			servers: vec![],
			namespaces: Default::default(),
			groups: Default::default(),
			manifests: Default::default(),
			sandbox: Default::default(),
		});
		let result = pool.call("nope", "tool", serde_json::json!({})).await;
		assert!(matches!(result, Err(ChildError::UnknownServer(_))));
	}

	#[tokio::test]
	async fn insert_and_remove_round_trips() {
		let pool = SupervisorPool::new(Config {
			servers: vec![spec("a")],
			namespaces: Default::default(),
			groups: Default::default(),
			manifests: Default::default(),
			sandbox: Default::default(),
		});
		let child: SharedChild = Arc::new(ChildProcess::new(spec("a")));
		pool.insert(Arc::clone(&child));
		assert!(pool.get("a").is_some());
		assert!(pool.remove("a").is_some());
		assert!(pool.get("a").is_none());
	}
}
