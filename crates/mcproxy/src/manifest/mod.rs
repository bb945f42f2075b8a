// Manifest Registry: builds, caches, and queries the aggregated catalogue,
// and owns the event-hook side effects that mutate it.

pub mod cache;
pub mod error;
pub mod events;
pub mod registry;
pub mod search;

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

pub use error::ManifestError;
pub use events::{Callback, EventRecord, EventHookManager};
pub use registry::Manifest;
pub use search::SearchResult;

use crate::child::Tool;

pub struct ManifestRegistry {
	manifest: RwLock<Option<Manifest>>,
	events: Mutex<EventHookManager>,
	cache_path: PathBuf,
}

impl Default for ManifestRegistry {
	fn default() -> Self {
		Self::new(cache::default_cache_path())
	}
}

impl ManifestRegistry {
	pub fn new(cache_path: PathBuf) -> Self {
		Self {
			manifest: RwLock::new(None),
			events: Mutex::new(EventHookManager::new()),
			cache_path,
		}
	}

	pub async fn build(&self, all_tools: &HashMap<String, Vec<Tool>>) {
		let generated_at = chrono::Utc::now().to_rfc3339();
		let manifest = Manifest::build(all_tools, generated_at.clone());

		let cached = cache::CachedManifest {
			manifest: manifest.clone(),
			namespaces: Value::Null,
			cached_at: generated_at,
		};
		if let Err(e) = cache::save_cache(&self.cache_path, &cached) {
			warn!(target: "manifest", "failed to persist manifest cache: {}", e);
		}

		*self.manifest.write().await = Some(manifest);
	}

	pub async fn invalidate(&self) {
		*self.manifest.write().await = None;
		if let Err(e) = cache::invalidate_cache(&self.cache_path) {
			warn!(target: "manifest", "failed to invalidate manifest cache: {}", e);
		}
	}

	pub async fn search(&self, query: &str, allowed: Option<&[String]>, depth: u8) -> Option<SearchResult> {
		let guard = self.manifest.read().await;
		guard.as_ref().map(|m| search::search(m, query, allowed, depth))
	}

	pub async fn get_tools(&self, server: &str, allowed: Option<&[String]>) -> Vec<Tool> {
		let guard = self.manifest.read().await;
		guard.as_ref().map(|m| m.get_tools(server, allowed)).unwrap_or_default()
	}

	pub async fn snapshot(&self) -> Option<Manifest> {
		self.manifest.read().await.clone()
	}

	pub async fn register_hook(&self, event_type: &str, callback: Callback) -> Result<(), ManifestError> {
		self.events.lock().await.register_hook(event_type, callback)
	}

	/// Fires an event, running registered callbacks, then applying the
	/// built-in side effect for the event type.
	pub async fn fire_event(&self, event_type: &str, data: Value) -> Result<EventRecord, ManifestError> {
		let timestamp = chrono::Utc::now().to_rfc3339();
		let record = self.events.lock().await.trigger(event_type, data.clone(), timestamp).await?;

		match event_type {
			"config_change" | "manual" => self.invalidate().await,
			"server_health" => {
				if let (Some(server), Some(status)) = (
					data.get("server").and_then(|v| v.as_str()),
					data.get("status").and_then(|v| v.as_str()),
				) {
					let mut guard = self.manifest.write().await;
					if let Some(manifest) = guard.as_mut() {
						manifest.patch_server_status(server, status);
					}
				}
			},
			"startup" => {
				if let Ok(cached) = cache::load_cache(&self.cache_path) {
					if !cache::is_stale(&cached.cached_at, chrono::Utc::now()) {
						*self.manifest.write().await = Some(cached.manifest);
					}
				}
			},
			_ => {},
		}

		Ok(record)
	}

	pub async fn get_last_event(&self) -> Option<EventRecord> {
		self.events.lock().await.get_last_event().cloned()
	}

	pub async fn get_event_history(&self, limit: usize) -> Vec<EventRecord> {
		self.events.lock().await.get_event_history(limit).to_vec()
	}
}
