// Event hooks: startup/config_change/server_health/manual notifications
// fired into the manifest registry, with a bounded history.
//
// Grounded on `api_manifest.py`'s `EventHookManager`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use super::error::ManifestError;

pub const VALID_EVENTS: &[&str] = &["startup", "config_change", "server_health", "manual"];
const MAX_HISTORY: usize = 100;

pub type Callback = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct CallbackResult {
	pub callback_id: usize,
	pub status: CallbackStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
	Success,
	Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
	pub event_type: String,
	pub data: Value,
	pub timestamp: String,
	pub results: Vec<CallbackResult>,
}

pub struct EventHookManager {
	callbacks: HashMap<String, Vec<Callback>>,
	history: Vec<EventRecord>,
}

impl Default for EventHookManager {
	fn default() -> Self {
		Self::new()
	}
}

impl EventHookManager {
	pub fn new() -> Self {
		Self {
			callbacks: HashMap::new(),
			history: Vec::new(),
		}
	}

	pub fn register_hook(&mut self, event_type: &str, callback: Callback) -> Result<(), ManifestError> {
		if !VALID_EVENTS.contains(&event_type) {
			return Err(ManifestError::UnknownEventType(event_type.to_string()));
		}
		self.callbacks.entry(event_type.to_string()).or_default().push(callback);
		Ok(())
	}

	pub fn clear_hooks(&mut self, event_type: Option<&str>) {
		match event_type {
			Some(event_type) => {
				self.callbacks.remove(event_type);
			},
			None => self.callbacks.clear(),
		}
	}

	/// Runs every registered callback for `event_type` in registration
	/// order, capturing success/failure into the event record. A failing
	/// callback never aborts the rest. Returns the record so callers can
	/// apply the built-in side effect (manifest invalidation, status patch,
	/// cache load) themselves — that side effect touches the manifest, which
	/// this type does not own.
	pub async fn trigger(&mut self, event_type: &str, data: Value, timestamp: impl Into<String>) -> Result<EventRecord, ManifestError> {
		if !VALID_EVENTS.contains(&event_type) {
			return Err(ManifestError::UnknownEventType(event_type.to_string()));
		}

		let mut results = Vec::new();
		if let Some(callbacks) = self.callbacks.get(event_type) {
			for (idx, callback) in callbacks.iter().enumerate() {
				match callback(data.clone()).await {
					Ok(result) => results.push(CallbackResult {
						callback_id: idx,
						status: CallbackStatus::Success,
						result: Some(result),
						error: None,
					}),
					Err(error) => results.push(CallbackResult {
						callback_id: idx,
						status: CallbackStatus::Error,
						result: None,
						error: Some(error),
					}),
				}
			}
		}

		let record = EventRecord {
			event_type: event_type.to_string(),
			data,
			timestamp: timestamp.into(),
			results,
		};

		self.history.push(record.clone());
		if self.history.len() > MAX_HISTORY {
			self.history.remove(0);
		}

		Ok(record)
	}

	pub fn get_last_event(&self) -> Option<&EventRecord> {
		self.history.last()
	}

	pub fn get_event_history(&self, limit: usize) -> &[EventRecord] {
		let start = self.history.len().saturating_sub(limit);
		&self.history[start..]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn register_hook_rejects_unknown_event_type() {
		let mut manager = EventHookManager::new();
		let result = manager.register_hook("not_a_real_event", Arc::new(|_| Box::pin(async { Ok(Value::Null) })));
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn trigger_runs_callbacks_and_tolerates_failure() {
		let mut manager = EventHookManager::new();
		manager
			.register_hook("manual", Arc::new(|_| Box::pin(async { Ok(serde_json::json!("ok")) })))
			.unwrap();
		manager
			.register_hook("manual", Arc::new(|_| Box::pin(async { Err("boom".to_string()) })))
			.unwrap();

		let record = manager.trigger("manual", Value::Null, "2026-01-01T00:00:00Z").await.unwrap();
		assert_eq!(record.results.len(), 2);
		assert_eq!(record.results[0].status, CallbackStatus::Success);
		assert_eq!(record.results[1].status, CallbackStatus::Error);
	}

	#[tokio::test]
	async fn history_is_bounded_at_100() {
		let mut manager = EventHookManager::new();
		for _ in 0..150 {
			manager.trigger("manual", Value::Null, "2026-01-01T00:00:00Z").await.unwrap();
		}
		assert_eq!(manager.get_event_history(1000).len(), MAX_HISTORY);
	}

	#[tokio::test]
	async fn get_last_event_reflects_most_recent_trigger() {
		let mut manager = EventHookManager::new();
		manager.trigger("startup", serde_json::json!({"n": 1}), "t1").await.unwrap();
		manager.trigger("manual", serde_json::json!({"n": 2}), "t2").await.unwrap();
		assert_eq!(manager.get_last_event().unwrap().data, serde_json::json!({"n": 2}));
	}
}
