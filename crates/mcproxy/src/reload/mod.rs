// Hot-Reload Controller: diffs old vs. new configuration and reconciles the
// Supervisor Pool live, without dropping children or connections the diff
// doesn't touch.
//
// Grounded on `config_reloader.py`'s `HotReloadServerManager.reload_config`
// for the diff/apply-order contract, and on the teacher's `store.rs` for
// guarding a single in-flight reconciliation with an atomic flag rather than
// holding a lock across the whole (multi-await) operation.

pub mod error;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

pub use error::ReloadError;

use crate::child::ChildProcess;
use crate::config::Config;
use crate::pool::SupervisorPool;

/// What a single reconciliation actually did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadSummary {
	pub removed: Vec<String>,
	pub updated: Vec<String>,
	pub added: Vec<String>,
}

impl ReloadSummary {
	pub fn is_empty(&self) -> bool {
		self.removed.is_empty() && self.updated.is_empty() && self.added.is_empty()
	}
}

/// Drives a `SupervisorPool` to match a newly loaded config. Holds no state
/// of its own beyond the single-reconciliation guard — the pool is the
/// source of truth for what's running.
pub struct HotReloadController {
	pool: Arc<SupervisorPool>,
	reloading: AtomicBool,
}

impl HotReloadController {
	pub fn new(pool: Arc<SupervisorPool>) -> Self {
		Self {
			pool,
			reloading: AtomicBool::new(false),
		}
	}

	/// Computes `{to_remove, to_add, to_update}` over child names, per §4.E's
	/// diff: `to_update` is the subset of `old ∩ new` whose reload-relevant
	/// fields differ; everything else in the intersection is left alone.
	pub fn diff(old: &Config, new: &Config) -> (BTreeSet<String>, BTreeSet<String>, BTreeSet<String>) {
		let old_names: BTreeSet<&str> = old.servers.iter().map(|s| s.name.as_str()).collect();
		let new_names: BTreeSet<&str> = new.servers.iter().map(|s| s.name.as_str()).collect();

		let to_remove: BTreeSet<String> = old_names.difference(&new_names).map(|s| s.to_string()).collect();
		let to_add: BTreeSet<String> = new_names.difference(&old_names).map(|s| s.to_string()).collect();

		let mut to_update = BTreeSet::new();
		for name in old_names.intersection(&new_names) {
			let old_spec = old.servers.iter().find(|s| s.name == *name).expect("present in old_names");
			let new_spec = new.servers.iter().find(|s| s.name == *name).expect("present in new_names");
			if !old_spec.reload_fields_eq(new_spec) {
				to_update.insert(name.to_string());
			}
		}

		(to_remove, to_add, to_update)
	}

	/// Reconciles the pool to `new_config`. Refuses (without effect) if a
	/// reconciliation is already in flight — the concurrency guard from
	/// §4.E. Apply order: stop removed, stop+requeue updated as additions,
	/// spawn every addition (staggered the same way `spawn_all` is), then
	/// swap the pool's config reference.
	pub async fn apply(&self, new_config: Config) -> Result<ReloadSummary, ReloadError> {
		if self.reloading.swap(true, Ordering::SeqCst) {
			warn!(target: "reload", "a reload is already in progress, refusing this request");
			return Err(ReloadError::AlreadyReloading);
		}

		let result = self.apply_inner(new_config).await;
		self.reloading.store(false, Ordering::SeqCst);
		result
	}

	async fn apply_inner(&self, new_config: Config) -> Result<ReloadSummary, ReloadError> {
		let old_config = self.pool.config();
		let (to_remove, to_add, to_update) = Self::diff(&old_config, &new_config);

		for name in &to_remove {
			self.stop_and_drop(name).await?;
		}

		let mut additions: BTreeSet<String> = to_add;
		for name in &to_update {
			self.stop_and_drop(name).await?;
			additions.insert(name.clone());
		}

		for name in &additions {
			let Some(spec) = new_config.servers.iter().find(|s| &s.name == name) else {
				continue;
			};
			if !spec.enabled {
				continue;
			}
			let child = Arc::new(ChildProcess::new(spec.clone()));
			self.pool.insert(Arc::clone(&child));
			let spawned_name = name.clone();
			tokio::spawn(async move {
				if let Err(e) = child.start().await {
					warn!(target: "reload", "child '{}' failed to start after reload: {}", spawned_name, e);
				}
			});
		}

		self.pool.replace_config(new_config);

		let summary = ReloadSummary {
			removed: to_remove.into_iter().collect(),
			updated: to_update.into_iter().collect(),
			added: additions.into_iter().collect(),
		};
		info!(
			target: "reload",
			"reload complete: +{} -{} ~{}",
			summary.added.len(),
			summary.removed.len(),
			summary.updated.len()
		);
		Ok(summary)
	}

	async fn stop_and_drop(&self, name: &str) -> Result<(), ReloadError> {
		let Some(child) = self.pool.remove(name) else {
			return Ok(());
		};
		child.stop().await.map_err(|source| ReloadError::Stop {
			name: name.to_string(),
			source,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;

	use crate::config::ServerSpec;

	fn spec(name: &str, timeout: u64) -> ServerSpec {
		ServerSpec {
			name: name.to_string(),
			command: "true".to_string(),
			args: vec![],
			env: BTreeMap::new(),
			timeout,
			enabled: true,
		}
	}

	fn config(servers: Vec<ServerSpec>) -> Config {
		Config {
			servers,
			namespaces: Default::default(),
			groups: Default::default(),
			manifests: Default::default(),
			sandbox: Default::default(),
		}
	}

	#[test]
	fn diff_classifies_removed_added_updated() {
		let old = config(vec![spec("a", 60), spec("b", 60), spec("c", 60)]);
		let mut b_changed = spec("b", 60);
		b_changed.timeout = 61;
		let new = config(vec![spec("a", 60), b_changed, spec("d", 60)]);

		let (removed, added, updated) = HotReloadController::diff(&old, &new);
		assert_eq!(removed, BTreeSet::from(["c".to_string()]));
		assert_eq!(added, BTreeSet::from(["d".to_string()]));
		assert_eq!(updated, BTreeSet::from(["b".to_string()]));
	}

	#[tokio::test]
	async fn apply_leaves_untouched_children_process_id_unchanged() {
		let pool = Arc::new(SupervisorPool::new(config(vec![spec("a", 60), spec("b", 60)])));
		let a: crate::child::SharedChild = Arc::new(ChildProcess::new(spec("a", 60)));
		let b: crate::child::SharedChild = Arc::new(ChildProcess::new(spec("b", 60)));
		a.start().await.unwrap();
		b.start().await.unwrap();
		pool.insert(Arc::clone(&a));
		pool.insert(Arc::clone(&b));

		let controller = HotReloadController::new(Arc::clone(&pool));

		let mut b_changed = spec("b", 60);
		b_changed.timeout = 120;
		let new_config = config(vec![spec("a", 60), b_changed]);

		controller.apply(new_config).await.unwrap();

		// 'a' is untouched: same Arc, still the pool's entry.
		assert!(Arc::ptr_eq(&pool.get("a").unwrap(), &a));
		// 'b' was stopped and replaced with a fresh child.
		assert!(!Arc::ptr_eq(&pool.get("b").unwrap(), &b));

		pool.stop_all().await;
	}

	#[tokio::test]
	async fn concurrent_reload_is_refused() {
		let pool = Arc::new(SupervisorPool::new(config(vec![])));
		let controller = Arc::new(HotReloadController::new(pool));

		controller.reloading.store(true, Ordering::SeqCst);
		let result = controller.apply(config(vec![])).await;
		assert!(matches!(result, Err(ReloadError::AlreadyReloading)));
	}
}
