// Config-file watcher: the external collaborator described in §4.E. Polls
// `config_path`'s modification time at `interval`, and on a change reloads,
// validates, and reconciles. Grounded directly on `config_reloader.py`'s
// `ConfigReloader._watch_loop` / `_check_for_changes` / `_reload_config` —
// including its "settle" delay after detecting a change, to avoid reading a
// file mid-write.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::state::AppState;

const SETTLE_AFTER_CHANGE: Duration = Duration::from_millis(100);
const MANIFEST_REBUILD_SETTLE: Duration = Duration::from_secs(2);

/// Runs until the task is aborted (the caller holds the `JoinHandle` and
/// cancels it on shutdown, matching §5's cancellation list).
pub async fn run(config_path: PathBuf, interval: Duration, state: AppState) {
	let mut last_mtime = mtime_of(&config_path);
	let mut ticker = tokio::time::interval(interval);

	loop {
		ticker.tick().await;

		let Some(current) = mtime_of(&config_path) else {
			continue;
		};
		if last_mtime == Some(current) {
			continue;
		}
		last_mtime = Some(current);

		tokio::time::sleep(SETTLE_AFTER_CHANGE).await;
		reload_once(&config_path, &state).await;
	}
}

async fn reload_once(config_path: &PathBuf, state: &AppState) {
	info!(target: "reload", "config change detected, reloading {}", config_path.display());

	let new_config = match mcproxy::load_config(config_path) {
		Ok(config) => config,
		Err(e) => {
			warn!(target: "reload", "config validation failed, not reloading: {}", e);
			return;
		},
	};

	match state.reload.apply(new_config).await {
		Ok(summary) => {
			info!(
				target: "reload",
				"reload complete: +{} -{} ~{}",
				summary.added.len(),
				summary.removed.len(),
				summary.updated.len()
			);
			state.refresh_sandbox();

			let _ = state
				.manifest
				.fire_event(
					"config_change",
					serde_json::json!({
						"removed": summary.removed,
						"updated": summary.updated,
						"added": summary.added,
					}),
				)
				.await;

			// Give staggered-starting children a moment before recomputing
			// the catalogue, same dwell the initial startup gives §4.B.
			tokio::time::sleep(MANIFEST_REBUILD_SETTLE).await;
			let all_tools = state.pool.all_tools().await;
			let prefixed = mcproxy::prefix_tools_by_server(&all_tools);
			state.manifest.build(&prefixed).await;
		},
		Err(e) => {
			warn!(target: "reload", "reload failed: {}", e);
		},
	}
}

fn mtime_of(path: &PathBuf) -> Option<SystemTime> {
	fs_err::metadata(path).ok()?.modified().ok()
}
