// Read-through on-disk manifest cache, TTL-bounded.
//
// Grounded on `api_manifest.py`'s `_save_cache`/`load_cache`/`invalidate_cache`.
// Per the open question in the original spec, this is consumed only at the
// `startup` event — the reconciler path never reads it back afterward.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ManifestError;
use super::registry::Manifest;

pub const CACHE_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedManifest {
	pub manifest: Manifest,
	pub namespaces: serde_json::Value,
	pub cached_at: String,
}

pub fn default_cache_path() -> PathBuf {
	PathBuf::from("./cache/manifest.json")
}

pub fn save_cache(path: &Path, cached: &CachedManifest) -> Result<(), ManifestError> {
	if let Some(parent) = path.parent() {
		fs_err::create_dir_all(parent)?;
	}
	let json = serde_json::to_string_pretty(cached)?;
	fs_err::write(path, json)?;
	Ok(())
}

pub fn load_cache(path: &Path) -> Result<CachedManifest, ManifestError> {
	let raw = fs_err::read_to_string(path)?;
	let cached: CachedManifest = serde_json::from_str(&raw)?;
	Ok(cached)
}

pub fn invalidate_cache(path: &Path) -> Result<(), ManifestError> {
	if path.exists() {
		fs_err::remove_file(path)?;
	}
	Ok(())
}

/// `cached_at` is an RFC3339 timestamp; stale if more than
/// `CACHE_TTL_SECONDS` old relative to `now`.
pub fn is_stale(cached_at: &str, now: chrono::DateTime<chrono::Utc>) -> bool {
	match chrono::DateTime::parse_from_rfc3339(cached_at) {
		Ok(cached_at) => (now - cached_at.with_timezone(&chrono::Utc)).num_seconds() > CACHE_TTL_SECONDS,
		Err(_) => true,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn round_trips_through_disk() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("manifest.json");

		let manifest = Manifest::build(&HashMap::new(), "2026-01-01T00:00:00Z");
		let cached = CachedManifest {
			manifest,
			namespaces: serde_json::json!({}),
			cached_at: "2026-01-01T00:00:00Z".to_string(),
		};
		save_cache(&path, &cached).unwrap();

		let loaded = load_cache(&path).unwrap();
		assert_eq!(loaded.cached_at, "2026-01-01T00:00:00Z");
	}

	#[test]
	fn stale_after_ttl_elapses() {
		let now = chrono::Utc::now();
		let old = (now - chrono::Duration::seconds(CACHE_TTL_SECONDS + 1)).to_rfc3339();
		assert!(is_stale(&old, now));

		let fresh = now.to_rfc3339();
		assert!(!is_stale(&fresh, now));
	}

	#[test]
	fn invalidate_removes_file_if_present() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("manifest.json");
		fs_err::write(&path, "{}").unwrap();
		invalidate_cache(&path).unwrap();
		assert!(!path.exists());
		// Idempotent: calling again on a missing file is not an error.
		invalidate_cache(&path).unwrap();
	}
}
