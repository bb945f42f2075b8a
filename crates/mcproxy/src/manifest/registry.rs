// The aggregated tool catalogue: build, query, and in-place status patching.
//
// Grounded on `api_manifest.py`'s `CapabilityRegistry` — field names and the
// category-extraction heuristic (`_extract_category`) follow it directly.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::child::Tool;

pub const MANIFEST_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerManifestEntry {
	pub tool_count: usize,
	pub categories: Vec<String>,
	pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
	pub version: String,
	pub generated_at: String,
	pub servers: BTreeMap<String, ServerManifestEntry>,
	pub tools_by_server: BTreeMap<String, Vec<Tool>>,
	pub tool_count: usize,
	pub server_count: usize,
}

impl Manifest {
	/// Builds a manifest from the per-server tool mapping. Invalid entries
	/// (nameless tools; not expected from a well-formed Tool, but schema-
	/// permissive children can send anything) are skipped with a warning.
	pub fn build(all_tools: &HashMap<String, Vec<Tool>>, generated_at: impl Into<String>) -> Self {
		let mut servers = BTreeMap::new();
		let mut tools_by_server = BTreeMap::new();
		let mut tool_count = 0;

		for (server, tools) in all_tools {
			let mut valid_tools = Vec::new();
			let mut categories = std::collections::BTreeSet::new();

			for tool in tools {
				if tool.name.trim().is_empty() {
					warn!(target: "manifest", "skipping nameless tool from server '{}'", server);
					continue;
				}
				categories.insert(extract_category(&tool.name));
				valid_tools.push(tool.clone());
			}

			tool_count += valid_tools.len();
			servers.insert(
				server.clone(),
				ServerManifestEntry {
					tool_count: valid_tools.len(),
					categories: categories.into_iter().collect(),
					status: "active".to_string(),
				},
			);
			tools_by_server.insert(server.clone(), valid_tools);
		}

		let server_count = servers.len();
		Self {
			version: MANIFEST_VERSION.to_string(),
			generated_at: generated_at.into(),
			servers,
			tools_by_server,
			tool_count,
			server_count,
		}
	}

	pub fn get_servers(&self, allowed: Option<&[String]>) -> Vec<String> {
		match allowed {
			None => self.servers.keys().cloned().collect(),
			Some(allowed) => self
				.servers
				.keys()
				.filter(|s| allowed.iter().any(|a| a == *s))
				.cloned()
				.collect(),
		}
	}

	pub fn get_tools(&self, server: &str, allowed: Option<&[String]>) -> Vec<Tool> {
		if let Some(allowed) = allowed {
			if !allowed.iter().any(|a| a == server) {
				return Vec::new();
			}
		}
		self.tools_by_server.get(server).cloned().unwrap_or_default()
	}

	/// In-place status patch used by the `server_health` event side effect.
	pub fn patch_server_status(&mut self, server: &str, status: &str) -> bool {
		if let Some(entry) = self.servers.get_mut(server) {
			entry.status = status.to_string();
			true
		} else {
			false
		}
	}
}

/// Splits on the first `__` and title-cases the prefix, matching
/// `_extract_category`. Tools with no `__` fall into an "Other" bucket.
pub fn extract_category(tool_name: &str) -> String {
	match tool_name.split_once("__") {
		Some((prefix, _)) => title_case(prefix),
		None => "Other".to_string(),
	}
}

fn title_case(s: &str) -> String {
	s.split(['_', '-'])
		.filter(|w| !w.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_category_from_prefix() {
		assert_eq!(extract_category("playwright__click"), "Playwright");
		assert_eq!(extract_category("no_prefix_tool"), "Other");
	}

	#[test]
	fn build_skips_nameless_tools_and_aggregates_counts() {
		let mut tools = HashMap::new();
		tools.insert(
			"echo".to_string(),
			vec![
				Tool {
					name: "echo__hi".to_string(),
					description: None,
					input_schema: serde_json::json!({}),
					server: None,
				},
				Tool {
					name: "".to_string(),
					description: None,
					input_schema: serde_json::json!({}),
					server: None,
				},
			],
		);

		let manifest = Manifest::build(&tools, "2026-01-01T00:00:00Z");
		assert_eq!(manifest.tool_count, 1);
		assert_eq!(manifest.servers["echo"].tool_count, 1);
		assert_eq!(manifest.server_count, 1);
	}

	#[test]
	fn patch_server_status_updates_in_place() {
		let mut tools = HashMap::new();
		tools.insert("echo".to_string(), vec![]);
		let mut manifest = Manifest::build(&tools, "2026-01-01T00:00:00Z");
		assert!(manifest.patch_server_status("echo", "degraded"));
		assert_eq!(manifest.servers["echo"].status, "degraded");
		assert!(!manifest.patch_server_status("missing", "degraded"));
	}
}
