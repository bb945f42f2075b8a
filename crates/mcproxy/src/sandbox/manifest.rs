// The pruned manifest view embedded into the sandbox driver: just enough
// for the in-driver access-control check and tool enumeration, none of the
// gateway's internal bookkeeping.
//
// Grounded on `api_sandbox.py`'s `SandboxManifest` dataclass.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Config;
use crate::manifest::Manifest;

#[derive(Debug, Clone, Serialize)]
pub struct SandboxServerEntry {
	pub tools: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SandboxNamespaceEntry {
	pub servers: Vec<String>,
	pub extends: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SandboxManifest {
	pub servers: BTreeMap<String, SandboxServerEntry>,
	pub namespaces: BTreeMap<String, SandboxNamespaceEntry>,
}

impl SandboxManifest {
	/// Prunes the aggregated `Manifest` (tool names only, server prefix
	/// stripped) and the config's namespace graph (servers/extends only,
	/// `isolated` is an access-control concern the driver's resolver already
	/// encodes by simply not listing isolated namespaces' servers elsewhere)
	/// down to what the in-sandbox access-control check needs.
	pub fn build(manifest: &Manifest, config: &Config) -> Self {
		let servers = manifest
			.tools_by_server
			.iter()
			.map(|(server, tools)| {
				let names = tools
					.iter()
					.map(|t| t.name.split_once("__").map(|(_, rest)| rest.to_string()).unwrap_or_else(|| t.name.clone()))
					.collect();
				(server.clone(), SandboxServerEntry { tools: names })
			})
			.collect();

		let namespaces = config
			.namespaces
			.iter()
			.map(|(name, def)| {
				(
					name.clone(),
					SandboxNamespaceEntry {
						servers: def.servers().to_vec(),
						extends: def.extends().to_vec(),
					},
				)
			})
			.collect();

		Self { servers, namespaces }
	}
}
