// Namespace/group resolution: turns a namespace, group, or the implicit
// "default" endpoint into a sorted set of accessible server names.
//
// Grounded on `api_manifest.py`'s `_resolve_recursive` (cycle-tolerant
// runtime resolution with a `visiting` set) and `validate_inheritance`
// (a separate, stricter validation pass using `visited`/`rec_stack`).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::config::{Config, GroupDef, NamespaceDef};

use super::error::NamespaceError;

pub struct NamespaceGraph<'a> {
	namespaces: &'a BTreeMap<String, NamespaceDef>,
	groups: &'a BTreeMap<String, GroupDef>,
	known_servers: HashSet<&'a str>,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
	pub errors: Vec<NamespaceError>,
	pub cycle_warnings: Vec<String>,
}

impl ValidationReport {
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}
}

impl<'a> NamespaceGraph<'a> {
	pub fn new(config: &'a Config) -> Self {
		Self {
			namespaces: &config.namespaces,
			groups: &config.groups,
			known_servers: config.servers.iter().map(|s| s.name.as_str()).collect(),
		}
	}

	/// Resolves a namespace name, a group name, or `None` for the implicit
	/// default endpoint.
	pub fn resolve(&self, name: Option<&str>) -> Result<Vec<String>, NamespaceError> {
		match name {
			None => Ok(self.resolve_default()),
			Some(name) => {
				if self.namespaces.contains_key(name) {
					Ok(self.resolve_namespace(name))
				} else if self.groups.contains_key(name) {
					self.resolve_group(name)
				} else {
					Err(NamespaceError::UnknownNamespace(name.to_string()))
				}
			},
		}
	}

	/// Cycle-tolerant depth-first walk of `extends`, collecting `servers`
	/// into a set. Missing parents are skipped with a warning, not an error
	/// — runtime resolution is best-effort over whatever is reachable.
	pub fn resolve_namespace(&self, name: &str) -> Vec<String> {
		let mut servers = BTreeSet::new();
		let mut visiting = HashSet::new();
		self.resolve_namespace_into(name, &mut visiting, &mut servers);
		servers.into_iter().collect()
	}

	fn resolve_namespace_into(&self, name: &str, visiting: &mut HashSet<String>, servers: &mut BTreeSet<String>) {
		if visiting.contains(name) {
			debug!(target: "namespace", "cycle detected revisiting '{}', breaking", name);
			return;
		}
		let Some(def) = self.namespaces.get(name) else {
			warn!(target: "namespace", "namespace '{}' references missing parent, skipping", name);
			return;
		};
		visiting.insert(name.to_string());
		servers.extend(def.servers().iter().cloned());
		for parent in def.extends() {
			self.resolve_namespace_into(parent, visiting, servers);
		}
	}

	/// Unions the resolved servers of every referenced namespace. An
	/// unprefixed reference to an isolated namespace is a hard error here
	/// too, as a safety net for configs that reach resolution without
	/// having passed `validate` first.
	pub fn resolve_group(&self, name: &str) -> Result<Vec<String>, NamespaceError> {
		let group = self
			.groups
			.get(name)
			.ok_or_else(|| NamespaceError::UnknownGroup(name.to_string()))?;

		let mut servers = BTreeSet::new();
		for reference in &group.namespaces {
			let (forced, ns_name) = strip_force_prefix(reference);
			let Some(def) = self.namespaces.get(ns_name) else {
				return Err(NamespaceError::GroupUnknownNamespace {
					group: name.to_string(),
					namespace: ns_name.to_string(),
				});
			};
			if def.isolated() && !forced {
				return Err(NamespaceError::GroupUnprefixedIsolated {
					group: name.to_string(),
					namespace: ns_name.to_string(),
				});
			}
			servers.extend(self.resolve_namespace(ns_name));
		}
		Ok(servers.into_iter().collect())
	}

	/// The implicit default endpoint: the union of every non-isolated
	/// namespace's resolved servers.
	pub fn resolve_default(&self) -> Vec<String> {
		let mut servers = BTreeSet::new();
		for (name, def) in self.namespaces {
			if !def.isolated() {
				servers.extend(self.resolve_namespace(name));
			}
		}
		servers.into_iter().collect()
	}

	pub fn is_isolated(&self, name: &str) -> bool {
		self.namespaces.get(name).map(|d| d.isolated()).unwrap_or(false)
	}

	/// Whether `server` is reachable through the resolution of `namespace`.
	pub fn can_access(&self, namespace: Option<&str>, server: &str) -> Result<bool, NamespaceError> {
		Ok(self.resolve(namespace)?.iter().any(|s| s == server))
	}

	/// Separate, stricter validation pass: missing parents and unknown
	/// server references are hard errors, cycles are warnings only.
	pub fn validate(&self) -> ValidationReport {
		let mut report = ValidationReport::default();

		for (name, def) in self.namespaces {
			for server in def.servers() {
				if !self.known_servers.contains(server.as_str()) {
					report.errors.push(NamespaceError::UnknownServer {
						namespace: name.clone(),
						server: server.clone(),
					});
				}
			}
			for parent in def.extends() {
				if !self.namespaces.contains_key(parent) {
					report.errors.push(NamespaceError::MissingParent {
						namespace: name.clone(),
						parent: parent.clone(),
					});
				}
			}
		}

		for name in self.namespaces.keys() {
			let mut visited = HashSet::new();
			let mut rec_stack = HashSet::new();
			self.detect_cycle(name, &mut visited, &mut rec_stack, &mut report);
		}

		for (group_name, group) in self.groups {
			if group.namespaces.is_empty() {
				report.errors.push(NamespaceError::EmptyGroup {
					group: group_name.clone(),
				});
				continue;
			}
			for reference in &group.namespaces {
				let (forced, ns_name) = strip_force_prefix(reference);
				match self.namespaces.get(ns_name) {
					None => report.errors.push(NamespaceError::GroupUnknownNamespace {
						group: group_name.clone(),
						namespace: ns_name.to_string(),
					}),
					Some(def) if def.isolated() && !forced => {
						report.errors.push(NamespaceError::GroupUnprefixedIsolated {
							group: group_name.clone(),
							namespace: ns_name.to_string(),
						});
					},
					Some(_) => {},
				}
			}
		}

		report
	}

	fn detect_cycle(
		&self,
		name: &str,
		visited: &mut HashSet<String>,
		rec_stack: &mut HashSet<String>,
		report: &mut ValidationReport,
	) {
		if rec_stack.contains(name) {
			report.cycle_warnings.push(format!("cycle detected involving namespace '{name}'"));
			return;
		}
		if visited.contains(name) {
			return;
		}
		let Some(def) = self.namespaces.get(name) else {
			return;
		};
		visited.insert(name.to_string());
		rec_stack.insert(name.to_string());
		for parent in def.extends() {
			self.detect_cycle(parent, visited, rec_stack, report);
		}
		rec_stack.remove(name);
	}
}

fn strip_force_prefix(reference: &str) -> (bool, &str) {
	match reference.strip_prefix('!') {
		Some(rest) => (true, rest),
		None => (false, reference),
	}
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
