use super::*;
use crate::config::{Config, ManifestsConfig, SandboxConfig, ServerSpec};
use std::collections::BTreeMap;

fn config_with(servers: &[&str], namespaces: BTreeMap<String, NamespaceDef>, groups: BTreeMap<String, GroupDef>) -> Config {
	Config {
		servers: servers
			.iter()
			.map(|name| ServerSpec {
				name: name.to_string(),
				command: "true".to_string(),
				args: vec![],
				env: BTreeMap::new(),
				timeout: 60,
				enabled: true,
			})
			.collect(),
		namespaces,
		groups,
		manifests: ManifestsConfig::default(),
		sandbox: SandboxConfig::default(),
	}
}

#[test]
fn resolves_namespace_with_inheritance() {
	let mut namespaces = BTreeMap::new();
	namespaces.insert("browser".to_string(), NamespaceDef::Servers(vec!["playwright".into()]));
	namespaces.insert("files".to_string(), NamespaceDef::Servers(vec!["filesystem".into()]));
	namespaces.insert(
		"combined".to_string(),
		NamespaceDef::Full {
			servers: vec![],
			extends: vec!["browser".into(), "files".into()],
			isolated: false,
		},
	);
	let config = config_with(&["playwright", "filesystem"], namespaces, BTreeMap::new());
	let graph = NamespaceGraph::new(&config);

	assert_eq!(graph.resolve_namespace("combined"), vec!["filesystem".to_string(), "playwright".to_string()]);
}

#[test]
fn tolerates_cycles_and_terminates() {
	let mut namespaces = BTreeMap::new();
	namespaces.insert(
		"a".to_string(),
		NamespaceDef::Full {
			servers: vec!["s1".into()],
			extends: vec!["b".into()],
			isolated: false,
		},
	);
	namespaces.insert(
		"b".to_string(),
		NamespaceDef::Full {
			servers: vec!["s2".into()],
			extends: vec!["a".into()],
			isolated: false,
		},
	);
	let config = config_with(&["s1", "s2"], namespaces, BTreeMap::new());
	let graph = NamespaceGraph::new(&config);

	assert_eq!(graph.resolve_namespace("a"), vec!["s1".to_string(), "s2".to_string()]);
}

#[test]
fn default_resolution_excludes_isolated_namespaces() {
	let mut namespaces = BTreeMap::new();
	namespaces.insert("open".to_string(), NamespaceDef::Servers(vec!["a".into()]));
	namespaces.insert(
		"secret".to_string(),
		NamespaceDef::Full {
			servers: vec!["b".into()],
			extends: vec![],
			isolated: true,
		},
	);
	let config = config_with(&["a", "b"], namespaces, BTreeMap::new());
	let graph = NamespaceGraph::new(&config);

	assert_eq!(graph.resolve_default(), vec!["a".to_string()]);
}

#[test]
fn group_resolution_unions_and_requires_force_prefix_for_isolated() {
	let mut namespaces = BTreeMap::new();
	namespaces.insert("open".to_string(), NamespaceDef::Servers(vec!["a".into()]));
	namespaces.insert(
		"secret".to_string(),
		NamespaceDef::Full {
			servers: vec!["b".into()],
			extends: vec![],
			isolated: true,
		},
	);
	let mut groups = BTreeMap::new();
	groups.insert(
		"combo".to_string(),
		GroupDef {
			namespaces: vec!["open".into(), "!secret".into()],
		},
	);
	groups.insert(
		"bad".to_string(),
		GroupDef {
			namespaces: vec!["open".into(), "secret".into()],
		},
	);
	let config = config_with(&["a", "b"], namespaces, groups);
	let graph = NamespaceGraph::new(&config);

	assert_eq!(graph.resolve_group("combo").unwrap(), vec!["a".to_string(), "b".to_string()]);
	assert!(matches!(
		graph.resolve_group("bad"),
		Err(NamespaceError::GroupUnprefixedIsolated { .. })
	));
}

#[test]
fn validate_reports_missing_parent_and_unknown_server() {
	let mut namespaces = BTreeMap::new();
	namespaces.insert(
		"broken".to_string(),
		NamespaceDef::Full {
			servers: vec!["ghost".into()],
			extends: vec!["nonexistent".into()],
			isolated: false,
		},
	);
	let config = config_with(&[], namespaces, BTreeMap::new());
	let graph = NamespaceGraph::new(&config);

	let report = graph.validate();
	assert!(!report.is_ok());
	assert!(report.errors.iter().any(|e| matches!(e, NamespaceError::MissingParent { .. })));
	assert!(report.errors.iter().any(|e| matches!(e, NamespaceError::UnknownServer { .. })));
}

#[test]
fn validate_warns_on_cycle_without_failing() {
	let mut namespaces = BTreeMap::new();
	namespaces.insert(
		"a".to_string(),
		NamespaceDef::Full {
			servers: vec![],
			extends: vec!["b".into()],
			isolated: false,
		},
	);
	namespaces.insert(
		"b".to_string(),
		NamespaceDef::Full {
			servers: vec![],
			extends: vec!["a".into()],
			isolated: false,
		},
	);
	let config = config_with(&[], namespaces, BTreeMap::new());
	let graph = NamespaceGraph::new(&config);

	let report = graph.validate();
	assert!(report.is_ok());
	assert!(!report.cycle_warnings.is_empty());
}

#[test]
fn validate_rejects_empty_group_and_unknown_reference() {
	let mut groups = BTreeMap::new();
	groups.insert("empty".to_string(), GroupDef { namespaces: vec![] });
	groups.insert(
		"dangling".to_string(),
		GroupDef {
			namespaces: vec!["nope".into()],
		},
	);
	let config = config_with(&[], BTreeMap::new(), groups);
	let graph = NamespaceGraph::new(&config);

	let report = graph.validate();
	assert!(report.errors.iter().any(|e| matches!(e, NamespaceError::EmptyGroup { .. })));
	assert!(report.errors.iter().any(|e| matches!(e, NamespaceError::GroupUnknownNamespace { .. })));
}

#[test]
fn resolve_unknown_name_is_an_error() {
	let config = config_with(&[], BTreeMap::new(), BTreeMap::new());
	let graph = NamespaceGraph::new(&config);
	assert!(matches!(graph.resolve(Some("nope")), Err(NamespaceError::UnknownNamespace(_))));
}
