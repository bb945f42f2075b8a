// Namespace/group access-control error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NamespaceError {
	#[error("unknown namespace '{0}'")]
	UnknownNamespace(String),

	#[error("unknown group '{0}'")]
	UnknownGroup(String),

	#[error("namespace '{namespace}' extends unknown namespace '{parent}'")]
	MissingParent { namespace: String, parent: String },

	#[error("namespace '{namespace}' references unknown server '{server}'")]
	UnknownServer { namespace: String, server: String },

	#[error("group '{group}' has an empty namespaces list")]
	EmptyGroup { group: String },

	#[error("group '{group}' references unknown namespace '{namespace}'")]
	GroupUnknownNamespace { group: String, namespace: String },

	#[error(
		"group '{group}' references isolated namespace '{namespace}' without the '!' force-include prefix"
	)]
	GroupUnprefixedIsolated { group: String, namespace: String },

	#[error("access denied: namespace '{namespace}' does not grant access to server '{server}'")]
	AccessDenied { namespace: String, server: String },
}
