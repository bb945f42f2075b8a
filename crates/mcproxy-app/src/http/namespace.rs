// Namespace selection: a URL path segment or the `X-Namespace` header, the
// header winning when both are given. Shared by the SSE and message handlers
// since §6 states the rule once for the whole external interface, not just
// the stream-open endpoint.

use axum::http::HeaderMap;
use mcproxy::Config;
use mcproxy::NamespaceGraph;

const NAMESPACE_HEADER: &str = "x-namespace";

pub fn resolve_namespace(path_namespace: Option<String>, headers: &HeaderMap) -> Option<String> {
	headers
		.get(NAMESPACE_HEADER)
		.and_then(|v| v.to_str().ok())
		.filter(|s| !s.is_empty())
		.map(|s| s.to_string())
		.or(path_namespace)
}

pub fn is_known(config: &Config, namespace: &str) -> bool {
	NamespaceGraph::new(config).resolve(Some(namespace)).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	#[test]
	fn header_wins_when_both_are_given() {
		let mut headers = HeaderMap::new();
		headers.insert("x-namespace", HeaderValue::from_static("browser"));
		let resolved = resolve_namespace(Some("files".to_string()), &headers);
		assert_eq!(resolved.as_deref(), Some("browser"));
	}

	#[test]
	fn falls_back_to_path_segment_without_a_header() {
		let headers = HeaderMap::new();
		let resolved = resolve_namespace(Some("files".to_string()), &headers);
		assert_eq!(resolved.as_deref(), Some("files"));
	}

	#[test]
	fn empty_header_does_not_shadow_the_path_segment() {
		let mut headers = HeaderMap::new();
		headers.insert("x-namespace", HeaderValue::from_static(""));
		let resolved = resolve_namespace(Some("files".to_string()), &headers);
		assert_eq!(resolved.as_deref(), Some("files"));
	}

	#[test]
	fn neither_given_resolves_to_none() {
		let headers = HeaderMap::new();
		assert_eq!(resolve_namespace(None, &headers), None);
	}
}
