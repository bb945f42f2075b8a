// Tool-name prefixing: turns each child's raw tool list into the gateway's
// `<server>__<tool>` catalogue view, and parses a prefixed name back into
// its (server, tool) parts for routing.
//
// Grounded directly on `tool_aggregator.py`'s `prefix_tool_name` /
// `aggregate_tools` / `parse_prefixed_tool_name` — a standalone original
// file with no teacher analogue, carried over near-verbatim since its
// contract (Invariant (ii) in §3) is exactly what the spec names.

use std::collections::HashMap;

use tracing::warn;

use crate::child::Tool;

pub fn prefix_tool_name(server: &str, tool: &str) -> String {
	format!("{server}__{tool}")
}

/// Splits a prefixed name on the first `__` into `(server, tool)`. Server
/// names are assumed not to contain `__`, matching §3's naming convention.
pub fn parse_prefixed_tool_name(prefixed: &str) -> Result<(&str, &str), String> {
	prefixed.split_once("__").ok_or_else(|| format!("invalid tool name format: {prefixed}"))
}

/// Maps each child's raw tool list into prefixed-name copies with `server`
/// populated, preserving the per-server grouping the Manifest Registry
/// expects. Invalid entries (nameless tools) are skipped with a warning,
/// mirroring `aggregate_tools`'s tolerance of malformed child output.
pub fn prefix_tools_by_server(all_tools: &HashMap<String, Vec<Tool>>) -> HashMap<String, Vec<Tool>> {
	let mut out = HashMap::with_capacity(all_tools.len());
	for (server, tools) in all_tools {
		let mut seen = std::collections::HashSet::new();
		let prefixed: Vec<Tool> = tools
			.iter()
			.filter_map(|tool| {
				if tool.name.trim().is_empty() {
					warn!(target: "aggregate", "invalid tool format from server '{}': nameless tool", server);
					return None;
				}
				let display_name = prefix_tool_name(server, &tool.name);
				if !seen.insert(display_name.clone()) {
					warn!(target: "aggregate", "duplicate tool name '{}' from server '{}'", display_name, server);
					return None;
				}
				Some(Tool {
					name: display_name,
					description: tool.description.clone(),
					input_schema: tool.input_schema.clone(),
					server: Some(server.clone()),
				})
			})
			.collect();
		out.insert(server.clone(), prefixed);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tool(name: &str) -> Tool {
		Tool {
			name: name.to_string(),
			description: None,
			input_schema: serde_json::json!({}),
			server: None,
		}
	}

	#[test]
	fn parse_prefixed_round_trips_with_prefix() {
		let prefixed = prefix_tool_name("echo", "hi");
		assert_eq!(prefixed, "echo__hi");
		assert_eq!(parse_prefixed_tool_name(&prefixed).unwrap(), ("echo", "hi"));
	}

	#[test]
	fn parse_rejects_name_without_separator() {
		assert!(parse_prefixed_tool_name("nosep").is_err());
	}

	#[test]
	fn prefix_tools_by_server_sets_server_and_skips_nameless() {
		let mut input = HashMap::new();
		input.insert("echo".to_string(), vec![tool("hi"), tool("")]);

		let result = prefix_tools_by_server(&input);
		let echo_tools = &result["echo"];
		assert_eq!(echo_tools.len(), 1);
		assert_eq!(echo_tools[0].name, "echo__hi");
		assert_eq!(echo_tools[0].server.as_deref(), Some("echo"));
	}

	#[test]
	fn prefix_tools_by_server_skips_duplicate_display_names() {
		let mut input = HashMap::new();
		input.insert("echo".to_string(), vec![tool("hi"), tool("hi")]);

		let result = prefix_tools_by_server(&input);
		assert_eq!(result["echo"].len(), 1);
	}
}
