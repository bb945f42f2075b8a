// Fuzzy search over the aggregated catalogue, at a caller-chosen depth.
//
// Grounded on `api_manifest.py`'s `ManifestQuery.search` / `_fuzzy_match`.
// The "sequence-matching ratio" tier uses `strsim::normalized_levenshtein`
// as a practical analogue of Python's `difflib.SequenceMatcher.ratio` — both
// are bounded similarity scores in `[0, 1]`; exact parity with the Ratcliff/
// Obershelp algorithm is not required for the scoring to behave sensibly.

use serde::Serialize;

use super::registry::Manifest;
use crate::child::Tool;

pub const MIN_SIMILARITY: f64 = 0.4;
pub const DESCRIPTION_WORD_THRESHOLD: f64 = MIN_SIMILARITY * 0.7;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryMatch {
	pub category: String,
	pub matched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolMatch {
	pub name: String,
	pub score: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", rename = "inputSchema")]
	pub input_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerMatch {
	pub server: String,
	pub score: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub categories: Option<Vec<CategoryMatch>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tools: Option<Vec<ToolMatch>>,
}

/// The aggregated match lists `api_manifest.py.search` builds alongside
/// `results`: a flat record of every server name, `server:category`, and
/// `server:tool` pair that cleared the similarity threshold, independent of
/// per-server depth gating.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchLists {
	pub servers: Vec<String>,
	pub categories: Vec<String>,
	pub tools: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
	pub results: Vec<ServerMatch>,
	pub matches: MatchLists,
	pub total_matches: usize,
}

/// Two-tier fuzzy score in `[0, 1]`: exact substring containment short-
/// circuits to 1.0; otherwise a word-level comparison, falling back to a
/// raw whole-string ratio when either side tokenizes to nothing.
pub fn fuzzy_match(query: &str, target: &str, word_threshold: f64) -> f64 {
	let query = query.to_lowercase();
	let target = target.to_lowercase();

	if query.is_empty() {
		return 1.0;
	}
	if target.contains(&query) {
		return 1.0;
	}

	let query_words: Vec<&str> = query.split_whitespace().collect();
	let target_words: Vec<&str> = target.split_whitespace().collect();

	if query_words.is_empty() || target_words.is_empty() {
		return strsim::normalized_levenshtein(&query, &target);
	}

	let matched = query_words
		.iter()
		.filter(|qw| {
			target_words
				.iter()
				.any(|tw| tw.contains(*qw) || strsim::normalized_levenshtein(qw, tw) >= word_threshold)
		})
		.count();

	matched as f64 / query_words.len() as f64
}

/// Runs a search over `manifest`, restricted to `allowed` servers if given
/// (the namespace filter). Depth controls how much detail each result
/// carries, not whether a server is matched.
pub fn search(manifest: &Manifest, query: &str, allowed: Option<&[String]>, depth: u8) -> SearchResult {
	let show_all = depth >= 1 && query.chars().count() <= 1;
	let candidates = manifest.get_servers(allowed);

	let mut results = Vec::new();
	let mut matches = MatchLists::default();

	for server in candidates {
		let entry = &manifest.servers[&server];
		let server_score = if show_all { 1.0 } else { fuzzy_match(query, &server, MIN_SIMILARITY) };
		if server_score >= MIN_SIMILARITY {
			matches.servers.push(server.clone());
		}

		let mut categories = None;
		let mut best_category_score: f64 = 0.0;
		if depth >= 1 {
			let cats: Vec<CategoryMatch> = entry
				.categories
				.iter()
				.map(|c| {
					let score = if show_all { 1.0 } else { fuzzy_match(query, c, MIN_SIMILARITY) };
					best_category_score = best_category_score.max(score);
					let matched = score >= MIN_SIMILARITY;
					if matched {
						matches.categories.push(format!("{server}:{c}"));
					}
					CategoryMatch {
						category: c.clone(),
						matched,
					}
				})
				.collect();
			categories = Some(cats);
		}

		let mut tools = None;
		let mut best_tool_score: f64 = 0.0;
		if depth >= 2 {
			let tool_matches: Vec<ToolMatch> = manifest
				.tools_by_server
				.get(&server)
				.into_iter()
				.flatten()
				.filter_map(|tool| {
					score_tool(tool, query, show_all, depth).map(|(score, m)| {
						best_tool_score = best_tool_score.max(score);
						matches.tools.push(format!("{server}:{}", tool.name));
						m
					})
				})
				.collect();
			tools = Some(tool_matches);
		}

		let overall = server_score.max(best_category_score).max(best_tool_score);
		if overall < MIN_SIMILARITY {
			continue;
		}

		results.push(ServerMatch {
			server,
			score: overall,
			categories,
			tools,
		});
	}

	let total_matches = matches.servers.len() + matches.categories.len() + matches.tools.len();
	SearchResult { results, matches, total_matches }
}

fn score_tool(tool: &Tool, query: &str, show_all: bool, depth: u8) -> Option<(f64, ToolMatch)> {
	let name_score = if show_all { 1.0 } else { fuzzy_match(query, &tool.name, MIN_SIMILARITY) };
	let desc_score = if show_all {
		1.0
	} else {
		tool.description
			.as_deref()
			.map(|d| fuzzy_match(query, d, DESCRIPTION_WORD_THRESHOLD))
			.unwrap_or(0.0)
	};
	let score = name_score.max(desc_score);
	if score < MIN_SIMILARITY {
		return None;
	}

	Some((
		score,
		ToolMatch {
			name: tool.name.clone(),
			score,
			description: (depth >= 3).then(|| tool.description.clone()).flatten(),
			input_schema: (depth >= 3).then(|| tool.input_schema.clone()),
		},
	))
}
