// Static deny-list validation for candidate sandbox code: size gate, NFKC
// normalisation, comment stripping, and an AST walk for blocked imports and
// blocked direct-call builtins. Syntactic, deterministic, side-effect-free.
//
// Grounded on `api_sandbox.py`'s `SandboxExecutor.validate_code` /
// `_strip_comments` / `_check_blocked_imports` / `_check_blocked_builtins`.
// The teacher repo has no Python-AST precedent, so the parse/walk step is
// built directly on the `ruff_python_parser`/`ruff_python_ast` crates the
// workspace already depends on for exactly this purpose — a real syntax
// tree, not a substring scan, per §4.F's "syntactic, not substring" note.

use ruff_python_ast::visitor::{self, Visitor};
use ruff_python_ast::{Expr, ModModule, Stmt};
use unicode_normalization::UnicodeNormalization;

pub const MAX_CODE_SIZE_BYTES: usize = 50 * 1024;

pub const BLOCKED_IMPORTS: &[&str] = &[
	"os",
	"sys",
	"subprocess",
	"socket",
	"http",
	"urllib",
	"requests",
	"shutil",
	"tempfile",
	"multiprocessing",
	"__import__",
	"builtins",
];

pub const BLOCKED_BUILTINS: &[&str] = &["eval", "exec", "compile", "open", "input", "__import__", "breakpoint"];

/// Runs the full validation pipeline. `Ok(())` means the code is clean;
/// `Err(reason)` carries a human-readable explanation of the first
/// violation found.
pub fn validate(code: &str) -> Result<(), String> {
	if code.len() > MAX_CODE_SIZE_BYTES {
		return Err(format!("Code exceeds maximum size of {MAX_CODE_SIZE_BYTES} bytes"));
	}

	let normalized: String = code.nfkc().collect();
	let cleaned = strip_comments(&normalized);

	let parsed = ruff_python_parser::parse_module(&cleaned).map_err(|e| format!("Syntax error: {e}"))?;
	let module: &ModModule = parsed.syntax();

	let mut finder = DenyListFinder::default();
	finder.visit_body(&module.body);

	if let Some(module) = finder.blocked_import {
		return Err(format!("Blocked import detected: {module}"));
	}
	if let Some(name) = finder.blocked_builtin {
		return Err(format!("Blocked builtin detected: {name}"));
	}

	Ok(())
}

/// Removes `#` end-of-line comments while tracking (including triple-quoted)
/// string state, so a `#` inside a string literal survives and a `#` that
/// starts a real comment is dropped. Operates line by line, matching the
/// original's structure — Python has no line-continuation-sensitive
/// comment/string interplay that would require whole-source tracking here.
fn strip_comments(code: &str) -> String {
	let mut cleaned_lines = Vec::new();

	for line in code.split('\n') {
		let chars: Vec<char> = line.chars().collect();
		let mut result = String::new();
		let mut in_string = false;
		let mut string_delim: Option<String> = None;
		let mut i = 0;

		while i < chars.len() {
			let c = chars[i];

			if !in_string {
				if c == '"' || c == '\'' {
					let triple = (i + 2 < chars.len())
						.then(|| triple_at(&chars, i))
						.flatten()
						.filter(|d| d == "\"\"\"" || d == "'''");
					if let Some(triple) = triple {
						in_string = true;
						string_delim = Some(triple.clone());
						result.push_str(&triple);
						i += 3;
						continue;
					} else {
						in_string = true;
						string_delim = Some(c.to_string());
					}
				} else if c == '#' {
					break;
				}
			} else if let Some(delim) = &string_delim {
				if delim.len() == 3 {
					if i + 2 < chars.len() && triple_at(&chars, i).as_deref() == Some(delim.as_str()) {
						in_string = false;
						result.push_str(delim);
						i += 3;
						continue;
					}
				} else if c.to_string() == *delim && (i == 0 || chars[i - 1] != '\\') {
					in_string = false;
				}
			}

			result.push(c);
			i += 1;
		}

		cleaned_lines.push(result);
	}

	cleaned_lines.join("\n")
}

fn triple_at(chars: &[char], i: usize) -> Option<String> {
	if i + 3 > chars.len() {
		return None;
	}
	let candidate: String = chars[i..i + 3].iter().collect();
	(candidate == "\"\"\"" || candidate == "'''").then_some(candidate)
}

#[derive(Default)]
struct DenyListFinder {
	blocked_import: Option<String>,
	blocked_builtin: Option<String>,
}

impl DenyListFinder {
	fn visit_body(&mut self, body: &[Stmt]) {
		for stmt in body {
			self.visit_stmt(stmt);
		}
	}
}

impl<'a> Visitor<'a> for DenyListFinder {
	fn visit_stmt(&mut self, stmt: &'a Stmt) {
		match stmt {
			Stmt::Import(import) => {
				for alias in &import.names {
					let root = root_segment(alias.name.as_str());
					if BLOCKED_IMPORTS.contains(&root) && self.blocked_import.is_none() {
						self.blocked_import = Some(alias.name.to_string());
					}
				}
			},
			Stmt::ImportFrom(import_from) => {
				if let Some(module) = &import_from.module {
					let root = root_segment(module.as_str());
					if BLOCKED_IMPORTS.contains(&root) && self.blocked_import.is_none() {
						self.blocked_import = Some(module.to_string());
					}
				}
			},
			_ => {},
		}
		visitor::walk_stmt(self, stmt);
	}

	fn visit_expr(&mut self, expr: &'a Expr) {
		if let Expr::Call(call) = expr {
			if let Expr::Name(name) = call.func.as_ref() {
				if BLOCKED_BUILTINS.contains(&name.id.as_str()) && self.blocked_builtin.is_none() {
					self.blocked_builtin = Some(name.id.to_string());
				}
			}
		}
		visitor::walk_expr(self, expr);
	}
}

fn root_segment(dotted: &str) -> &str {
	dotted.split('.').next().unwrap_or(dotted)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_direct_blocked_import() {
		let result = validate("import os\nx = 1");
		assert!(result.is_err());
		assert!(result.unwrap_err().contains("os"));
	}

	#[test]
	fn rejects_from_import_blocked_module() {
		let result = validate("from subprocess import run\n");
		assert!(result.is_err());
	}

	#[test]
	fn accepts_clean_code() {
		assert!(validate("x = 1 + 2\nprint(x)").is_ok());
	}

	#[test]
	fn comment_only_import_is_not_flagged() {
		assert!(validate("# import os\nx = 1").is_ok());
	}

	#[test]
	fn hash_inside_string_is_preserved_not_a_comment() {
		let code = "x = \"a # b\"\nimport os";
		let result = validate(code);
		assert!(result.is_err(), "real import after a string containing '#' must still be caught");
	}

	#[test]
	fn rejects_direct_call_to_blocked_builtin() {
		let result = validate("eval('1 + 1')");
		assert!(result.is_err());
		assert!(result.unwrap_err().contains("eval"));
	}

	#[test]
	fn attribute_style_call_is_not_flagged() {
		assert!(validate("obj.open()").is_ok());
	}

	#[test]
	fn rejects_code_over_size_limit() {
		let code = "x = 1\n".repeat(20_000);
		assert!(validate(&code).is_err());
	}

	#[test]
	fn rejects_syntax_error() {
		assert!(validate("def f(:\n").is_err());
	}

	#[test]
	fn nested_import_is_found_inside_function() {
		let code = "def f():\n    import socket\n    return socket\n";
		assert!(validate(code).is_err());
	}
}
