// `.env` loading and `${VAR}` interpolation.
//
// `load_dotenv` mirrors main.py's manual line parser rather than pulling in
// a dotenv crate's full feature set: skip blank lines and `#` comments, and
// never overwrite a variable the environment already has set.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

static VAR_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid interpolation regex"));

/// Loads `KEY=VALUE` pairs from a `.env` file next to the working directory,
/// if one exists. Silently does nothing if the file is absent.
pub fn load_dotenv(path: &Path) {
	let Ok(contents) = fs_err::read_to_string(path) else {
		return;
	};

	for line in contents.lines() {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let Some((key, value)) = line.split_once('=') else {
			continue;
		};
		let key = key.trim();
		let value = value.trim();
		if key.is_empty() {
			continue;
		}
		if std::env::var_os(key).is_none() {
			// SAFETY: single-threaded at startup, before any child spawning begins.
			unsafe {
				std::env::set_var(key, value);
			}
		}
	}
}

/// Walks the config tree replacing `${NAME}` occurrences in every string
/// scalar with the matching environment variable, or an empty string (with a
/// warning) if it is unset.
pub fn interpolate_env_vars(value: &mut Value) {
	match value {
		Value::String(s) => {
			if VAR_PATTERN.is_match(s) {
				*s = interpolate_string(s);
			}
		},
		Value::Array(items) => {
			for item in items {
				interpolate_env_vars(item);
			}
		},
		Value::Object(map) => {
			for (_, v) in map.iter_mut() {
				interpolate_env_vars(v);
			}
		},
		_ => {},
	}
}

fn interpolate_string(input: &str) -> String {
	VAR_PATTERN
		.replace_all(input, |caps: &regex::Captures| {
			let name = &caps[1];
			std::env::var(name).unwrap_or_else(|_| {
				warn!(target: "config", "environment variable '{}' is unset, interpolating empty string", name);
				String::new()
			})
		})
		.into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn interpolates_set_variable() {
		// SAFETY: test runs single-threaded within this process.
		unsafe {
			std::env::set_var("MCPROXY_TEST_VAR", "hello");
		}
		let mut value = serde_json::json!({"a": "${MCPROXY_TEST_VAR} world"});
		interpolate_env_vars(&mut value);
		assert_eq!(value["a"], "hello world");
	}

	#[test]
	fn interpolates_unset_variable_as_empty() {
		// SAFETY: test runs single-threaded within this process.
		unsafe {
			std::env::remove_var("MCPROXY_TEST_UNSET");
		}
		let mut value = serde_json::json!({"a": "${MCPROXY_TEST_UNSET}"});
		interpolate_env_vars(&mut value);
		assert_eq!(value["a"], "");
	}

	#[test]
	fn recurses_into_arrays_and_objects() {
		// SAFETY: test runs single-threaded within this process.
		unsafe {
			std::env::set_var("MCPROXY_TEST_NESTED", "x");
		}
		let mut value = serde_json::json!({"list": ["${MCPROXY_TEST_NESTED}", {"k": "${MCPROXY_TEST_NESTED}"}]});
		interpolate_env_vars(&mut value);
		assert_eq!(value["list"][0], "x");
		assert_eq!(value["list"][1]["k"], "x");
	}

	#[test]
	fn load_dotenv_does_not_overwrite_existing() {
		// SAFETY: test runs single-threaded within this process.
		unsafe {
			std::env::set_var("MCPROXY_TEST_PRESET", "original");
		}
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs_err::write(&path, "MCPROXY_TEST_PRESET=overwritten\nMCPROXY_TEST_FRESH=new\n# comment\n\n").unwrap();

		load_dotenv(&path);

		assert_eq!(std::env::var("MCPROXY_TEST_PRESET").unwrap(), "original");
		assert_eq!(std::env::var("MCPROXY_TEST_FRESH").unwrap(), "new");
	}
}
