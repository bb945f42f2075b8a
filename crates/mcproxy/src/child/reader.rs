// Framed JSON-RPC reader over a child's noisy stdout.
//
// A child's stdout is not a clean JSON stream: package manager chatter,
// startup banners, and blank lines can appear ahead of (or between) actual
// replies. `read_message` tolerates all of that and returns the first value
// that parses, `Ok(None)` for a recognised in-band error marker, or an error
// on timeout/EOF-without-data.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tracing::{debug, warn};

const PER_LINE_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_ACCUMULATED_LINES: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
	#[error("no reply within the per-line deadline")]
	Timeout,
	#[error("child stream closed with no accumulated reply")]
	Eof,
	#[error("abandoned after {0} accumulated lines without a successful parse")]
	Overflow(usize),
	#[error("failed to read child stdout: {0}")]
	Io(#[from] std::io::Error),
}

/// Reads JSON-RPC messages one at a time from a child's stdout.
pub struct ChildStdoutReader {
	lines: tokio::io::Lines<BufReader<ChildStdout>>,
}

impl ChildStdoutReader {
	pub fn new(stdout: ChildStdout) -> Self {
		Self {
			lines: BufReader::new(stdout).lines(),
		}
	}

	/// Reads until a JSON value parses, a known error marker is seen (`Ok(None)`),
	/// or the stream is abandoned (`Err`).
	pub async fn read_message(&mut self) -> Result<Option<serde_json::Value>, ReaderError> {
		let mut buffer = String::new();
		let mut accumulated = 0usize;

		loop {
			let line = match tokio::time::timeout(PER_LINE_TIMEOUT, self.lines.next_line()).await {
				Ok(Ok(Some(line))) => line,
				Ok(Ok(None)) => {
					if buffer.trim().is_empty() {
						return Err(ReaderError::Eof);
					}
					return match serde_json::from_str(&buffer) {
						Ok(value) => Ok(Some(value)),
						Err(_) => Err(ReaderError::Eof),
					};
				},
				Ok(Err(e)) => return Err(ReaderError::Io(e)),
				Err(_elapsed) => {
					// The per-line deadline only marks end-of-frame once a reply has
					// started accumulating. An empty buffer just means the child is
					// still thinking — keep waiting rather than treating ordinary
					// long-running `tools/call` latency as a failure; the call/init
					// site's own timeout is what actually bounds this loop.
					if buffer.is_empty() {
						continue;
					}
					return match serde_json::from_str(&buffer) {
						Ok(value) => Ok(Some(value)),
						Err(_) => Err(ReaderError::Timeout),
					};
				},
			};

			let trimmed = line.trim();
			if trimmed.is_empty() {
				continue;
			}

			let lower = trimmed.to_ascii_lowercase();
			if lower.contains("chunk") && lower.contains("limit") {
				warn!(target: "child", "detected chunk/limit noise marker, treating as null reply");
				return Ok(None);
			}

			if buffer.is_empty() && !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
				debug!(target: "child", "discarding non-JSON noise line: {}", trimmed);
				continue;
			}

			if !buffer.is_empty() {
				buffer.push('\n');
			}
			buffer.push_str(&line);
			accumulated += 1;

			if let Ok(value) = serde_json::from_str(&buffer) {
				return Ok(Some(value));
			}

			if accumulated >= MAX_ACCUMULATED_LINES {
				warn!(
					target: "child",
					"abandoning parse after {} lines, partial buffer: {}",
					accumulated, buffer
				);
				return Err(ReaderError::Overflow(accumulated));
			}
		}
	}
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod reader_tests;
