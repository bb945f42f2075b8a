use super::*;
use tokio::process::Command;

async fn reader_for_script(script: &str) -> (tokio::process::Child, ChildStdoutReader) {
	let mut child = Command::new("sh")
		.arg("-c")
		.arg(script)
		.stdout(std::process::Stdio::piped())
		.spawn()
		.expect("spawn sh");
	let stdout = child.stdout.take().expect("piped stdout");
	(child, ChildStdoutReader::new(stdout))
}

#[tokio::test]
async fn skips_noise_lines_before_reply() {
	let (mut child, mut reader) = reader_for_script(
		"printf 'npm install...\\n\\n{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\\n'",
	)
	.await;

	let value = reader.read_message().await.unwrap().unwrap();
	assert_eq!(value["result"]["ok"], serde_json::json!(true));
	let _ = child.wait().await;
}

#[tokio::test]
async fn detects_chunk_limit_marker_as_null() {
	let (mut child, mut reader) = reader_for_script("printf 'Chunk size exceeded LIMIT\\n'").await;

	let value = reader.read_message().await.unwrap();
	assert!(value.is_none());
	let _ = child.wait().await;
}

#[tokio::test]
async fn accumulates_multiline_json() {
	let (mut child, mut reader) = reader_for_script(
		"printf '{\\n\"jsonrpc\":\"2.0\",\\n\"id\":3,\\n\"result\":[1,2,3]\\n}\\n'",
	)
	.await;

	let value = reader.read_message().await.unwrap().unwrap();
	assert_eq!(value["result"], serde_json::json!([1, 2, 3]));
	let _ = child.wait().await;
}

#[tokio::test]
async fn eof_with_empty_buffer_is_an_error() {
	let (mut child, mut reader) = reader_for_script("true").await;

	let result = reader.read_message().await;
	assert!(matches!(result, Err(ReaderError::Eof)));
	let _ = child.wait().await;
}

#[tokio::test]
async fn final_parse_attempt_on_eof_with_pending_buffer() {
	// No trailing newline: stdout closes with a complete but unterminated value.
	let (mut child, mut reader) =
		reader_for_script("printf '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":null}'").await;

	let value = reader.read_message().await.unwrap().unwrap();
	assert_eq!(value["id"], serde_json::json!(1));
	let _ = child.wait().await;
}

#[tokio::test]
async fn empty_buffer_per_line_timeout_keeps_waiting_instead_of_erroring() {
	// The child sits silent for longer than the 1s per-line deadline before
	// ever writing a byte — a perfectly ordinary long-running `tools/call`.
	// The reader must not surface that as a timeout error; it should still be
	// waiting (bounded only by the caller's own deadline) once a reply lands.
	let (mut child, mut reader) = reader_for_script(
		"sleep 1.5; printf '{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"ok\":true}}\\n'",
	)
	.await;

	let value = reader.read_message().await.unwrap().unwrap();
	assert_eq!(value["result"]["ok"], serde_json::json!(true));
	let _ = child.wait().await;
}
