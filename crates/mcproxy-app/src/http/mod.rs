// HTTP surface: the SSE transport (§6 "wire protocol, client side") plus
// the JSON-RPC dispatch it carries. Split to match the spec's own split
// between stream-open and message-handling concerns.

pub mod dispatch;
pub mod meta_tools;
pub mod namespace;
pub mod sse;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full router: `GET /sse[/{namespace}]` for the stream, and
/// `POST /message` with `POST /sse` kept as an alias per §6.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/sse", get(sse::default_stream).post(dispatch::handle_message))
		.route("/sse/{namespace}", get(sse::namespaced_stream))
		.route("/message", post(dispatch::handle_message))
		.route("/debug/events", get(debug_events))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

#[derive(Deserialize)]
struct DebugEventsQuery {
	limit: Option<usize>,
}

/// Read-only introspection over the manifest registry's event history.
/// Not part of the wire protocol proper; handy for operators watching
/// hot-reload and health-check churn without tailing logs.
async fn debug_events(State(state): State<AppState>, Query(query): Query<DebugEventsQuery>) -> Json<serde_json::Value> {
	let limit = query.limit.unwrap_or(20);
	let history = state.manifest.get_event_history(limit).await;
	let last = state.manifest.get_last_event().await;
	Json(serde_json::json!({"last": last, "history": history}))
}
