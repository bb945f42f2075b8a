// SSE transport: `GET /sse` and `GET /sse/{namespace}`. Emits a single
// `endpoint` event naming the message-posting URI, then a `heartbeat` event
// every 30 seconds for the life of the connection. Grounded on
// `server.py`'s `sse_endpoint` for the event sequence, and on
// kota-db's streamable-HTTP handler for the axum 0.8 `Sse`/`Event`/
// `futures::stream::unfold` shape.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream};

use super::namespace::{is_known, resolve_namespace};
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

pub async fn default_stream(State(state): State<AppState>, headers: HeaderMap) -> Response {
	stream_for(state, headers, None).await
}

pub async fn namespaced_stream(State(state): State<AppState>, headers: HeaderMap, Path(namespace): Path<String>) -> Response {
	stream_for(state, headers, Some(namespace)).await
}

async fn stream_for(state: AppState, headers: HeaderMap, path_namespace: Option<String>) -> Response {
	let namespace = resolve_namespace(path_namespace, &headers);

	if let Some(name) = &namespace {
		if !is_known(&state.pool.config(), name) {
			return StatusCode::NOT_FOUND.into_response();
		}
	}

	let stream = endpoint_then_heartbeats(namespace);
	Sse::new(stream).into_response()
}

#[derive(Clone)]
enum StreamState {
	Endpoint(Option<String>),
	Heartbeat,
}

fn endpoint_then_heartbeats(namespace: Option<String>) -> impl Stream<Item = Result<Event, Infallible>> {
	stream::unfold(StreamState::Endpoint(namespace), |state| async move {
		match state {
			StreamState::Endpoint(namespace) => {
				let mut data = serde_json::json!({"uri": "/message"});
				if let Some(namespace) = namespace {
					data["namespace"] = serde_json::Value::String(namespace);
				}
				let event = Event::default().event("endpoint").data(data.to_string());
				Some((Ok(event), StreamState::Heartbeat))
			},
			StreamState::Heartbeat => {
				tokio::time::sleep(HEARTBEAT_INTERVAL).await;
				let event = Event::default().event("heartbeat").data("{}");
				Some((Ok(event), StreamState::Heartbeat))
			},
		}
	})
}
