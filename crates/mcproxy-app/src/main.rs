// Entry point: wires the four core subsystems from `mcproxy` into a
// listening HTTP/SSE endpoint. Grounded on `main.py`'s `main()` — parse
// args, load config, spawn children, start the watcher, serve — and on
// the teacher's `atm-daemon` binary for the signal-handling/shutdown shape.

mod cli;
mod error;
mod http;
mod logging;
mod state;
mod watcher;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mcproxy::NamespaceGraph;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use cli::Cli;
use state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init(&cli);
	mcproxy::config::load_dotenv(std::path::Path::new(".env"));

	match run(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("fatal: {e:#}");
			ExitCode::FAILURE
		},
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let config = mcproxy::load_config(&cli.config)
		.map_err(|e| anyhow::anyhow!("failed to load config '{}': {e}", cli.config.display()))?;

	let report = NamespaceGraph::new(&config).validate();
	for warning in &report.cycle_warnings {
		warn!(target: "namespace", "{warning}");
	}
	if !report.is_ok() {
		for e in &report.errors {
			error!(target: "namespace", "{e}");
		}
		anyhow::bail!("configuration failed namespace/group validation ({} error(s))", report.errors.len());
	}

	let pool = Arc::new(mcproxy::SupervisorPool::new(config));
	let manifest = Arc::new(mcproxy::ManifestRegistry::default());
	let reload = Arc::new(mcproxy::HotReloadController::new(Arc::clone(&pool)));

	info!("spawning configured child servers");
	pool.spawn_all().await;

	let dwell = pool
		.config()
		.manifests
		.startup_dwell_secs
		.map(Duration::from_secs)
		.unwrap_or(Duration::from_secs(2));
	tokio::time::sleep(dwell).await;

	if let Err(e) = manifest.fire_event("startup", serde_json::json!({})).await {
		warn!(target: "manifest", "startup event hook failed: {e}");
	}
	let all_tools = pool.all_tools().await;
	let prefixed = mcproxy::prefix_tools_by_server(&all_tools);
	manifest.build(&prefixed).await;
	info!(
		"catalogue built: {} server(s), {} tool(s)",
		all_tools.len(),
		all_tools.values().map(Vec::len).sum::<usize>()
	);

	let state = AppState::new(Arc::clone(&pool), Arc::clone(&manifest), Arc::clone(&reload));

	let watcher_handle = if cli.no_reload {
		None
	} else {
		let interval = Duration::from_secs_f64(cli.reload_interval.max(0.01));
		let config_path = cli.config.clone();
		let watcher_state = state.clone();
		Some(tokio::spawn(async move {
			watcher::run(config_path, interval, watcher_state).await;
		}))
	};

	let router = http::router(state);
	let addr = format!("{}:{}", cli.host, cli.port);
	let listener = TcpListener::bind(&addr)
		.await
		.map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
	info!("listening on {addr}");

	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(|e| anyhow::anyhow!("server error: {e}"))?;

	info!("shutting down");
	if let Some(handle) = watcher_handle {
		handle.abort();
	}
	pool.stop_all().await;

	Ok(())
}

/// Waits for Ctrl+C or SIGTERM, whichever comes first — matching §5's
/// shutdown sequence: cancel SSE streams, then stop every child.
async fn shutdown_signal() {
	let ctrl_c = async {
		tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => info!("received Ctrl+C"),
		_ = terminate => info!("received SIGTERM"),
	}
}
