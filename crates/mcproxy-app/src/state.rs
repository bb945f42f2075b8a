// Shared application state handed to every axum handler: the live pool,
// manifest registry, hot-reload controller, and sandbox runner. Everything
// here is already internally synchronised (`ArcSwap`, `DashMap`,
// `RwLock`/`Mutex`) — this struct just bundles `Arc`s so it stays cheaply
// `Clone` for `State<AppState>` extraction. The sandbox runner sits behind
// its own `ArcSwap` so a hot-reload can swap in one built from the new
// config's `sandbox` knobs without needing a `&mut` reference shared across
// every outstanding clone of `AppState`.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use mcproxy::{HotReloadController, ManifestRegistry, SandboxRunner, SupervisorPool};

pub const SERVER_NAME: &str = "mcproxy";
pub const SERVER_VERSION: &str = "2.0.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Clone)]
pub struct AppState {
	pub pool: Arc<SupervisorPool>,
	pub manifest: Arc<ManifestRegistry>,
	pub reload: Arc<HotReloadController>,
	sandbox: Arc<ArcSwap<SandboxRunner>>,
}

fn build_sandbox_runner(pool: &SupervisorPool) -> SandboxRunner {
	let config = pool.config();
	let uv_path = config.sandbox.uv_path.clone().unwrap_or_else(|| "uv".to_string());
	let default_timeout = config
		.sandbox
		.timeout_secs
		.map(Duration::from_secs)
		.unwrap_or(mcproxy::sandbox::runner::DEFAULT_TIMEOUT);
	SandboxRunner::new(uv_path, default_timeout)
}

impl AppState {
	pub fn new(pool: Arc<SupervisorPool>, manifest: Arc<ManifestRegistry>, reload: Arc<HotReloadController>) -> Self {
		let sandbox = Arc::new(ArcSwap::new(Arc::new(build_sandbox_runner(&pool))));
		Self {
			pool,
			manifest,
			reload,
			sandbox,
		}
	}

	pub fn sandbox(&self) -> Arc<SandboxRunner> {
		self.sandbox.load_full()
	}

	/// Rebuilds the sandbox runner from the current config's `sandbox`
	/// knobs, used after a hot-reload swaps the pool's config reference.
	pub fn refresh_sandbox(&self) {
		self.sandbox.store(Arc::new(build_sandbox_runner(&self.pool)));
	}
}
