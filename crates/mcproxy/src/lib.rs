// mcproxy: tool-call aggregating gateway for the Model Context Protocol.
//
// This library crate holds the four core subsystems plus the manifest
// registry and configuration loading. The binary crate (`mcproxy-app`)
// wires these into an HTTP/SSE listener; nothing in here opens a socket.

pub mod aggregate;
pub mod child;
pub mod config;
pub mod manifest;
pub mod namespace;
pub mod pool;
pub mod reload;
pub mod sandbox;

pub use aggregate::{parse_prefixed_tool_name, prefix_tool_name, prefix_tools_by_server};
pub use child::{ChildError, ChildProcess, SharedChild, Tool};
pub use config::{Config, ConfigError, load_config};
pub use manifest::{Manifest, ManifestError, ManifestRegistry};
pub use namespace::{NamespaceError, NamespaceGraph};
pub use pool::SupervisorPool;
pub use reload::{HotReloadController, ReloadError, ReloadSummary};
pub use sandbox::{ExecuteResult, SandboxRunner};
