// CLI surface, matching §6's flag table and `main.py`'s `argparse` setup.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "mcproxy", version, about = "MCP tool-call aggregating gateway")]
pub struct Cli {
	/// Path to the configuration file.
	#[arg(long, default_value = "mcp-servers.json")]
	pub config: PathBuf,

	/// Host to bind to.
	#[arg(long, default_value = "0.0.0.0")]
	pub host: String,

	/// Port to listen on.
	#[arg(long, default_value_t = 12009)]
	pub port: u16,

	/// Log to stdout (default: a compact syslog-style writer).
	#[arg(long)]
	pub log: bool,

	/// Disable the config-file hot-reload watcher.
	#[arg(long)]
	pub no_reload: bool,

	/// Config file poll interval, in seconds.
	#[arg(long, default_value_t = 1.0)]
	pub reload_interval: f64,
}
