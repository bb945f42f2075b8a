// Logging setup. Grounded on `logging_config.py`'s `setup_logging`:
// `--log` selects a human-readable stdout writer; its absence selects a
// compact structured writer suited to syslog-style collection. Both honor
// `RUST_LOG` via `EnvFilter`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn init(cli: &Cli) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	if cli.log {
		tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_target(true)
			.init();
	} else {
		tracing_subscriber::fmt()
			.json()
			.with_env_filter(filter)
			.with_target(true)
			.with_current_span(false)
			.init();
	}
}
