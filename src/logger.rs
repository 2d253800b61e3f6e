//! Logging setup

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "vista=info,tower_http=info";
const VERBOSE_FILTER: &str = "vista=debug,tower_http=debug";

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between the info and
/// debug defaults.
pub fn init(verbose: bool) {
	let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.init();
}
