//! Tracing subscriber bootstrap for the desktop binary.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "timeline_planner=info";

static INIT: OnceLock<()> = OnceLock::new();

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; only the first call has an effect and a
/// subscriber installed elsewhere is left alone.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let installed = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok();
        if installed {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging initialised");
        }
    });
}
