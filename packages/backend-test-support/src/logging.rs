//! Tracing for test binaries, unit and integration alike.
//!
//! `TEST_LOG` wins over `RUST_LOG`; with neither set only warnings from the
//! crate under test get through and actix's own chatter is silenced.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

const QUIET: &str = "warn,actix_server=off,actix_web=error";

static INSTALLED: OnceCell<()> = OnceCell::new();

fn filter() -> EnvFilter {
    ["TEST_LOG", "RUST_LOG"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(QUIET))
}

/// Safe to call from every `ctor`; only the first call installs anything.
pub fn init() {
    INSTALLED.get_or_init(|| {
        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter())
            .with_test_writer()
            .without_time()
            .compact()
            .try_init();
    });
}
