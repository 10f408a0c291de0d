use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,actix_web=info,matchroom=info";

/// `MATCHROOM_LOG_FORMAT=pretty` switches to human-readable output.
const FORMAT_VAR: &str = "MATCHROOM_LOG_FORMAT";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Runs before configuration is loaded so config errors are logged too.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let pretty = std::env::var(FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("pretty"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if pretty {
        registry
            .with(fmt::layer().with_target(false).compact())
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    }
}
