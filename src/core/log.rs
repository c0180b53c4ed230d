use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = "metalrates";

/// Level for the application's own events. Degraded fetches are always reported.
fn app_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Logs go to stderr so `rates --json` keeps stdout machine readable.
/// `RUST_LOG` can narrow the application's events further.
pub fn init_logging(verbose: bool) {
    let app_filter = Targets::new().with_target(APP_TARGET, app_level(verbose));
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{APP_TARGET}={}", app_level(verbose))));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        )
        .with(app_filter)
        .with(env_filter)
        .init();
}
