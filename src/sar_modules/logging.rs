use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// Human-readable events go to stderr so they never mix with the report on
/// stdout. With `log_dir`, events are also written as JSON to a daily-rotated
/// file. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(log_dir: Option<&Path>, file_prefix: &str) {
    let file_layer = log_dir.map(|dir| {
        fmt::layer()
            .with_writer(rolling::daily(dir, format!("{file_prefix}.log")))
            .with_ansi(false)
            .json()
    });

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}
