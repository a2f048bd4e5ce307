use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "JUNIT_ANNOTATE_LOG";

static INIT_LOGGER: Once = Once::new();

/// `JUNIT_ANNOTATE_LOG` wins when set; otherwise `info`, or `debug` when verbose.
pub fn log_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(directives.trim()).unwrap_or_else(|_| EnvFilter::new(default_level))
        }
        _ => EnvFilter::new(default_level),
    }
}

/// Installs the stderr subscriber. Later calls are ignored.
pub fn init_logging(verbose: bool) {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(log_filter(verbose))
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
