pub mod build_info;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Directive applied when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_DIRECTIVE: &str = "budget_forecast=info";

/// Initializes the global tracing subscriber, logging to stderr.
///
/// `RUST_LOG` wins over `log_filter`, which wins over [`DEFAULT_LOG_DIRECTIVE`].
pub fn init_tracing(log_filter: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(log_filter.unwrap_or(DEFAULT_LOG_DIRECTIVE)))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
