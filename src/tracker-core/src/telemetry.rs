use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::LogLevel;

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over `log_level`.
///
/// Calling this more than once is a no-op.
pub fn init_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_ref()));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
