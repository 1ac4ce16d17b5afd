use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::types::LogLevel;

pub const LOG_ENV: &str = "DUMPSCOPE_LOG";

/// Install the stderr subscriber. `DUMPSCOPE_LOG` takes precedence over
/// `--log-level` and accepts full `EnvFilter` directives.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "dumpscope={level},dumpscope_runtime={level},dumpscope_engine={level}"
        ))
    });

    // A second init (tests driving `run` in-process) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
