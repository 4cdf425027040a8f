use tracing::Span;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::types::Group;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.format.eq_ignore_ascii_case("json") {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

pub fn trace_refresh_cycle(group: Group) -> Span {
    tracing::info_span!(
        "refresh_cycle",
        group = %group,
    )
}

pub fn trace_stream_session(url: &str) -> Span {
    tracing::info_span!(
        "stream_session",
        url = %url,
    )
}
