use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for the relay server.
pub const SERVER_FILTER: &str = "info,weather_chat=debug,tower_http=info";

/// Default filter for the terminal client, which shares stdout with the chat.
pub const CLI_FILTER: &str = "warn";

/// Initialize structured logging.
///
/// `RUST_LOG` overrides `default_filter` when set. With `json` enabled every
/// event is emitted as one JSON object per line.
pub fn init(default_filter: &str, json: bool) {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter_layer);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}
