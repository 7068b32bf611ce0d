use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "product_image_etl=info";
const VERBOSE_FILTER: &str = "product_image_etl=debug,info";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Compact terminal output. Retry and backoff lines carry the `row{index,total}`
/// span they happened in; with `verbose` each row also logs its duration on close.
pub fn init_cli_logger(verbose: bool) {
    let (filter, span_events) = if verbose {
        (env_filter(VERBOSE_FILTER), FmtSpan::CLOSE)
    } else {
        (env_filter(DEFAULT_FILTER), FmtSpan::NONE)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_span_events(span_events)
                .compact(),
        )
        .init();
}

/// Line-delimited JSON. Each event carries the current row span as a
/// `span` object, so retries can be grouped per product.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(json_layer(std::io::stdout))
        .init();
}

fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(writer)
}
