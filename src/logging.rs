//! Logging initialisation for the mail dispatcher.

use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{Layer, filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::MailConfig;

/// Install the global subscriber for mail-dispatch logging.
///
/// Level resolution, most specific first: the `LOG_LEVEL` environment
/// variable, the configured `logging_level`, then `TRACE` for debug
/// builds and `INFO` otherwise. Events are filtered to this crate's
/// targets.
///
/// Call once at startup; embedding applications that already install a
/// subscriber should skip this and route `postrider` targets through
/// their own.
pub fn init(config: &MailConfig) {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    let configured = config
        .logging_level
        .as_deref()
        .and_then(|level| LevelFilter::from_str(level).ok());

    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| LevelFilter::from_str(level.as_str()).ok())
        .or(configured)
        .unwrap_or(default);

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("postrider")
                })),
        )
        .init();
}
