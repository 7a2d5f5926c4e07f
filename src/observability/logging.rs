//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; `default_level` applies to this crate
/// otherwise. Intended for binaries (the bundled CLI calls it once);
/// hosts embedding the library install their own subscriber instead.
pub fn init(default_level: &str) {
    let fallback = format!("tabfetch={}", default_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
