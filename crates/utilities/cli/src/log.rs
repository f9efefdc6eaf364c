//! Tracing subscriber setup.

use crate::TracingError;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Maps a `-v` count to the default log level.
pub const fn verbosity_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs a global `fmt` subscriber.
///
/// Without an explicit `filter`, the level derived from `verbosity` is the default directive
/// and `RUST_LOG` directives are applied on top of it.
pub fn init_tracing_subscriber(
    verbosity: u8,
    filter: Option<EnvFilter>,
) -> Result<(), TracingError> {
    let filter = match filter {
        Some(filter) => filter,
        None => EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(verbosity_level(verbosity)).into())
            .from_env()?,
    };

    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).try_init()?;
    Ok(())
}
