//! # thimble-logging
//!
//! Logging for the thimble message board.
//!
//! Diagnostics go through `tracing`; user-facing progress (pages written,
//! messages saved, commits, sync results) goes through [`Logger`].
//!
//! ## Key Types
//!
//! - [`Logger`] - Board event output
//! - [`BoardEvent`] - Event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)

mod events;

pub use events::{BoardEvent, LogFormat, Logger, PageKind};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
