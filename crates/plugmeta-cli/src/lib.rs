//! plugmeta: plugin descriptor generation from the command line
//!
//! This library exposes the command handlers so they can be tested without
//! spawning the binary.

pub mod commands;
pub mod common;
pub mod discovery;

pub use common::GlobalOpts;
pub use plugmeta_logger as logger;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the `tracing` subscriber used by the library crates
///
/// `RUST_LOG` wins over the verbosity flags when set. Output goes to stderr so
/// `show` can print descriptors on stdout.
pub fn init_logging(verbosity: u8) {
    let fallback = match verbosity {
        0 => "plugmeta=warn",
        1 => "plugmeta=debug",
        _ => "plugmeta=trace",
    };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
