//! Log output on stderr using tracing.
//!
//! `RUST_LOG` selects what is logged; each `-v` raises the default level.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Filter directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "info,adquery_ldap=debug,adquery_core=debug",
        _ => "trace",
    }
}

/// Initialize the tracing subscriber.
///
/// An explicit `-v` wins over `RUST_LOG`.
pub fn init_logging(verbosity: u8, format: LogFormat) {
    let directive = default_directive(verbosity);
    let filter = if verbosity > 0 {
        EnvFilter::try_new(directive)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directive))
    };
    let filter_layer = match filter {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Invalid log filter, falling back to 'info': {e}");
            EnvFilter::new("info")
        }
    };

    let (json_layer, pretty_layer) = match format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .flatten_event(true),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(fmt::layer().with_writer(std::io::stderr).with_target(false)),
        ),
    };

    // `Option<Layer>` is a no-op when `None`.
    let _ = tracing_subscriber::registry()
        .with(json_layer)
        .with(pretty_layer)
        .with(filter_layer)
        .try_init();
}
