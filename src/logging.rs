//! Logging setup for the `mcpaint` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary. Output goes to stderr, as text or JSON lines, plus an optional
//! plain-text log file.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Format of the stderr log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line, so it can share stderr with JSON progress
    Json,
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Build the level filter: `RUST_LOG` wins over the verbosity flag.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)))
}

/// Install the global tracing subscriber.
///
/// Returns an error if the log file cannot be opened. Calling this twice is
/// harmless; the second subscriber is ignored.
pub fn init_logging(
    verbose: bool,
    format: LogFormat,
    log_file: Option<&Path>,
) -> std::io::Result<()> {
    let (text_layer, json_layer) = match format {
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .with_ansi(atty::is(atty::Stream::Stderr));
            (Some(layer), None)
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(false);
            (None, Some(layer))
        }
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(text_layer)
        .with(json_layer);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let file_layer = fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            let _ = subscriber.with(file_layer).try_init();
        }
        None => {
            let _ = subscriber.try_init();
        }
    }

    Ok(())
}
