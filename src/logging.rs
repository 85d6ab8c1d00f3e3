//! tracing-subscriber setup. The browser owns the terminal, so it logs to a file;
//! batch runs log to stderr.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Where log lines go.
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
}

/// Filter from `RUST_LOG` when set, else `debug` or `info`.
pub fn env_filter(debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(target: LogTarget<'_>, debug: bool) -> Result<()> {
    let filter = env_filter(debug);
    match target {
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eyre!("Cannot open log file {}: {}", path.display(), e))?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_target(true)
                        .with_ansi(false)
                        .with_filter(filter),
                )
                .try_init()?;
            info!(path = %path.display(), "logging to file");
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_filter(filter),
                )
                .try_init()?;
        }
    }
    Ok(())
}
