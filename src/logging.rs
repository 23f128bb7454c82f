//! Log output for one run of the bot.
//!
//! [`LogContext::install`] builds a subscriber writing to stdout and,
//! optionally, appending to a log file. It stays active while the returned
//! context is alive. Components log through the `tracing` macros.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "/var/log/ssl-bot.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

pub struct LogContext {
    file: Option<PathBuf>,
    _guard: DefaultGuard,
}

impl LogContext {
    /// Start logging. If the log file cannot be opened the context falls
    /// back to console output and says so.
    pub fn install(settings: &LogSettings) -> Self {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.level));

        let console = fmt::layer().with_target(false).with_writer(std::io::stdout);

        let mut open_error = None;
        let file_layer = settings.file.as_ref().and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Some(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                ),
                Err(e) => {
                    open_error = Some((path.clone(), e));
                    None
                }
            }
        });
        let file = if file_layer.is_some() {
            settings.file.clone()
        } else {
            None
        };

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer);
        let guard = tracing::subscriber::set_default(subscriber);

        if let Some((path, e)) = open_error {
            warn!(
                "Cannot open log file {}: {}; logging to console only",
                path.display(),
                e
            );
        }

        Self {
            file,
            _guard: guard,
        }
    }

    /// The log file actually being written, if any
    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }
}
