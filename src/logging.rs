//! # Logging
//!
//! Two separate concerns live here:
//!
//! - [`Logger`] is the user-facing output sink. Help text, dispatch guidance
//!   and anything a handler wants to print goes through it.
//! - [`init_logging`] installs a `tracing` subscriber for the engine's own
//!   diagnostics (registration, dispatch, pool activity).

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing_subscriber::{
    fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Prefix used by the default sink
pub const DEFAULT_LOG_PREFIX: &str = "regcmd: ";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Single-argument string consumer that receives all user-facing output
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Fn(&str) + Send + Sync>,
}

impl Logger {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Sink printing `<prefix><text>` to standard output
    pub fn stdout(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |text| println!("{prefix}{text}"))
    }

    pub fn log(&self, text: &str) {
        (self.sink)(text)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stdout(DEFAULT_LOG_PREFIX)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sink", &"<Arc<dyn Fn(&str)>>")
            .finish()
    }
}

/// Initialize diagnostics logging once per process
///
/// The filter comes from `REGCMD_LOG` when set, otherwise from the level
/// mapped to `REGCMD_ENV`. `REGCMD_LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = std::env::var("REGCMD_LOG")
            .unwrap_or_else(|_| get_log_level(&environment).to_string());
        let json = std::env::var("REGCMD_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));
        let result = if json {
            registry
                .with(
                    tracing_fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stderr)
                        .json(),
                )
                .try_init()
        } else {
            registry
                .with(
                    tracing_fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        };

        // Another subscriber may already be installed by the host process
        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized - keeping it");
        }

        tracing::debug!(environment = %environment, json, "Diagnostics logging initialized");
    });
}

fn get_environment() -> String {
    std::env::var("REGCMD_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" | "development" => "debug",
        _ => "debug",
    }
}
