#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # regcmd
//!
//! Pattern-based dispatch of text commands.
//!
//! ## Overview
//!
//! Callers register phrases such as `"show (.*)"` bound to a chain of
//! handlers. Each incoming line is matched against the registered phrases
//! with the same token count, in registration order; the first full match
//! runs its chain with the captured values. Every keyword automatically gets
//! a `"<keyword> help"` command and the registry gets one global `"help"`.
//!
//! ## Module Organization
//!
//! - [`registry`] - Phrase compilation, the command registry, help handlers
//! - [`execution`] - Dispatch matcher, line sources, bounded execution controller
//! - [`context`] - Per-line execution context and cancellation
//! - [`config`] - File/environment configuration and listen options
//! - [`logging`] - Output sink and diagnostics subscriber
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regcmd::{handler, CommandRegistry, ListenOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = CommandRegistry::new();
//! registry.register(
//!     "greet (.*)",
//!     &["name", "greets a person"],
//!     vec![handler(|ctx, args| ctx.log(&format!("hello {}", args[0])))],
//! )?;
//!
//! let summary = regcmd::listen_stdin(registry, ListenOptions::new().with_pool_size(2)).await?;
//! println!("processed {} lines", summary.dispatched);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod logging;
pub mod registry;

pub use config::{ListenOptions, RegcmdConfig};
pub use context::{CancelContext, ContextFactory, ExecutionContext};
pub use error::{ConfigError, ListenError, RegistrationError};
pub use execution::{
    listen, listen_reader, listen_stdin, Dispatcher, ExecutionController, LineSource,
    ListenSummary, Outcome, ReaderLines,
};
pub use logging::{init_logging, Logger};
pub use registry::{handler, Command, CommandRegistry, Handler, HandlerRef};
