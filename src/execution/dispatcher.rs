//! # Dispatch Matcher
//!
//! Matches one input line against the registry and runs the winning
//! handler chain. Matching is strictly first-registered-wins among the
//! commands whose token count equals the line's; there is no specificity
//! scoring.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::context::{ContextFactory, ExecutionContext};
use crate::logging::Logger;
use crate::registry::CommandRegistry;

/// Result of dispatching one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A command matched and its chain ran
    Executed {
        description: String,
        handlers_run: usize,
        aborted: bool,
    },
    /// The keyword is known but no variant matched the line
    DispatchMiss { keyword: String },
    /// The first token is not a registered keyword
    UnknownKeyword { input: String },
}

impl Outcome {
    /// User-facing text, `None` when the chain ran
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Executed { .. } => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Executed { .. } => Ok(()),
            Outcome::DispatchMiss { keyword } => {
                write!(f, "Type <{keyword} help> for more help")
            }
            Outcome::UnknownKeyword { input } => {
                write!(f, "Invalid command: {input} **Type <help> for commands help")
            }
        }
    }
}

/// Matches lines against a registry and runs handler chains
#[derive(Clone)]
pub struct Dispatcher {
    registry: CommandRegistry,
    logger: Logger,
    context_factory: ContextFactory,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, logger: Logger, context_factory: ContextFactory) -> Self {
        Self {
            registry,
            logger,
            context_factory,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, line: &str) -> Outcome {
        // The registry lock is released before any handler runs
        let Some((command, args)) = self.registry.find(line) else {
            return self.miss(line);
        };

        let mut ctx = ExecutionContext::new(line, (self.context_factory)(), self.logger.clone());
        debug!(
            invocation_id = %ctx.invocation_id(),
            command = %command.description(),
            args = ?args,
            "Dispatching line"
        );

        let mut handlers_run = 0;
        for handler in command.handlers() {
            handler.handle(&mut ctx, &args).await;
            handlers_run += 1;
            if ctx.is_aborted() {
                info!(
                    invocation_id = %ctx.invocation_id(),
                    command = %command.description(),
                    handler = %handler.name(),
                    handlers_run,
                    "Handler chain aborted"
                );
                break;
            }
        }

        Outcome::Executed {
            description: command.description().to_string(),
            handlers_run,
            aborted: ctx.is_aborted(),
        }
    }

    fn miss(&self, line: &str) -> Outcome {
        let keyword = line.split(' ').next().unwrap_or_default();
        if self.registry.has_keyword(keyword) {
            debug!(keyword = %keyword, line = %line, "No variant matched known keyword");
            Outcome::DispatchMiss {
                keyword: keyword.to_string(),
            }
        } else {
            debug!(line = %line, "Unknown keyword");
            Outcome::UnknownKeyword {
                input: line.to_string(),
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("logger", &self.logger)
            .finish()
    }
}

/// Shared dispatcher handle used by spawned tasks
pub type DispatcherRef = Arc<Dispatcher>;
