//! # Configuration
//!
//! [`RegcmdConfig`] is the serializable part of the configuration, layered
//! from defaults, an optional file and `REGCMD_*` environment variables.
//! [`ListenOptions`] is the runtime overlay handed to the execution
//! controller: defaults first, then each `with_*` call, later calls winning.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::context::{background_factory, timeout_factory, CancelContext, ContextFactory};
use crate::error::{ConfigError, ConfigResult, ListenError, ListenResult};
use crate::logging::{Logger, DEFAULT_LOG_PREFIX};

/// Environment variable prefix, e.g. `REGCMD_POOL_SIZE=4`
pub const ENV_PREFIX: &str = "REGCMD";

/// Largest accepted pool size: the drain at end of input acquires every slot
/// in one `u32` request, and the semaphore caps its own permit count
pub const MAX_POOL_SIZE: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
    Semaphore::MAX_PERMITS
} else {
    u32::MAX as usize
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegcmdConfig {
    /// Maximum number of handler chains running at once
    pub pool_size: usize,
    /// Prefix of the default stdout sink
    pub log_prefix: String,
    /// Deadline given to every execution context, if any
    pub handler_timeout_ms: Option<u64>,
}

impl Default for RegcmdConfig {
    fn default() -> Self {
        Self {
            pool_size: 1,
            log_prefix: DEFAULT_LOG_PREFIX.to_string(),
            handler_timeout_ms: None,
        }
    }
}

impl RegcmdConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("pool_size", defaults.pool_size as i64)?
            .set_default("log_prefix", defaults.log_prefix)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Environment only
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid(
                "pool_size must be a positive integer".to_string(),
            ));
        }
        if self.pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::Invalid(format!(
                "pool_size {} exceeds the maximum of {MAX_POOL_SIZE}",
                self.pool_size
            )));
        }
        if self.handler_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "handler_timeout_ms cannot be zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }
}

/// Options for [`ExecutionController`](crate::ExecutionController)
#[derive(Clone)]
pub struct ListenOptions {
    pool_size: usize,
    logger: Logger,
    context_factory: ContextFactory,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            pool_size: 1,
            logger: Logger::default(),
            context_factory: background_factory(),
        }
    }
}

impl ListenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RegcmdConfig) -> Self {
        let options = Self::default()
            .with_pool_size(config.pool_size)
            .with_logger(Logger::stdout(config.log_prefix.clone()));
        match config.handler_timeout() {
            Some(timeout) => Self {
                context_factory: timeout_factory(timeout),
                ..options
            },
            None => options,
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_logger_fn<F>(self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.with_logger(Logger::new(sink))
    }

    pub fn with_context_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> CancelContext + Send + Sync + 'static,
    {
        self.context_factory = Arc::new(factory);
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn context_factory(&self) -> &ContextFactory {
        &self.context_factory
    }

    pub fn validate(&self) -> ListenResult<()> {
        if self.pool_size == 0 {
            return Err(ListenError::Configuration(
                "pool size must be a positive integer".to_string(),
            ));
        }
        if self.pool_size > MAX_POOL_SIZE {
            return Err(ListenError::Configuration(format!(
                "pool size {} exceeds the maximum of {MAX_POOL_SIZE}",
                self.pool_size
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ListenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenOptions")
            .field("pool_size", &self.pool_size)
            .field("logger", &self.logger)
            .field("context_factory", &"<Arc<dyn Fn() -> CancelContext>>")
            .finish()
    }
}
