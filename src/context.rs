//! # Execution Context
//!
//! [`CancelContext`] is the parent context produced by the configured
//! factory: a cancellation token plus an optional deadline. Each dispatched
//! line gets its own [`ExecutionContext`] derived from one of those, carrying
//! the abort flag, a small value store and the logger sink.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::logging::Logger;

/// Zero-argument producer of parent contexts, called once per dispatched line
pub type ContextFactory = Arc<dyn Fn() -> CancelContext + Send + Sync>;

/// Cancellation-capable parent context
#[derive(Debug, Clone, Default)]
pub struct CancelContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Context cancelled through the given token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context; cancelling the parent token cancels the child, not the reverse
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .map(|deadline| Instant::now() >= deadline)
                .unwrap_or(false)
    }

    /// Resolves once the token is cancelled or the deadline passes
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

/// Factory returning background contexts
pub fn background_factory() -> ContextFactory {
    Arc::new(CancelContext::background)
}

/// Factory returning contexts that expire `timeout` after creation
pub fn timeout_factory(timeout: Duration) -> ContextFactory {
    Arc::new(move || CancelContext::background().with_timeout(timeout))
}

/// Per-line state shared by the handlers of one chain
#[derive(Debug)]
pub struct ExecutionContext {
    invocation_id: Uuid,
    line: String,
    cancel: CancelContext,
    aborted: bool,
    values: HashMap<String, Value>,
    logger: Logger,
}

impl ExecutionContext {
    pub fn new(line: impl Into<String>, cancel: CancelContext, logger: Logger) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            line: line.into(),
            cancel,
            aborted: false,
            values: HashMap::new(),
            logger,
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// The input line that matched
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Stop the chain after the current handler returns
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Write user-facing text through the configured sink
    pub fn log(&self, text: &str) {
        self.logger.log(text)
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn cancel_context(&self) -> &CancelContext {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.cancel.deadline()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ExecutionContext {
        ExecutionContext::new("greet Ada", CancelContext::background(), Logger::new(|_| {}))
    }

    #[test]
    fn test_abort_flag() {
        let mut ctx = context();
        assert!(!ctx.is_aborted());
        ctx.abort();
        assert!(ctx.is_aborted());
    }

    #[test]
    fn test_value_store() {
        let mut ctx = context();
        ctx.set("user", "Ada");
        ctx.set("attempts", 3);

        assert_eq!(ctx.get("user"), Some(&json!("Ada")));
        assert_eq!(ctx.get("attempts"), Some(&json!(3)));
        assert_eq!(ctx.remove("user"), Some(json!("Ada")));
        assert!(ctx.get("user").is_none());
    }

    #[test]
    fn test_background_is_never_cancelled() {
        let ctx = context();
        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test]
    async fn test_token_cancellation_reaches_child() {
        let parent = CancelContext::background();
        let child = parent.child();

        parent.cancel();

        assert!(child.is_cancelled());
        child.cancelled().await;
    }

    #[tokio::test]
    async fn test_child_cancellation_does_not_reach_parent() {
        let parent = CancelContext::background();
        let child = parent.child();

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = CancelContext::background().with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_cancelled());

        ctx.cancelled().await;

        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = CancelContext::background()
            .with_deadline(now + Duration::from_secs(10))
            .with_deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_factories() {
        assert!(background_factory()().deadline().is_none());
        assert!(timeout_factory(Duration::from_secs(1))().deadline().is_some());
    }
}
