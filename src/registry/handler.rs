//! Handler trait for registered commands

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ExecutionContext;

/// One link of a command's handler chain
///
/// `args` holds the captured placeholder values in order, one per capture
/// group of the phrase. Calling [`ExecutionContext::abort`] stops the chain
/// once this handler returns.
///
/// Plain closures taking `(&mut ExecutionContext, &[String])` implement this
/// trait. Handlers doing blocking work should implement it directly and move
/// that work onto `tokio::task::spawn_blocking`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut ExecutionContext, args: &[String]);

    /// Name used in diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(&mut ExecutionContext, &[String]) + Send + Sync,
{
    async fn handle(&self, ctx: &mut ExecutionContext, args: &[String]) {
        (self)(ctx, args)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Shared handle to a handler
pub type HandlerRef = Arc<dyn Handler>;

/// Wrap a closure as a [`HandlerRef`]
///
/// Going through this function lets the compiler infer the closure's
/// argument types.
pub fn handler<F>(f: F) -> HandlerRef
where
    F: Fn(&mut ExecutionContext, &[String]) + Send + Sync + 'static,
{
    Arc::new(f)
}
