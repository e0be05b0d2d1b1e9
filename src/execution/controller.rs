//! # Execution Controller
//!
//! Turns a stream of lines into concurrently running, backpressured
//! dispatches.
//!
//! ```text
//! line source → [Semaphore] → tokio::spawn(dispatch) → logger sink
//!                    │
//!                    └─→ reader blocks while all N slots are taken
//! ```
//!
//! Each spawned task owns its permit, so the slot is released however the
//! task ends, including a panicking handler. Lines are read in arrival order
//! but may finish out of order when the pool holds more than one slot.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::io::{AsyncRead, BufReader};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::dispatcher::{Dispatcher, DispatcherRef};
use super::source::{LineSource, ReaderLines};
use crate::config::ListenOptions;
use crate::error::{ListenError, ListenResult};
use crate::logging::Logger;
use crate::registry::CommandRegistry;

/// Totals for one `listen` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenSummary {
    pub lines_read: u64,
    pub empty_lines_skipped: u64,
    pub dispatched: u64,
    pub handler_panics: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Bounded-concurrency driver for a [`Dispatcher`]
pub struct ExecutionController {
    dispatcher: DispatcherRef,
    logger: Logger,
    slots: Arc<Semaphore>,
    capacity: usize,
    handler_panics: Arc<AtomicU64>,
}

impl ExecutionController {
    pub fn new(registry: CommandRegistry, options: ListenOptions) -> ListenResult<Self> {
        options.validate()?;
        let dispatcher = Dispatcher::new(
            registry,
            options.logger().clone(),
            options.context_factory().clone(),
        );

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            logger: options.logger().clone(),
            slots: Arc::new(Semaphore::new(options.pool_size())),
            capacity: options.pool_size(),
            handler_panics: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn dispatcher(&self) -> &DispatcherRef {
        &self.dispatcher
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Handler chains currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.capacity.saturating_sub(self.slots.available_permits())
    }

    /// Read `source` until it is exhausted, then wait for in-flight chains
    pub async fn listen<S: LineSource>(&self, mut source: S) -> ListenResult<ListenSummary> {
        let started_at = Utc::now();
        let panics_before = self.handler_panics.load(Ordering::Relaxed);
        let mut lines_read = 0u64;
        let mut empty_lines_skipped = 0u64;
        let mut dispatched = 0u64;

        info!(capacity = self.capacity, "Listening for commands");

        let mut read_error = None;
        loop {
            let line = match source.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    // In-flight chains still get drained before the error is returned
                    error!(error = %e, lines_read, "Failed to read from line source");
                    read_error = Some(e);
                    break;
                }
            };
            lines_read += 1;
            if line.is_empty() {
                empty_lines_skipped += 1;
                continue;
            }

            // Backpressure: the reader waits here while every slot is busy
            let permit = self
                .slots
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| ListenError::PoolClosed)?;

            let dispatcher = self.dispatcher.clone();
            let logger = self.logger.clone();
            let handler_panics = self.handler_panics.clone();
            dispatched += 1;

            tokio::spawn(async move {
                let _permit = permit;
                match AssertUnwindSafe(dispatcher.dispatch(&line))
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => {
                        if let Some(message) = outcome.message() {
                            logger.log(&message);
                        }
                    }
                    Err(panic_error) => {
                        handler_panics.fetch_add(1, Ordering::Relaxed);
                        error!(
                            line = %line,
                            panic_msg = %panic_message(panic_error.as_ref()),
                            "Handler panicked"
                        );
                    }
                }
            });
        }

        debug!(in_flight = self.in_flight(), "Line source finished, draining");
        let all_slots = u32::try_from(self.capacity).map_err(|_| {
            ListenError::Configuration(format!(
                "pool size {} cannot be drained in one request",
                self.capacity
            ))
        })?;
        let _drained = self
            .slots
            .acquire_many(all_slots)
            .await
            .map_err(|_| ListenError::PoolClosed)?;

        if let Some(e) = read_error {
            return Err(ListenError::Io(e));
        }

        let summary = ListenSummary {
            lines_read,
            empty_lines_skipped,
            dispatched,
            handler_panics: self.handler_panics.load(Ordering::Relaxed) - panics_before,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            lines_read = summary.lines_read,
            dispatched = summary.dispatched,
            handler_panics = summary.handler_panics,
            "Line source finished"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for ExecutionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionController")
            .field("capacity", &self.capacity)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

fn panic_message(panic_error: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_error.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_error.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Listen on any line source
pub async fn listen<S: LineSource>(
    registry: CommandRegistry,
    source: S,
    options: ListenOptions,
) -> ListenResult<ListenSummary> {
    ExecutionController::new(registry, options)?
        .listen(source)
        .await
}

/// Listen on an async reader, one command per line
pub async fn listen_reader<R>(
    registry: CommandRegistry,
    reader: R,
    options: ListenOptions,
) -> ListenResult<ListenSummary>
where
    R: AsyncRead + Unpin + Send,
{
    listen(registry, ReaderLines::new(BufReader::new(reader)), options).await
}

/// Listen on standard input
pub async fn listen_stdin(
    registry: CommandRegistry,
    options: ListenOptions,
) -> ListenResult<ListenSummary> {
    listen_reader(registry, tokio::io::stdin(), options).await
}
