//! Interactive demo
//!
//! Registers a few commands and dispatches lines typed on standard input.
//! Try `help`, `show help`, `show`, `show Ada` and several `sleep` lines in
//! quick succession with `--pool-size 2`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tracing::info;

use regcmd::{
    handler, init_logging, CommandRegistry, ExecutionContext, Handler, HandlerRef,
    ListenOptions, RegcmdConfig,
};

#[derive(Debug, Parser)]
#[command(name = "regcmd-demo", about = "Dispatch commands typed on stdin")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of commands running at once
    #[arg(short, long)]
    pool_size: Option<usize>,

    /// How long `sleep` sleeps, in seconds
    #[arg(long, default_value_t = 5)]
    sleep_secs: u64,
}

/// Sleeps without blocking the runtime, stopping early on cancellation
struct Sleep {
    duration: Duration,
}

#[async_trait]
impl Handler for Sleep {
    async fn handle(&self, ctx: &mut ExecutionContext, _args: &[String]) {
        let id = ctx.invocation_id();
        ctx.log(&format!("{id} starts to sleep"));
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => {
                ctx.log(&format!("{id} slept {} seconds", self.duration.as_secs()));
            }
            _ = ctx.cancelled() => {
                ctx.log(&format!("{id} woke up early"));
            }
        }
    }

    fn name(&self) -> &str {
        "sleep"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = RegcmdConfig::load(cli.config.as_deref())?;
    if let Some(pool_size) = cli.pool_size {
        config.pool_size = pool_size;
    }
    config.validate()?;

    let registry = CommandRegistry::new();
    registry.register(
        "show",
        &["say hello world"],
        vec![handler(|ctx, _| ctx.log("hello world"))],
    )?;
    registry.register(
        "show (.*)",
        &["user", "say hello to the given user name"],
        vec![handler(|ctx, args| ctx.log(&format!("hello {}", args[0])))],
    )?;
    registry.register(
        "sleep",
        &["sleep for a while"],
        vec![Arc::new(Sleep {
            duration: Duration::from_secs(cli.sleep_secs),
        }) as HandlerRef],
    )?;

    info!(pool_size = config.pool_size, "Starting regcmd demo");
    let options =
        ListenOptions::from_config(&config).with_logger_fn(|text| println!("log: {text}"));
    let summary = regcmd::listen_stdin(registry, options).await?;
    info!(
        dispatched = summary.dispatched,
        handler_panics = summary.handler_panics,
        "Standard input closed"
    );

    Ok(())
}
