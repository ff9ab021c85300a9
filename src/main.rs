//! Command line demonstrations of waiting on concurrent units of work.

use std::convert::Infallible;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures_wait::report::{self, Stdout};
use futures_wait::stress;
use futures_wait::work::{self, WorkItem};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_DELAYS: [f64; 4] = [3.0, 2.0, 1.0, 5.0];

#[derive(Parser)]
#[command(name = "futures-wait")]
#[command(about = "Wait for the first of several concurrent units of work", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Race units with distinct delays and report which are done
    First {
        /// Delay of each unit in seconds; units are numbered from 1
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_DELAYS, allow_negative_numbers = true)]
        delays: Vec<f64>,
        /// Make the unit with this id fail instead of producing a result
        #[arg(long)]
        fail: Option<u32>,
    },
    /// Race units which all share the same delay
    Ties {
        /// Number of units
        #[arg(long, default_value_t = 9)]
        count: u32,
        /// Delay of every unit in seconds
        #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
        delay: f64,
    },
    /// Run units concurrently and wait for all of them
    Gather {
        /// Number of units
        #[arg(long, default_value_t = 2)]
        count: u32,
        /// Delay of every unit in seconds
        #[arg(long, default_value_t = 3.0, allow_negative_numbers = true)]
        delay: f64,
    },
    /// Start one OS thread per blocking unit and time joining them all
    Threads {
        /// Number of threads
        #[arg(long, default_value_t = 100_000)]
        count: usize,
        /// How long every thread blocks, in milliseconds
        #[arg(long, default_value_t = 100)]
        delay_ms: u64,
    },
}

/// The failure a unit produces when asked to with `--fail`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unit {0} was told to fail")]
struct Told(u32);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => first(DEFAULT_DELAYS.to_vec(), None).await,
        Some(Commands::First { delays, fail }) => first(delays, fail).await,
        Some(Commands::Ties { count, delay }) => ties(count, delay).await,
        Some(Commands::Gather { count, delay }) => gather(count, delay).await,
        Some(Commands::Threads { count, delay_ms }) => threads(count, delay_ms).await,
    }
}

async fn first(delays: Vec<f64>, fail: Option<u32>) -> Result<()> {
    let items = (1..).zip(delays).map(|(id, secs)| {
        WorkItem::from_secs(id, secs, move || {
            if fail == Some(id) {
                Err(Told(id))
            } else {
                Ok(format!("Result {id}"))
            }
        })
    });

    let partition = work::run_and_wait_for_first(items, Stdout).await?;
    report::summarize(&partition, &Stdout);

    for done in partition.done() {
        let value = done.result().map_err(Clone::clone)?;
        debug!(unit = done.key(), %value, "retrieved result");
    }
    // Dropping the partition aborts the units still pending.
    Ok(())
}

async fn ties(count: u32, delay: f64) -> Result<()> {
    let items =
        (1..=count).map(|id| WorkItem::from_secs(id, delay, move || Ok::<_, Infallible>(id)));

    let partition = work::run_and_wait_for_first(items, Stdout).await?;
    report::summarize(&partition, &Stdout);
    info!(
        done = partition.done().len(),
        pending = partition.pending().len(),
        "tied units partitioned"
    );
    Ok(())
}

async fn gather(count: u32, delay: f64) -> Result<()> {
    let items = (1..=count).map(|id| {
        WorkItem::from_secs(id, delay, move || Ok::<_, Infallible>(format!("Result {id}")))
    });

    let finished = work::spawn_all(items, Stdout)?.wait_all().await;
    for done in &finished {
        report::report_done(done, &Stdout);
    }
    Ok(())
}

async fn threads(count: usize, delay_ms: u64) -> Result<()> {
    let delay = Duration::from_millis(delay_ms);
    let report = tokio::task::spawn_blocking(move || stress::spawn_blocking_units(count, delay)).await??;
    println!("Total time: {:.2}s", report.elapsed.as_secs_f64());
    Ok(())
}
