//! Fetcher CLI
//!
//! Local execution entry point. For AWS Lambda, use `fetcher-lambda`.
//!
//! By default operations run against the real AWS backends; `--local`
//! swaps in in-memory backends so the fetch loop can be exercised
//! without credentials (results are printed, not persisted).

use std::path::PathBuf;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use serde::Serialize;

use fetcher::dlq::{FailureSink, MemoryDeadLetter, SqsDeadLetter};
use fetcher::error::Result;
use fetcher::events::{CloudWatchRecorder, EventRecorder, MemoryRecorder};
use fetcher::models::{Config, UserRecord};
use fetcher::service::DataFetcher;
use fetcher::storage::{DynamoTable, MemoryTable, RecordStore, UsersSpec};

/// Fetcher - randomized user ingestion backend
#[derive(Parser, Debug)]
#[command(name = "fetcher", version, about = "Pulls randomized user profiles into DynamoDB")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, default_value = "fetcher.toml")]
    config: PathBuf,

    /// Use in-memory backends instead of AWS
    #[arg(long)]
    local: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one fetch cycle and print its status
    Fetch,

    /// Print all stored user records
    View,

    /// Print the last recorded fetch status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    if cli.local {
        let events: Arc<dyn EventRecorder> = Arc::new(MemoryRecorder::new());
        let fetcher = DataFetcher::new(
            &config,
            events,
            MemoryTable::new(),
            MemoryDeadLetter::new(),
        )
        .await?;
        execute(&cli.command, &fetcher).await
    } else {
        let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let events: Arc<dyn EventRecorder> = Arc::new(
            CloudWatchRecorder::provision(
                aws_sdk_cloudwatchlogs::Client::new(&aws),
                &config.log,
            )
            .await?,
        );
        let store = DynamoTable::new(
            aws_sdk_dynamodb::Client::new(&aws),
            UsersSpec::new(&config.table_name),
            events.clone(),
        );
        let dlq = SqsDeadLetter::provision(
            aws_sdk_sqs::Client::new(&aws),
            &config.queue_name,
            events.clone(),
        )
        .await;

        let fetcher = DataFetcher::new(&config, events, store, dlq).await?;
        execute(&cli.command, &fetcher).await
    }
}

async fn execute<S, Q>(command: &Command, fetcher: &DataFetcher<S, Q>) -> Result<()>
where
    S: RecordStore<Record = UserRecord>,
    Q: FailureSink,
{
    match command {
        Command::Fetch => print_json(&fetcher.fetch().await),
        Command::View => print_json(&fetcher.get().await),
        Command::Status => print_json(&fetcher.status().await),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
