//! AWS Lambda entry point for the fetcher backend.
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//! Routes three HTTP operations:
//! - `POST /fetch-data` — run one fetch cycle, return its status
//! - `GET /view-data`   — return all stored user records
//! - `GET /status`      — return the last recorded fetch status

use std::sync::Arc;

use aws_config::BehaviorVersion;
use lambda_http::http::Method;
use lambda_http::{Body, Error as LambdaError, Request, Response, run, service_fn};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetcher::dlq::SqsDeadLetter;
use fetcher::events::{CloudWatchRecorder, EventRecorder};
use fetcher::models::Config;
use fetcher::service::DataFetcher;
use fetcher::storage::{DynamoTable, UsersSpec};

type Fetcher = DataFetcher<DynamoTable<UsersSpec>, SqsDeadLetter>;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env();
    config.validate()?;

    info!("Fetcher Lambda starting...");

    let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;

    let events: Arc<dyn EventRecorder> = Arc::new(
        CloudWatchRecorder::provision(aws_sdk_cloudwatchlogs::Client::new(&aws), &config.log)
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
    let fetcher = &fetcher;

    run(service_fn(move |request: Request| async move {
        route(fetcher, request).await
    }))
    .await
}

async fn route(fetcher: &Fetcher, request: Request) -> Result<Response<Body>, LambdaError> {
    let method = request.method();
    let path = request.uri().path();
    info!("Handling {method} {path}");

    match (method, path) {
        (&Method::POST, "/fetch-data") => json_response(200, &fetcher.fetch().await),
        (&Method::GET, "/view-data") => json_response(200, &fetcher.get().await),
        (&Method::GET, "/status") => json_response(200, &fetcher.status().await),
        _ => json_response(404, &serde_json::json!({ "message": "Not found" })),
    }
}

fn json_response<T: Serialize>(code: u16, body: &T) -> Result<Response<Body>, LambdaError> {
    let response = Response::builder()
        .status(code)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body)?))
        .map_err(Box::new)?;
    Ok(response)
}
