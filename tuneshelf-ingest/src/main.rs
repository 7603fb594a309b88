//! tuneshelf-ingest - Audio upload ingestion function
//!
//! Invoked by S3 "object created" notifications. For every uploaded file it
//! submits an MP3 transcode job and writes the file's tags into the track,
//! album and artist views.
//!
//! Configuration comes from the environment (see `tuneshelf_common::config`).

use anyhow::{Context, Result};
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{service_fn, LambdaEvent};
use std::sync::Arc;
use tracing::info;
use tuneshelf_common::config::IngestConfig;
use tuneshelf_ingest::aws::{DynamoViewStore, ElasticTranscoder, S3ObjectStore};
use tuneshelf_ingest::orchestrator::Collaborators;
use tuneshelf_ingest::tags::LoftyTagParser;
use tuneshelf_ingest::IngestionOrchestrator;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let orchestrator = Arc::new(build_orchestrator().await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<S3Event>| {
        let orchestrator = Arc::clone(&orchestrator);
        async move {
            info!(
                request_id = %event.context.request_id,
                records = event.payload.records.len(),
                "Received storage notification"
            );
            orchestrator.handle(&event.payload).await?;
            Ok::<(), lambda_runtime::Error>(())
        }
    }))
    .await
}

/// Resolve configuration, initialize logging and construct the clients
async fn build_orchestrator() -> Result<IngestionOrchestrator> {
    let config = IngestConfig::from_env().context("Failed to load configuration")?;
    tuneshelf_common::logging::init(&config.logging)?;

    info!("Starting tuneshelf-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        pipeline_id = %config.pipeline_id,
        track_table = %config.tables.track,
        album_table = %config.tables.album,
        artist_table = %config.tables.artist,
        policy = ?config.failure_policy,
        "Configuration loaded"
    );

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let collaborators = Collaborators {
        objects: Arc::new(S3ObjectStore::new(&sdk_config)),
        transcoder: Arc::new(ElasticTranscoder::new(&sdk_config)),
        views: Arc::new(DynamoViewStore::new(&sdk_config)),
        tag_parser: Arc::new(LoftyTagParser),
    };

    Ok(IngestionOrchestrator::new(&config, collaborators))
}
