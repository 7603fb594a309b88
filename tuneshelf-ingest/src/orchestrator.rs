//! Ingestion orchestration
//!
//! For every uploaded object two independent branches run concurrently:
//! 1. Transcode job submission (MP3 rendition)
//! 2. Metadata pipeline: fetch → extract tags → write views
//!
//! Neither branch waits on the other and they share no state. What happens to
//! a failed branch is decided by the configured [`FailurePolicy`]; nothing is
//! retried here.

use aws_lambda_events::event::s3::S3Event;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use tuneshelf_common::config::{FailurePolicy, IngestConfig};

use crate::error::{EventError, FetchError, IngestError, IngestResult, TagError, TranscodeSubmitError};
use crate::event::{source_objects, SourceObject};
use crate::store::{JobHandle, ObjectStore, TranscodeJob, Transcoder, ViewStore, CONTAINER_AUTO};
use crate::tags::{TagExtractor, TagParser};
use crate::writer::{ViewWriter, WriteReport};

/// User metadata attribute carrying the source bucket
pub const META_SOURCE_BUCKET: &str = "bucket";
/// User metadata attribute carrying the source key
pub const META_SOURCE_KEY: &str = "key";

/// Externally provided services
#[derive(Clone)]
pub struct Collaborators {
    pub objects: Arc<dyn ObjectStore>,
    pub transcoder: Arc<dyn Transcoder>,
    pub views: Arc<dyn ViewStore>,
    pub tag_parser: Arc<dyn TagParser>,
}

/// Result of the metadata branch
#[derive(Debug)]
pub enum MetadataOutcome {
    /// Views were written (possibly partially)
    Written(WriteReport),
    /// Source object could not be fetched; nothing written
    FetchFailed(FetchError),
    /// Tags unusable; nothing written
    TagFailed(TagError),
}

/// Outcome of ingesting one object
#[derive(Debug)]
pub struct ObjectReport {
    pub source: SourceObject,
    pub transcode: Result<JobHandle, TranscodeSubmitError>,
    pub metadata: MetadataOutcome,
}

impl ObjectReport {
    /// Both branches fully succeeded
    pub fn is_success(&self) -> bool {
        self.transcode.is_ok()
            && matches!(&self.metadata, MetadataOutcome::Written(report) if report.is_complete())
    }
}

/// Outcome of one notification
#[derive(Debug, Default)]
pub struct IngestReport {
    pub objects: Vec<ObjectReport>,
    /// Records that could not be decoded
    pub rejected: Vec<EventError>,
}

impl IngestReport {
    /// Objects (or undecodable records) with at least one failed stage
    pub fn failed_count(&self) -> usize {
        self.rejected.len() + self.objects.iter().filter(|o| !o.is_success()).count()
    }

    pub fn total_count(&self) -> usize {
        self.rejected.len() + self.objects.len()
    }
}

/// Top-level handler for storage notifications
#[derive(Clone)]
pub struct IngestionOrchestrator {
    objects: Arc<dyn ObjectStore>,
    transcoder: Arc<dyn Transcoder>,
    extractor: TagExtractor,
    writer: ViewWriter,
    pipeline_id: String,
    mp3_preset_id: String,
    source_url_base: String,
    policy: FailurePolicy,
}

impl IngestionOrchestrator {
    pub fn new(config: &IngestConfig, collaborators: Collaborators) -> Self {
        Self {
            objects: collaborators.objects,
            transcoder: collaborators.transcoder,
            extractor: TagExtractor::new(collaborators.tag_parser),
            writer: ViewWriter::new(collaborators.views, config.tables.clone()),
            pipeline_id: config.pipeline_id.clone(),
            mp3_preset_id: config.mp3_preset_id.clone(),
            source_url_base: config.source_url_base.clone(),
            policy: config.failure_policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Handle one storage notification
    ///
    /// Under [`FailurePolicy::LogAndDrop`] this always returns `Ok`. Under
    /// [`FailurePolicy::Propagate`] it returns [`IngestError::Failed`] once
    /// every record has been processed, if any stage of any record failed.
    pub async fn handle(&self, event: &S3Event) -> IngestResult<IngestReport> {
        let mut report = IngestReport::default();

        for decoded in source_objects(event) {
            match decoded {
                Ok(source) => report.objects.push(self.handle_object(source).await),
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable record");
                    report.rejected.push(e);
                }
            }
        }

        let failed = report.failed_count();
        let total = report.total_count();
        info!(total, failed, policy = ?self.policy, "Notification processed");

        match self.policy {
            FailurePolicy::Propagate if failed > 0 => Err(IngestError::Failed { failed, total }),
            _ => Ok(report),
        }
    }

    /// Ingest one uploaded object
    pub async fn handle_object(&self, source: SourceObject) -> ObjectReport {
        let span = info_span!("ingest", bucket = %source.bucket, key = %source.key);

        async {
            let (transcode, metadata) =
                tokio::join!(self.submit_transcode(&source), self.ingest_metadata(&source));

            ObjectReport {
                source: source.clone(),
                transcode,
                metadata,
            }
        }
        .instrument(span)
        .await
    }

    /// Job request for the MP3 rendition of `source`
    pub fn transcode_job(&self, source: &SourceObject) -> TranscodeJob {
        let user_metadata = BTreeMap::from([
            (META_SOURCE_BUCKET.to_string(), source.bucket.clone()),
            (META_SOURCE_KEY.to_string(), source.key.clone()),
        ]);

        TranscodeJob {
            pipeline_id: self.pipeline_id.clone(),
            input_key: source.key.clone(),
            input_container: CONTAINER_AUTO.to_string(),
            output_key: source.output_key(),
            preset_id: self.mp3_preset_id.clone(),
            user_metadata,
        }
    }

    async fn submit_transcode(
        &self,
        source: &SourceObject,
    ) -> Result<JobHandle, TranscodeSubmitError> {
        let job = self.transcode_job(source);
        let result = self.transcoder.create_job(&job).await;

        match &result {
            Ok(handle) => info!(job_id = %handle.id, output_key = %job.output_key, "Transcode job submitted"),
            Err(e) => warn!(error = %e, "Transcode job submission failed"),
        }
        result
    }

    async fn ingest_metadata(&self, source: &SourceObject) -> MetadataOutcome {
        let content = match self.objects.get_object(&source.bucket, &source.key).await {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Source fetch failed, no metadata written");
                return MetadataOutcome::FetchFailed(e);
            }
        };

        let url = source.source_url(&self.source_url_base);
        let track = match self.extractor.extract(content, url).await {
            Ok(track) => track,
            Err(e) => {
                warn!(error = %e, "Tag extraction failed, no metadata written");
                return MetadataOutcome::TagFailed(e);
            }
        };

        info!(
            title = %track.title,
            artist = %track.artist,
            album = %track.album,
            track_number = %track.track_number,
            "Tags extracted"
        );

        MetadataOutcome::Written(self.writer.write(&track).await)
    }
}
