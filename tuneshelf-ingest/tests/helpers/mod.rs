//! Shared test fixtures: in-memory collaborators, notification builder and
//! tagged audio files.

#![allow(dead_code)]

use hound::{SampleFormat, WavSpec, WavWriter};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::id3::v2::Id3v2Tag;
use lofty::tag::Accessor;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use aws_lambda_events::event::s3::S3Event;
use tuneshelf_common::config::{FailurePolicy, IngestConfig, LoggingConfig, ViewTables};
use tuneshelf_ingest::error::TagError;
use tuneshelf_ingest::memory::{MemoryObjectStore, MemoryViewStore, RecordingTranscoder};
use tuneshelf_ingest::orchestrator::Collaborators;
use tuneshelf_ingest::tags::{LoftyTagParser, RawTags, TagParser};
use tuneshelf_ingest::IngestionOrchestrator;

pub const TRACK_TABLE: &str = "music-tracks";
pub const ALBUM_TABLE: &str = "music-albums";
pub const ARTIST_TABLE: &str = "music-artists";

/// Tag parser returning canned tags per object content
#[derive(Default)]
pub struct FixtureTagParser {
    fixtures: Mutex<HashMap<Vec<u8>, RawTags>>,
}

impl FixtureTagParser {
    pub fn register(&self, content: &[u8], tags: RawTags) {
        self.fixtures.lock().unwrap().insert(content.to_vec(), tags);
    }
}

impl TagParser for FixtureTagParser {
    fn parse(&self, content: &[u8]) -> Result<RawTags, TagError> {
        self.fixtures
            .lock()
            .unwrap()
            .get(content)
            .cloned()
            .ok_or_else(|| TagError::ParseFailure("not an audio stream".to_string()))
    }
}

pub fn raw_tags(title: &str, artists: &[&str], album: &str, track_no: Option<&str>) -> RawTags {
    RawTags {
        title: title.to_string(),
        artists: artists.iter().map(|a| a.to_string()).collect(),
        album: album.to_string(),
        track_no: track_no.map(str::to_string),
    }
}

/// Configuration pointing at the test tables
pub fn test_config(policy: FailurePolicy) -> IngestConfig {
    IngestConfig {
        pipeline_id: "1111111111111-abcde1".to_string(),
        mp3_preset_id: "1351620000001-300040".to_string(),
        tables: ViewTables {
            track: TRACK_TABLE.to_string(),
            album: ALBUM_TABLE.to_string(),
            artist: ARTIST_TABLE.to_string(),
        },
        source_url_base: "https://s3.amazonaws.com".to_string(),
        failure_policy: policy,
        logging: LoggingConfig::default(),
    }
}

/// In-memory collaborators wired into an orchestrator
pub struct Harness {
    pub objects: Arc<MemoryObjectStore>,
    pub transcoder: Arc<RecordingTranscoder>,
    pub views: Arc<MemoryViewStore>,
    pub fixtures: Arc<FixtureTagParser>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(MemoryObjectStore::new()),
            transcoder: Arc::new(RecordingTranscoder::new()),
            views: Arc::new(
                MemoryViewStore::new()
                    .with_table(TRACK_TABLE, &["title"])
                    .with_table(ALBUM_TABLE, &["album", "artist"])
                    .with_table(ARTIST_TABLE, &["artist", "title"]),
            ),
            fixtures: Arc::new(FixtureTagParser::default()),
        }
    }

    /// Orchestrator using canned tags
    pub fn orchestrator(&self, policy: FailurePolicy) -> IngestionOrchestrator {
        self.orchestrator_with_parser(policy, self.fixtures.clone())
    }

    /// Orchestrator parsing real audio with lofty
    pub fn lofty_orchestrator(&self) -> IngestionOrchestrator {
        self.orchestrator_with_parser(FailurePolicy::LogAndDrop, Arc::new(LoftyTagParser))
    }

    fn orchestrator_with_parser(
        &self,
        policy: FailurePolicy,
        tag_parser: Arc<dyn TagParser>,
    ) -> IngestionOrchestrator {
        IngestionOrchestrator::new(
            &test_config(policy),
            Collaborators {
                objects: self.objects.clone(),
                transcoder: self.transcoder.clone(),
                views: self.views.clone(),
                tag_parser,
            },
        )
    }

    /// Store an object whose tags the fixture parser knows
    pub fn upload(&self, bucket: &str, key: &str, tags: RawTags) {
        let content = format!("audio:{bucket}/{key}").into_bytes();
        self.fixtures.register(&content, tags);
        self.objects.insert(bucket, key, content);
    }

    /// Store an object with arbitrary content
    pub fn upload_raw(&self, bucket: &str, key: &str, content: impl Into<Vec<u8>>) {
        self.objects.insert(bucket, key, content);
    }

    pub fn item(&self, table: &str, key: serde_json::Value) -> Option<serde_json::Map<String, serde_json::Value>> {
        self.views.get(table, key.as_object().expect("key must be an object"))
    }
}

/// "Object created" notification for `bucket` with one record per key
///
/// Keys are given as they appear on the wire (URL-encoded, `+` for space).
pub fn s3_event(bucket: &str, encoded_keys: &[&str]) -> S3Event {
    let records: Vec<_> = encoded_keys
        .iter()
        .map(|key| {
            json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "2024-03-01T12:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": { "principalId": "EXAMPLE" },
                "requestParameters": { "sourceIPAddress": "127.0.0.1" },
                "responseElements": {
                    "x-amz-request-id": "EXAMPLE123456789",
                    "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
                },
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "audio-upload",
                    "bucket": {
                        "name": bucket,
                        "ownerIdentity": { "principalId": "EXAMPLE" },
                        "arn": format!("arn:aws:s3:::{bucket}")
                    },
                    "object": {
                        "key": key,
                        "size": 1024,
                        "eTag": "0123456789abcdef0123456789abcdef",
                        "sequencer": "0A1B2C3D4E5F678901"
                    }
                }
            })
        })
        .collect();

    serde_json::from_value(json!({ "Records": records })).expect("valid S3 event")
}

/// Short mono WAV file, optionally carrying an ID3v2 tag
pub fn wav_file(tag: Option<Id3v2Tag>) -> Vec<u8> {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("fixture.wav");

    let spec = WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).expect("Failed to create WAV");
    for i in 0..4000 {
        let t = i as f32 / spec.sample_rate as f32;
        let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
        writer.write_sample((sample * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();

    if let Some(tag) = tag {
        let mut tagged_file = lofty::probe::Probe::open(&path).unwrap().read().unwrap();
        tagged_file.insert_tag(tag.into());
        tagged_file
            .save_to_path(&path, WriteOptions::default())
            .expect("Failed to write tags");
    }

    std::fs::read(&path).expect("Failed to read WAV")
}

/// ID3v2 tag with the common fields set
pub fn id3_tag(title: &str, artist: &str, album: &str, track: Option<(u32, Option<u32>)>) -> Id3v2Tag {
    let mut tag = Id3v2Tag::default();
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    tag.set_album(album.to_string());
    if let Some((number, total)) = track {
        tag.set_track(number);
        if let Some(total) = total {
            tag.set_track_total(total);
        }
    }
    tag
}
