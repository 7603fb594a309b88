//! Tag extraction against real audio files
//!
//! Fixtures are short WAV files written with hound and tagged with lofty.

mod helpers;

use helpers::*;
use serde_json::json;
use tuneshelf_ingest::error::TagError;
use tuneshelf_ingest::orchestrator::MetadataOutcome;
use tuneshelf_ingest::tags::{LoftyTagParser, TagExtractor, TagParser};

#[test]
fn test_lofty_reads_id3_tags() {
    let content = wav_file(Some(id3_tag("Hey Jude", "The Beatles", "1", Some((7, None)))));

    let tags = LoftyTagParser.parse(&content).expect("tags should parse");

    assert_eq!(tags.title, "Hey Jude");
    assert_eq!(tags.artists, vec!["The Beatles".to_string()]);
    assert_eq!(tags.album, "1");
    assert_eq!(tags.track_no.as_deref(), Some("7"));
}

#[test]
fn test_untagged_audio_parses_without_fields() {
    let content = wav_file(None);

    let tags = LoftyTagParser.parse(&content).expect("plain WAV should parse");

    assert!(tags.title.is_empty());
    assert!(tags.artists.is_empty());
    assert!(tags.track_no.is_none());
}

#[tokio::test]
async fn test_multi_disc_numbering_keeps_first_number() {
    let content = wav_file(Some(id3_tag("Octopus's Garden", "The Beatles", "Abbey Road", Some((3, Some(12))))));

    let track = TagExtractor::default()
        .extract(content, "url".to_string())
        .await
        .unwrap();

    assert_eq!(track.track_number, "3");
    assert_eq!(track.title, "octopussgarden");
    assert_eq!(track.album, "abbeyroad");
}

#[tokio::test]
async fn test_untagged_audio_has_no_track_number() {
    let result = TagExtractor::default()
        .extract(wav_file(None), "url".to_string())
        .await;

    assert!(matches!(result, Err(TagError::NoTrackNumber)));
}

#[tokio::test]
async fn test_pipeline_with_real_audio() {
    let harness = Harness::new();
    harness.upload_raw(
        "b",
        "uploads/hey jude.wav",
        wav_file(Some(id3_tag("Hey Jude", "The Beatles", "1", Some((7, None))))),
    );
    harness.upload_raw("b", "uploads/untagged.wav", wav_file(None));

    let report = harness
        .lofty_orchestrator()
        .handle(&s3_event("b", &["uploads/hey+jude.wav", "uploads/untagged.wav"]))
        .await
        .unwrap();

    assert!(report.objects[0].is_success());
    assert!(matches!(
        report.objects[1].metadata,
        MetadataOutcome::TagFailed(TagError::NoTrackNumber)
    ));

    let track = harness.item(TRACK_TABLE, json!({"title": "heyjude"})).unwrap();
    assert_eq!(track["artist"], "beatles");
    assert_eq!(track["track_number"], "7");
    assert_eq!(track["url"], "https://s3.amazonaws.com/b/uploads/hey+jude.wav.mp3");

    assert_eq!(harness.views.items(TRACK_TABLE).len(), 1);
    assert_eq!(harness.transcoder.jobs().len(), 2);
}
