//! Storage notification decoding
//!
//! Object keys arrive URL-encoded with `+` standing for a space.

use aws_lambda_events::event::s3::{S3Event, S3EventRecord};

use crate::error::EventError;

/// Suffix appended to the source key for the MP3 rendition
pub const OUTPUT_SUFFIX: &str = ".mp3";

/// Uploaded object that triggered the invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceObject {
    pub bucket: String,
    /// Decoded object key
    pub key: String,
}

impl SourceObject {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Decode one notification record
    pub fn from_record(index: usize, record: &S3EventRecord) -> Result<Self, EventError> {
        let bucket = record
            .s3
            .bucket
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(EventError::MissingBucket(index))?;
        let raw_key = record
            .s3
            .object
            .key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(EventError::MissingKey(index))?;

        Ok(Self::new(bucket, decode_key(raw_key)?))
    }

    /// Key of the transcoded rendition
    pub fn output_key(&self) -> String {
        format!("{}{}", self.key, OUTPUT_SUFFIX)
    }

    /// Deterministic locator of the transcoded rendition
    ///
    /// Whitespace in the key is escaped as `+`.
    pub fn source_url(&self, base: &str) -> String {
        let escaped: String = self
            .output_key()
            .chars()
            .map(|c| if c.is_whitespace() { '+' } else { c })
            .collect();
        format!("{}/{}/{}", base.trim_end_matches('/'), self.bucket, escaped)
    }
}

/// Decode an event object key: `+` to space, then percent-decoding
pub fn decode_key(raw: &str) -> Result<String, EventError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| EventError::KeyDecode {
            key: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Decode every record of a notification, keeping per-record failures
pub fn source_objects(event: &S3Event) -> Vec<Result<SourceObject, EventError>> {
    event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| SourceObject::from_record(index, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_with(bucket: Option<&str>, key: Option<&str>) -> S3Event {
        serde_json::from_value(json!({
            "Records": [{
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "2024-03-01T12:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": { "principalId": "EXAMPLE" },
                "requestParameters": { "sourceIPAddress": "127.0.0.1" },
                "responseElements": {},
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "upload",
                    "bucket": { "name": bucket, "ownerIdentity": { "principalId": "EXAMPLE" }, "arn": "arn:aws:s3:::b" },
                    "object": { "key": key, "size": 1024, "eTag": "0123456789abcdef", "sequencer": "0A1B2C3D4E5F678901" }
                }
            }]
        }))
        .expect("valid S3 event")
    }

    #[test]
    fn test_decode_key_plus_and_percent() {
        assert_eq!(decode_key("music/my+song.flac").unwrap(), "music/my song.flac");
        assert_eq!(decode_key("Sigur+R%C3%B3s/%C3%81g%C3%A6tis.flac").unwrap(), "Sigur Rós/Ágætis.flac");
        // An encoded plus survives as a literal plus
        assert_eq!(decode_key("a%2Bb.flac").unwrap(), "a+b.flac");
    }

    #[test]
    fn test_decode_key_rejects_invalid_utf8() {
        assert!(matches!(decode_key("bad%FF.flac"), Err(EventError::KeyDecode { .. })));
    }

    #[test]
    fn test_from_record() {
        let event = event_with(Some("b"), Some("music/song.flac"));
        let objects = source_objects(&event);

        assert_eq!(objects.len(), 1);
        let source = objects[0].as_ref().unwrap();
        assert_eq!(source, &SourceObject::new("b", "music/song.flac"));
        assert_eq!(source.output_key(), "music/song.flac.mp3");
        assert_eq!(
            source.source_url("https://s3.amazonaws.com"),
            "https://s3.amazonaws.com/b/music/song.flac.mp3"
        );
    }

    #[test]
    fn test_missing_fields() {
        let no_bucket = event_with(None, Some("k.flac"));
        assert!(matches!(
            source_objects(&no_bucket)[0],
            Err(EventError::MissingBucket(0))
        ));

        let no_key = event_with(Some("b"), None);
        assert!(matches!(source_objects(&no_key)[0], Err(EventError::MissingKey(0))));
    }

    #[test]
    fn test_source_url_escapes_whitespace() {
        let source = SourceObject::new("b", "music/my song\t2.flac");
        assert_eq!(
            source.source_url("https://s3.amazonaws.com/"),
            "https://s3.amazonaws.com/b/music/my+song+2.flac.mp3"
        );
    }
}
