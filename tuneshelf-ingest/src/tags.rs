//! Audio tag extraction
//!
//! Reads embedded tags from the full object content and turns them into
//! [`TrackMetadata`]. Tag parsing is delegated to a [`TagParser`]; the
//! production parser uses lofty.
//!
//! Extracted:
//! - Title, album
//! - Ordered contributor list (first = primary artist)
//! - Track number (first run of digits of the raw track field)

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey};
use std::io::Cursor;
use std::sync::Arc;
use tuneshelf_common::models::TrackMetadata;

use crate::error::TagError;

/// Tag fields as embedded in the file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
    pub title: String,
    /// Contributors in tag order, possibly empty
    pub artists: Vec<String>,
    pub album: String,
    /// Raw track field (e.g. "7", "03", "3/12")
    pub track_no: Option<String>,
}

/// Tag-parsing capability
pub trait TagParser: Send + Sync {
    /// Parse tags from the complete file content
    fn parse(&self, content: &[u8]) -> Result<RawTags, TagError>;
}

/// Tag parser backed by lofty
///
/// The file type is guessed from content, so the object key's extension does
/// not matter.
#[derive(Debug, Default)]
pub struct LoftyTagParser;

impl TagParser for LoftyTagParser {
    fn parse(&self, content: &[u8]) -> Result<RawTags, TagError> {
        let tagged_file = Probe::new(Cursor::new(content))
            .guess_file_type()
            .map_err(|e| TagError::ParseFailure(e.to_string()))?
            .read()
            .map_err(|e| TagError::ParseFailure(e.to_string()))?;

        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            tracing::debug!(file_type = ?tagged_file.file_type(), "No tags found");
            return Ok(RawTags::default());
        };

        let mut artists: Vec<String> = tag
            .get_strings(&ItemKey::TrackArtist)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        if artists.is_empty() {
            artists.extend(tag.artist().map(|a| a.to_string()));
        }

        let track_no = tag
            .get_string(&ItemKey::TrackNumber)
            .map(str::to_string)
            .or_else(|| tag.track().map(|n| n.to_string()));

        Ok(RawTags {
            title: tag.title().map(|t| t.to_string()).unwrap_or_default(),
            artists,
            album: tag.album().map(|a| a.to_string()).unwrap_or_default(),
            track_no,
        })
    }
}

/// First run of ASCII digits in `field`
///
/// "3/12" yields "3"; multi-disc totals are deliberately dropped.
pub fn first_digit_run(field: &str) -> Option<&str> {
    let start = field.find(|c: char| c.is_ascii_digit())?;
    let rest = &field[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// Turns object content into track metadata
#[derive(Clone)]
pub struct TagExtractor {
    parser: Arc<dyn TagParser>,
}

impl TagExtractor {
    pub fn new(parser: Arc<dyn TagParser>) -> Self {
        Self { parser }
    }

    /// Extract metadata from the full object content
    ///
    /// Parsing runs on the blocking pool.
    pub async fn extract(&self, content: Vec<u8>, url: String) -> Result<TrackMetadata, TagError> {
        let parser = Arc::clone(&self.parser);
        let raw = tokio::task::spawn_blocking(move || parser.parse(&content))
            .await
            .map_err(|e| TagError::ParseFailure(format!("Tag parser task failed: {}", e)))??;

        Self::from_raw(raw, url)
    }

    /// Build metadata from parsed tags
    pub fn from_raw(raw: RawTags, url: String) -> Result<TrackMetadata, TagError> {
        let track_number = raw
            .track_no
            .as_deref()
            .and_then(first_digit_run)
            .ok_or(TagError::NoTrackNumber)?
            .to_string();

        Ok(TrackMetadata::new(
            raw.title,
            raw.artists,
            raw.album,
            track_number,
            url,
        ))
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new(Arc::new(LoftyTagParser))
    }
}
