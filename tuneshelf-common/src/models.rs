//! Track metadata and view records
//!
//! One `TrackMetadata` is produced per ingested file and fanned out into three
//! denormalized views. Attribute names on the view records are the stored
//! attribute names.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Metadata of one ingested track
///
/// `ui_*` fields carry the tag strings exactly as embedded in the file;
/// `title`, `artist` and `album` are the normalized keys derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Title as tagged
    pub ui_title: String,
    /// Primary artist as tagged (first contributor, or empty)
    pub ui_artist: String,
    /// Album as tagged
    pub ui_album: String,
    /// All contributors in tag order
    pub artists: Vec<String>,
    /// First run of digits of the tag's track field
    pub track_number: String,
    /// Normalized title key
    pub title: String,
    /// Normalized primary artist key
    pub artist: String,
    /// Normalized album key
    pub album: String,
    /// Locator of the produced MP3 rendition
    pub url: String,
}

impl TrackMetadata {
    /// Build metadata from display strings, deriving the normalized keys
    pub fn new(
        ui_title: impl Into<String>,
        artists: Vec<String>,
        ui_album: impl Into<String>,
        track_number: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let ui_title = ui_title.into();
        let ui_album = ui_album.into();
        let ui_artist = artists.first().cloned().unwrap_or_default();

        Self {
            title: normalize(&ui_title),
            artist: normalize(&ui_artist),
            album: normalize(&ui_album),
            ui_title,
            ui_artist,
            ui_album,
            artists,
            track_number: track_number.into(),
            url: url.into(),
        }
    }

    /// Track view record (keyed by normalized title)
    pub fn track_view_item(&self, ingested_at: DateTime<Utc>) -> TrackViewItem {
        TrackViewItem {
            title: self.title.clone(),
            ui_title: self.ui_title.clone(),
            artist: self.artist.clone(),
            ui_artist: self.ui_artist.clone(),
            album: self.album.clone(),
            ui_album: self.ui_album.clone(),
            track_number: self.track_number.clone(),
            url: self.url.clone(),
            ingested_at: ingested_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Album view key (normalized album, normalized artist)
    pub fn album_view_key(&self) -> AlbumViewKey {
        AlbumViewKey {
            album: self.album.clone(),
            artist: self.artist.clone(),
        }
    }

    /// Entry appended to the album's track list
    pub fn album_track_entry(&self) -> AlbumTrackEntry {
        AlbumTrackEntry {
            title: self.title.clone(),
            ui_title: self.ui_title.clone(),
            track_number: self.track_number.clone(),
            url: self.url.clone(),
        }
    }

    /// Artist view record (keyed by normalized artist and title)
    pub fn artist_view_item(&self, ingested_at: DateTime<Utc>) -> ArtistViewItem {
        ArtistViewItem(self.track_view_item(ingested_at))
    }
}

/// Row of the track view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackViewItem {
    pub title: String,
    pub ui_title: String,
    pub artist: String,
    pub ui_artist: String,
    pub album: String,
    pub ui_album: String,
    pub track_number: String,
    pub url: String,
    /// RFC 3339 UTC timestamp of the ingestion
    pub ingested_at: String,
}

/// Row of the artist view
///
/// Same attributes as the track view; partitioned by `artist`, sorted by
/// `title`. A new row is written per ingested track, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistViewItem(pub TrackViewItem);

/// Primary key of the album view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumViewKey {
    pub album: String,
    pub artist: String,
}

/// One track in an album's append-only track list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTrackEntry {
    pub title: String,
    pub ui_title: String,
    pub track_number: String,
    pub url: String,
}

/// Attribute holding the album's track list
pub const ALBUM_TRACKS_ATTR: &str = "tracks";
