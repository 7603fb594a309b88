//! View fan-out
//!
//! One track record is written to three independent views:
//! - track view: replace, keyed by normalized title (title collisions overwrite)
//! - album view: atomic append to the album's track list
//! - artist view: new row per track, keyed by normalized artist and title
//!
//! The writes run concurrently. A failure in one view does not stop or undo
//! the others and is never retried.

use chrono::Utc;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use tuneshelf_common::config::ViewTables;
use tuneshelf_common::models::{TrackMetadata, ALBUM_TRACKS_ATTR};

use crate::error::{StoreError, ViewWriteError};
use crate::store::{to_item, Item, ListAppend, ViewStore};

/// The three denormalized views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Track,
    Album,
    Artist,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Track => "track",
            View::Album => "album",
            View::Artist => "artist",
        };
        f.write_str(name)
    }
}

/// Per-view outcome of one fan-out
#[derive(Debug)]
pub struct WriteReport {
    pub track: Result<(), ViewWriteError>,
    pub album: Result<(), ViewWriteError>,
    pub artist: Result<(), ViewWriteError>,
}

impl WriteReport {
    /// All three views were written
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn failures(&self) -> Vec<&ViewWriteError> {
        [&self.track, &self.album, &self.artist]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
            .collect()
    }

    pub fn failed_views(&self) -> Vec<View> {
        self.failures().into_iter().map(|e| e.view).collect()
    }
}

/// Writes track records into the three views
#[derive(Clone)]
pub struct ViewWriter {
    store: Arc<dyn ViewStore>,
    tables: ViewTables,
}

impl ViewWriter {
    pub fn new(store: Arc<dyn ViewStore>, tables: ViewTables) -> Self {
        Self { store, tables }
    }

    /// Fan one track out to all views; never fails as a whole
    pub async fn write(&self, track: &TrackMetadata) -> WriteReport {
        let (track_result, album_result, artist_result) = tokio::join!(
            self.write_track_view(track),
            self.append_album_view(track),
            self.write_artist_view(track),
        );

        let report = WriteReport {
            track: track_result,
            album: album_result,
            artist: artist_result,
        };

        for failure in report.failures() {
            warn!(
                view = %failure.view,
                title = %track.title,
                artist = %track.artist,
                error = %failure.source,
                "View write failed"
            );
        }
        debug!(
            title = %track.title,
            complete = report.is_complete(),
            "View fan-out finished"
        );

        report
    }

    async fn write_track_view(&self, track: &TrackMetadata) -> Result<(), ViewWriteError> {
        let result = async {
            let item = to_item(&track.track_view_item(Utc::now()))?;
            self.store.put_item(&self.tables.track, item).await
        }
        .await;
        tag_view(View::Track, result)
    }

    async fn append_album_view(&self, track: &TrackMetadata) -> Result<(), ViewWriteError> {
        let result = async {
            let mut set = Item::new();
            set.insert("ui_album".to_string(), Value::String(track.ui_album.clone()));
            set.insert("ui_artist".to_string(), Value::String(track.ui_artist.clone()));

            let update = ListAppend {
                key: to_item(&track.album_view_key())?,
                list_attribute: ALBUM_TRACKS_ATTR.to_string(),
                entry: Value::Object(to_item(&track.album_track_entry())?),
                set,
            };
            self.store.append_to_list(&self.tables.album, update).await
        }
        .await;
        tag_view(View::Album, result)
    }

    async fn write_artist_view(&self, track: &TrackMetadata) -> Result<(), ViewWriteError> {
        let result = async {
            let item = to_item(&track.artist_view_item(Utc::now()))?;
            self.store.put_item(&self.tables.artist, item).await
        }
        .await;
        tag_view(View::Artist, result)
    }
}

fn tag_view(view: View, result: Result<(), StoreError>) -> Result<(), ViewWriteError> {
    result.map_err(|source| ViewWriteError { view, source })
}
