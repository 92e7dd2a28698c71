/// Track domain types
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// What kind of catalog item a remote track is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    /// Regular song
    #[default]
    Song,
    /// Podcast episode
    Episode,
}

/// Track streamed from the remote catalog
///
/// Two remote tracks are the same track when their `id`s match; the other
/// fields are display metadata and may differ between catalog responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTrack {
    /// Catalog identifier used to resolve the stream
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist (or podcast author)
    pub artist: String,

    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Duration reported by the catalog, in seconds
    #[serde(default)]
    pub duration_hint: Option<f64>,

    /// Owning podcast, for episodes
    #[serde(default)]
    pub podcast_id: Option<String>,

    /// Song or episode
    #[serde(default)]
    pub kind: RemoteKind,
}

impl RemoteTrack {
    /// Create a remote track with minimal metadata
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: None,
            duration_hint: None,
            podcast_id: None,
            kind: RemoteKind::Song,
        }
    }

    /// Set the catalog duration hint
    pub fn with_duration_hint(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds);
        self
    }

    /// Set the thumbnail URL
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }
}

impl PartialEq for RemoteTrack {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RemoteTrack {}

impl Hash for RemoteTrack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Track stored as a file inside a named local collection
///
/// Identity is the `(collection_name, filename)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTrack {
    /// Collection (folder) the file lives in
    pub collection_name: String,

    /// File name within the collection
    pub filename: String,

    /// Display title
    pub title: String,

    /// File size in bytes
    pub size_bytes: u64,

    /// File extension without the dot
    #[serde(default)]
    pub extension: Option<String>,
}

impl LocalTrack {
    /// Create a local track
    pub fn new(
        collection_name: impl Into<String>,
        filename: impl Into<String>,
        title: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            collection_name: collection_name.into(),
            filename: filename.into(),
            title: title.into(),
            size_bytes,
            extension: None,
        }
    }

    /// Whether this track belongs to `collection`
    pub fn is_in(&self, collection: &str) -> bool {
        self.collection_name == collection
    }
}

impl PartialEq for LocalTrack {
    fn eq(&self, other: &Self) -> bool {
        self.collection_name == other.collection_name && self.filename == other.filename
    }
}

impl Eq for LocalTrack {}

impl Hash for LocalTrack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.collection_name.hash(state);
        self.filename.hash(state);
    }
}

/// Identity key of a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackKey {
    /// Catalog identifier
    Remote { id: String },
    /// Collection + file name
    Local { collection: String, filename: String },
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKey::Remote { id } => write!(f, "remote:{}", id),
            TrackKey::Local {
                collection,
                filename,
            } => write!(f, "local:{}/{}", collection, filename),
        }
    }
}

/// Either kind of playable track
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "track", rename_all = "lowercase")]
pub enum Track {
    /// Streamed from the catalog
    Remote(RemoteTrack),
    /// Stored in a local collection
    Local(LocalTrack),
}

impl Track {
    /// Identity key
    pub fn key(&self) -> TrackKey {
        match self {
            Track::Remote(track) => TrackKey::Remote {
                id: track.id.clone(),
            },
            Track::Local(track) => TrackKey::Local {
                collection: track.collection_name.clone(),
                filename: track.filename.clone(),
            },
        }
    }

    /// Whether `other` is the same track, ignoring metadata
    pub fn same_identity(&self, other: &Track) -> bool {
        self.key() == other.key()
    }

    /// Display title
    pub fn title(&self) -> &str {
        match self {
            Track::Remote(track) => &track.title,
            Track::Local(track) => &track.title,
        }
    }

    /// Whether this is a catalog track
    pub fn is_remote(&self) -> bool {
        matches!(self, Track::Remote(_))
    }

    /// Whether this is a local file
    pub fn is_local(&self) -> bool {
        matches!(self, Track::Local(_))
    }

    /// Borrow the remote track, if any
    pub fn as_remote(&self) -> Option<&RemoteTrack> {
        match self {
            Track::Remote(track) => Some(track),
            Track::Local(_) => None,
        }
    }

    /// Borrow the local track, if any
    pub fn as_local(&self) -> Option<&LocalTrack> {
        match self {
            Track::Local(track) => Some(track),
            Track::Remote(_) => None,
        }
    }
}

impl From<RemoteTrack> for Track {
    fn from(track: RemoteTrack) -> Self {
        Track::Remote(track)
    }
}

impl From<LocalTrack> for Track {
    fn from(track: LocalTrack) -> Self {
        Track::Local(track)
    }
}
