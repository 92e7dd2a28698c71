//! Queue state machine
//!
//! Holds exactly one of two queue shapes (catalog tracks or one local
//! collection), a cursor, an anchored shuffle order and the repeat mode.
//!
//! The cursor is logical: with shuffle off it is an index into the items,
//! with shuffle on it is a position in the shuffle order. Either way the
//! item under the cursor is [`QueueManager::current`].

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tandem_core::{LocalTrack, RemoteTrack, Track};
use tracing::debug;

use crate::error::PlaybackError;
use crate::shuffle::anchored_order;
use crate::types::{Direction, EngineKind, PlaybackConfig, RepeatMode};

/// Items held by the queue
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueueItems {
    /// Nothing queued yet
    #[default]
    Empty,

    /// Catalog tracks
    Remote { tracks: Vec<RemoteTrack> },

    /// Files from a single local collection
    Local {
        collection: String,
        tracks: Vec<LocalTrack>,
    },
}

impl QueueItems {
    /// Number of queued items
    pub fn len(&self) -> usize {
        match self {
            QueueItems::Empty => 0,
            QueueItems::Remote { tracks } => tracks.len(),
            QueueItems::Local { tracks, .. } => tracks.len(),
        }
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Engine that plays these items
    pub fn kind(&self) -> Option<EngineKind> {
        match self {
            QueueItems::Empty => None,
            QueueItems::Remote { .. } => Some(EngineKind::Remote),
            QueueItems::Local { .. } => Some(EngineKind::Local),
        }
    }

    /// Item at a physical index
    pub fn get(&self, index: usize) -> Option<Track> {
        match self {
            QueueItems::Empty => None,
            QueueItems::Remote { tracks } => tracks.get(index).cloned().map(Track::Remote),
            QueueItems::Local { tracks, .. } => tracks.get(index).cloned().map(Track::Local),
        }
    }

    /// Every item, in physical order
    pub fn to_tracks(&self) -> Vec<Track> {
        match self {
            QueueItems::Empty => Vec::new(),
            QueueItems::Remote { tracks } => tracks.iter().cloned().map(Track::Remote).collect(),
            QueueItems::Local { tracks, .. } => tracks.iter().cloned().map(Track::Local).collect(),
        }
    }

    /// Collection label for a local queue
    pub fn collection(&self) -> Option<&str> {
        match self {
            QueueItems::Local { collection, .. } => Some(collection),
            _ => None,
        }
    }
}

/// Serializable view of the queue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    /// Which queue shape is populated
    pub kind: Option<EngineKind>,

    /// Items in physical order
    pub items: Vec<Track>,

    /// Logical cursor
    pub cursor: Option<usize>,

    /// Physical index of the current item
    pub current_index: Option<usize>,

    /// Collection name when the local queue is populated
    pub collection_label: Option<String>,

    /// Anchored shuffle order
    pub shuffle_order: Vec<usize>,

    /// Whether navigation follows the shuffle order
    pub shuffle_enabled: bool,

    /// Repeat mode
    pub repeat_mode: RepeatMode,
}

/// Queue manager
///
/// Pure state machine: no I/O, no engine calls. The coordinator asks it
/// which track comes next and routes the answer to an engine.
#[derive(Debug)]
pub struct QueueManager {
    items: QueueItems,
    cursor: Option<usize>,
    shuffle_order: Vec<usize>,
    shuffle_enabled: bool,
    repeat: RepeatMode,
    rng: StdRng,
}

impl QueueManager {
    /// Create an empty queue with shuffle off and repeat off
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty queue with a deterministic shuffle source
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Create an empty queue with the configured shuffle and repeat state
    pub fn with_config(config: &PlaybackConfig) -> Self {
        let mut queue = Self::new();
        queue.shuffle_enabled = config.shuffle;
        queue.repeat = config.repeat;
        queue
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            items: QueueItems::Empty,
            cursor: None,
            shuffle_order: Vec::new(),
            shuffle_enabled: false,
            repeat: RepeatMode::Off,
            rng,
        }
    }

    // ===== Queue Assignment =====

    /// Replace the queue with catalog tracks, starting at `start_index`
    ///
    /// Empties any local queue.
    pub fn set_remote_queue(&mut self, tracks: Vec<RemoteTrack>, start_index: usize) {
        self.assign(QueueItems::Remote { tracks }, start_index);
    }

    /// Replace the queue with tracks from one local collection
    ///
    /// Every track is stamped with `collection`. Empties any remote queue.
    pub fn set_local_queue(
        &mut self,
        collection: impl Into<String>,
        tracks: Vec<LocalTrack>,
        start_index: usize,
    ) {
        let collection = collection.into();
        let tracks = tracks
            .into_iter()
            .map(|mut track| {
                if !track.is_in(&collection) {
                    track.collection_name.clone_from(&collection);
                }
                track
            })
            .collect();
        self.assign(QueueItems::Local { collection, tracks }, start_index);
    }

    /// Drop all items
    ///
    /// Shuffle and repeat settings are kept.
    pub fn clear(&mut self) {
        self.assign(QueueItems::Empty, 0);
    }

    fn assign(&mut self, items: QueueItems, start_index: usize) {
        let len = items.len();
        self.items = items;

        if len == 0 {
            self.cursor = None;
            self.shuffle_order.clear();
            debug!("Queue cleared");
            return;
        }

        let start = if start_index >= len {
            debug!(
                "{}, starting at last item",
                PlaybackError::OutOfRangeIndex {
                    index: start_index,
                    len
                }
            );
            len - 1
        } else {
            start_index
        };

        self.shuffle_order = anchored_order(len, start, &mut self.rng);
        self.cursor = Some(if self.shuffle_enabled { 0 } else { start });

        debug!(
            kind = ?self.items.kind(),
            len,
            start,
            shuffle = self.shuffle_enabled,
            "Queue assigned"
        );
    }

    // ===== Navigation =====

    /// Advance one step forward
    ///
    /// Returns the new current track, or `None` at the end with repeat off.
    pub fn next(&mut self) -> Option<Track> {
        self.step(Direction::Next)
    }

    /// Step one item backward
    ///
    /// Returns the new current track, or `None` at the start with repeat off.
    pub fn previous(&mut self) -> Option<Track> {
        self.step(Direction::Previous)
    }

    /// Advance after the current track ended on its own
    ///
    /// Same rules as [`QueueManager::next`].
    pub fn auto_next(&mut self) -> Option<Track> {
        self.step(Direction::Next)
    }

    /// Step in `direction`
    pub fn step(&mut self, direction: Direction) -> Option<Track> {
        let len = self.items.len();
        let Some(cursor) = self.cursor.filter(|_| len > 0) else {
            debug!("{}", PlaybackError::EmptyQueue);
            return None;
        };

        if self.repeat == RepeatMode::One {
            return self.current();
        }

        let position = match direction {
            Direction::Next if cursor + 1 < len => cursor + 1,
            Direction::Next if self.repeat == RepeatMode::All => {
                if self.shuffle_enabled {
                    // New cycle opens on the same track the finished one did
                    let anchor = self.shuffle_order.first().copied().unwrap_or(0);
                    self.shuffle_order = anchored_order(len, anchor, &mut self.rng);
                }
                0
            }
            Direction::Previous if cursor > 0 => cursor - 1,
            Direction::Previous if self.repeat == RepeatMode::All => len - 1,
            _ => return None,
        };

        self.cursor = Some(position);
        self.current()
    }

    /// Whether [`QueueManager::next`] would return a track
    pub fn has_next(&self) -> bool {
        match self.cursor {
            Some(cursor) if !self.items.is_empty() => {
                self.repeat != RepeatMode::Off || cursor + 1 < self.items.len()
            }
            _ => false,
        }
    }

    /// Whether [`QueueManager::previous`] would return a track
    pub fn has_previous(&self) -> bool {
        match self.cursor {
            Some(cursor) if !self.items.is_empty() => {
                self.repeat != RepeatMode::Off || cursor > 0
            }
            _ => false,
        }
    }

    // ===== Modes =====

    /// Flip shuffle, keeping the current track current
    ///
    /// Turning shuffle on builds a fresh order anchored at the current
    /// track. Turning it off moves the cursor to that track's physical
    /// index. Returns the new state.
    pub fn toggle_shuffle(&mut self) -> bool {
        let current = self.current_index();

        if self.shuffle_enabled {
            self.shuffle_enabled = false;
            self.cursor = current;
        } else {
            self.shuffle_enabled = true;
            let len = self.items.len();
            self.shuffle_order = anchored_order(len, current.unwrap_or(0), &mut self.rng);
            if current.is_some() {
                self.cursor = Some(0);
            }
        }

        debug!(enabled = self.shuffle_enabled, "Shuffle toggled");
        self.shuffle_enabled
    }

    /// Advance the repeat mode `off -> all -> one -> off`
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        debug!(mode = ?self.repeat, "Repeat mode changed");
        self.repeat
    }

    /// Set the repeat mode directly
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    // ===== Queries =====

    /// Current repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    /// Whether shuffle is on
    pub fn is_shuffled(&self) -> bool {
        self.shuffle_enabled
    }

    /// Queued items
    pub fn items(&self) -> &QueueItems {
        &self.items
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Which queue shape is populated
    pub fn kind(&self) -> Option<EngineKind> {
        self.items.kind()
    }

    /// Collection name when a local queue is populated
    pub fn collection_label(&self) -> Option<&str> {
        self.items.collection()
    }

    /// Logical cursor
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Physical index of the current item
    pub fn current_index(&self) -> Option<usize> {
        let cursor = self.cursor?;
        if self.shuffle_enabled {
            self.shuffle_order.get(cursor).copied()
        } else {
            Some(cursor)
        }
    }

    /// Current item
    pub fn current(&self) -> Option<Track> {
        self.items.get(self.current_index()?)
    }

    /// Anchored shuffle order
    pub fn shuffle_order(&self) -> &[usize] {
        &self.shuffle_order
    }

    /// Serializable view of the whole queue
    pub fn snapshot(&self) -> QueueState {
        QueueState {
            kind: self.kind(),
            items: self.items.to_tracks(),
            cursor: self.cursor,
            current_index: self.current_index(),
            collection_label: self.collection_label().map(str::to_string),
            shuffle_order: self.shuffle_order.clone(),
            shuffle_enabled: self.shuffle_enabled,
            repeat_mode: self.repeat,
        }
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}
