//! Playback events
//!
//! Engines queue [`EngineEvent`]s as their state changes. The coordinator
//! drains them, wraps them in [`PlayerEvent`]s and adds its own.

use serde::Serialize;
use tandem_core::Track;

use crate::types::{EngineKind, RepeatMode};

/// Events emitted by a single engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// Media loaded and duration known
    Loaded {
        /// Duration in seconds
        duration: f64,
    },

    /// Position moved
    TimeUpdate {
        /// Position in seconds
        position: f64,
    },

    /// Playing flag flipped
    PlayStateChanged {
        /// New playing state
        is_playing: bool,
    },

    /// Track finished on its own
    Ended,

    /// Load or playback failed
    Error {
        /// Human-readable description
        message: String,
    },
}

/// Events emitted by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Event from one of the engines
    Engine {
        /// Engine that emitted it
        engine: EngineKind,
        /// The event
        event: EngineEvent,
    },

    /// An engine was asked to load a new track
    TrackChanged {
        /// Engine that now owns playback
        engine: EngineKind,
        /// The track
        track: Track,
    },

    /// The engine holding a track changed
    ActiveEngineChanged {
        /// New active engine, `None` when both are idle
        engine: Option<EngineKind>,
    },

    /// Queue contents were replaced
    QueueChanged {
        /// New length
        len: usize,
    },

    /// Shuffle toggled
    ShuffleChanged {
        /// New state
        enabled: bool,
    },

    /// Repeat mode cycled
    RepeatChanged {
        /// New mode
        mode: RepeatMode,
    },

    /// A track ended with nothing left to play
    QueueFinished,
}
