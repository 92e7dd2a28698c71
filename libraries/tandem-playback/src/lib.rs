//! Tandem - Playback Management
//!
//! Platform-agnostic playback management for Tandem.
//!
//! This crate provides:
//! - A queue state machine holding either catalog tracks or one local collection
//! - Shuffle anchored at the track playing when shuffle begins
//! - Repeat modes (Off, All, One)
//! - Two playback engines sharing one contract (remote and local)
//! - A coordinator that keeps at most one engine active and advances the
//!   queue when a track ends
//!
//! # Architecture
//!
//! `tandem-playback` never touches audio hardware or the network:
//! - Audio output sits behind the [`MediaDevice`] trait
//! - Stream URLs come from `tandem_core::{CatalogStreams, LocalStreams}`
//! - Devices report back over a channel, the coordinator applies their
//!   events on the thread that owns it
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tandem_core::RemoteTrack;
//! use tandem_playback::testing::{ScriptedDevice, StaticStreams};
//! use tandem_playback::{
//!     DeviceEvent, EngineKind, LocalEngine, PlaybackCoordinator, PlayerChannels,
//!     QueueManager, RemoteEngine,
//! };
//!
//! let channels = PlayerChannels::new();
//! let (remote_device, remote_handle) = ScriptedDevice::new(channels.sender(EngineKind::Remote));
//! let (local_device, _) = ScriptedDevice::new(channels.sender(EngineKind::Local));
//! let streams = Arc::new(StaticStreams::new());
//!
//! let mut player = PlaybackCoordinator::new(
//!     QueueManager::new(),
//!     RemoteEngine::new(Box::new(remote_device), streams.clone()),
//!     LocalEngine::new(Box::new(local_device), streams),
//!     channels.into_receiver(),
//! );
//!
//! let songs = vec![
//!     RemoteTrack::new("a", "First", "Artist"),
//!     RemoteTrack::new("b", "Second", "Artist"),
//! ];
//! player.play_remote(songs[0].clone(), Some(songs.clone()), Some(0));
//!
//! // The device finishes the first song; the coordinator moves on
//! remote_handle.emit(DeviceEvent::Ended);
//! player.pump();
//!
//! assert_eq!(player.current_track().unwrap().title(), "Second");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod coordinator;
pub mod device;
pub mod engine;
pub mod error;
pub mod events;
pub mod local;
pub mod queue;
pub mod remote;
pub mod shuffle;
pub mod testing;
pub mod types;

pub use coordinator::{PlaybackCoordinator, PlayerSnapshot};
pub use device::{
    DeviceEvent, DeviceEventSender, DeviceMessage, LoadTicket, MediaDevice, PlayerChannels,
};
pub use engine::{EngineCore, EngineState, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::{EngineEvent, PlayerEvent};
pub use local::LocalEngine;
pub use queue::{QueueItems, QueueManager, QueueState};
pub use remote::RemoteEngine;
pub use types::{Direction, EngineKind, PlaybackConfig, RepeatMode};
