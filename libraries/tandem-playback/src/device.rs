//! Media device contract
//!
//! A device is the thing that actually decodes and renders audio. Engines
//! drive it through [`MediaDevice`]; the device reports back by sending
//! [`DeviceMessage`]s on a channel owned by the coordinator.
//!
//! Every `open` carries a [`LoadTicket`]. Devices tag every event with the
//! ticket of the load that produced it, which lets engines drop events
//! from loads that were superseded or stopped.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

use crate::error::Result;
use crate::types::EngineKind;

/// Identifies one `open` on one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Ticket before anything was loaded
    pub const NONE: LoadTicket = LoadTicket(0);

    /// The ticket issued after this one
    pub fn next(self) -> Self {
        LoadTicket(self.0.wrapping_add(1))
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Event reported by a device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Media opened, duration known (seconds)
    Loaded { duration: f64 },

    /// Playback position advanced (seconds)
    TimeUpdate { position: f64 },

    /// Device started or stopped rendering
    PlayStateChanged { is_playing: bool },

    /// Media played through to the end
    Ended,

    /// Media could not be opened or decoded
    Error { message: String },
}

/// Device event tagged with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMessage {
    /// Engine that owns the device
    pub engine: EngineKind,

    /// Load the event belongs to
    pub ticket: LoadTicket,

    /// The event itself
    pub event: DeviceEvent,
}

/// Sending half handed to a device
///
/// Stamps every event with the owning engine's kind.
#[derive(Debug, Clone)]
pub struct DeviceEventSender {
    engine: EngineKind,
    tx: Sender<DeviceMessage>,
}

impl DeviceEventSender {
    /// Engine this sender reports for
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Send an event
    ///
    /// Returns `false` once the coordinator has gone away.
    pub fn emit(&self, ticket: LoadTicket, event: DeviceEvent) -> bool {
        self.tx
            .send(DeviceMessage {
                engine: self.engine,
                ticket,
                event,
            })
            .is_ok()
    }
}

/// Event channel shared by both devices and the coordinator
///
/// Devices must exist before engines and engines before the coordinator,
/// so the channel is created first and split: one sender per device, the
/// receiver for the coordinator.
#[derive(Debug)]
pub struct PlayerChannels {
    tx: Sender<DeviceMessage>,
    rx: Receiver<DeviceMessage>,
}

impl PlayerChannels {
    /// Create the channel
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Sender for the device owned by `engine`
    pub fn sender(&self, engine: EngineKind) -> DeviceEventSender {
        DeviceEventSender {
            engine,
            tx: self.tx.clone(),
        }
    }

    /// Receiver for the coordinator
    pub fn into_receiver(self) -> Receiver<DeviceMessage> {
        self.rx
    }
}

impl Default for PlayerChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// Audio device driven by an engine
///
/// All methods return immediately; outcomes arrive as [`DeviceEvent`]s.
/// `play` may only fail synchronously when the device refuses outright.
pub trait MediaDevice: Send {
    /// Open `url`, superseding whatever was open
    ///
    /// Must not start rendering. Reports `Loaded` or `Error` under `ticket`.
    fn open(&mut self, url: &str, ticket: LoadTicket);

    /// Start or resume rendering
    ///
    /// Called before `Loaded` arrives, rendering begins once loading ends.
    fn play(&mut self) -> Result<()>;

    /// Pause rendering, keeping the position
    fn pause(&mut self);

    /// Jump to `seconds`
    fn seek(&mut self, seconds: f64);

    /// Set output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// Stop rendering and release the media
    ///
    /// No further events are sent for the previous ticket.
    fn stop(&mut self);
}
