//! Playback engine contract
//!
//! Both engines expose the same operations and the same observable state.
//! They differ only in how a track resolves to a URL, so the shared
//! behaviour lives in [`EngineCore`] and each engine wraps one.

use serde::Serialize;
use tandem_core::TandemError;
use tracing::{debug, trace, warn};

use crate::device::{DeviceEvent, LoadTicket, MediaDevice};
use crate::error::PlaybackError;
use crate::events::EngineEvent;
use crate::types::EngineKind;

/// Observable state of one engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState<T> {
    /// Loaded (or loading) track
    pub active_track: Option<T>,

    /// Whether the engine intends to be rendering
    pub is_playing: bool,

    /// Whether media is still being opened
    pub is_loading: bool,

    /// Position in seconds
    pub position_seconds: f64,

    /// Duration in seconds, zero until known
    pub duration_seconds: f64,

    /// Volume (0.0-1.0)
    pub volume: f32,

    /// Last load or playback failure
    pub error: Option<String>,
}

impl<T> EngineState<T> {
    /// Idle state at `volume`
    pub fn idle(volume: f32) -> Self {
        Self {
            active_track: None,
            is_playing: false,
            is_loading: false,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume,
            error: None,
        }
    }

    /// Whether a track is loaded or loading
    pub fn has_track(&self) -> bool {
        self.active_track.is_some()
    }
}

/// Operations shared by the remote and local engines
pub trait PlaybackEngine {
    /// Track type this engine plays
    type Track: Clone;

    /// Which engine this is
    fn kind(&self) -> EngineKind;

    /// Replace the active track and start opening it
    ///
    /// Does not start playback. Failures land in `state().error`.
    fn load(&mut self, track: Self::Track);

    /// Start or resume playback of the active track
    fn play(&mut self);

    /// Pause playback, keeping position
    fn pause(&mut self);

    /// Play if paused, pause if playing
    fn toggle_play(&mut self) {
        if self.state().is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek to `seconds`, clamped to the known duration
    fn seek(&mut self, seconds: f64);

    /// Set volume, clamped to 0.0-1.0
    fn set_volume(&mut self, volume: f32);

    /// Release the active track and return to idle
    fn stop(&mut self);

    /// Current state
    fn state(&self) -> &EngineState<Self::Track>;

    /// Apply an event from this engine's device
    fn handle_device_event(&mut self, ticket: LoadTicket, event: DeviceEvent);

    /// Take the events queued since the last drain
    fn drain_events(&mut self) -> Vec<EngineEvent>;
}

/// Device-driving state machine shared by both engines
pub struct EngineCore<T> {
    kind: EngineKind,
    device: Box<dyn MediaDevice>,
    state: EngineState<T>,
    ticket: LoadTicket,
    ended: bool,
    pending_events: Vec<EngineEvent>,
}

impl<T: Clone> EngineCore<T> {
    /// Wrap `device` for the `kind` engine
    pub fn new(kind: EngineKind, device: Box<dyn MediaDevice>) -> Self {
        Self {
            kind,
            device,
            state: EngineState::idle(1.0),
            ticket: LoadTicket::NONE,
            ended: false,
            pending_events: Vec::new(),
        }
    }

    /// Engine kind
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Current state
    pub fn state(&self) -> &EngineState<T> {
        &self.state
    }

    /// Ticket of the current load
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    /// Make `track` active and open the resolved URL
    pub fn load(&mut self, track: T, url: std::result::Result<String, TandemError>) {
        self.ticket = self.ticket.next();
        self.ended = false;

        let was_playing = self.state.is_playing;
        self.state = EngineState {
            active_track: Some(track),
            is_loading: true,
            ..EngineState::idle(self.state.volume)
        };
        if was_playing {
            self.push(EngineEvent::PlayStateChanged { is_playing: false });
        }

        match url {
            Ok(url) => {
                debug!(engine = ?self.kind, ticket = self.ticket.value(), %url, "Opening media");
                self.device.open(&url, self.ticket);
            }
            Err(e) => {
                warn!(engine = ?self.kind, "Could not resolve stream: {}", e);
                self.device.stop();
                self.fail(PlaybackError::from(e));
            }
        }
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        if !self.state.has_track() {
            trace!(engine = ?self.kind, "play() with nothing loaded");
            return;
        }

        if let Some(message) = self.state.error.clone() {
            debug!(engine = ?self.kind, "play() after failure, re-reporting");
            self.push(EngineEvent::Error { message });
            return;
        }

        if self.ended {
            // Replay from the top once the track has run out
            self.ended = false;
            self.state.position_seconds = 0.0;
            self.device.seek(0.0);
        }

        match self.device.play() {
            Ok(()) => self.set_playing(true),
            Err(e) => {
                let error = match e {
                    PlaybackError::Device(message) => PlaybackError::PlaybackFailure(message),
                    other => other,
                };
                warn!(engine = ?self.kind, "Device refused playback: {}", error);
                self.fail(error);
            }
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !self.state.has_track() {
            return;
        }
        self.device.pause();
        self.set_playing(false);
    }

    /// Seek to `seconds`
    pub fn seek(&mut self, seconds: f64) {
        if !self.state.has_track() || !seconds.is_finite() {
            return;
        }
        let position = seconds.clamp(0.0, self.state.duration_seconds.max(0.0));
        // A seek after the end resumes from the new position, not the top
        self.ended = false;
        self.state.position_seconds = position;
        self.device.seek(position);
        self.push(EngineEvent::TimeUpdate { position });
    }

    /// Set the volume
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.state.volume = volume;
        self.device.set_volume(volume);
    }

    /// Release the active track
    pub fn stop(&mut self) {
        // Retire the ticket so late events from the old load are dropped
        self.ticket = self.ticket.next();
        self.ended = false;
        self.device.stop();

        let was_playing = self.state.is_playing;
        self.state = EngineState::idle(self.state.volume);
        if was_playing {
            self.push(EngineEvent::PlayStateChanged { is_playing: false });
        }
    }

    /// Apply a device event
    pub fn handle_device_event(&mut self, ticket: LoadTicket, event: DeviceEvent) {
        if ticket != self.ticket || !self.state.has_track() {
            trace!(
                engine = ?self.kind,
                ticket = ticket.value(),
                current = self.ticket.value(),
                "Dropping stale device event"
            );
            return;
        }

        match event {
            DeviceEvent::Loaded { duration } => {
                self.state.is_loading = false;
                if duration.is_finite() && duration >= 0.0 {
                    self.state.duration_seconds = duration;
                }
                self.push(EngineEvent::Loaded {
                    duration: self.state.duration_seconds,
                });
            }
            DeviceEvent::TimeUpdate { position } => {
                if self.ended || !position.is_finite() {
                    return;
                }
                self.state.position_seconds = position.max(0.0);
                self.push(EngineEvent::TimeUpdate {
                    position: self.state.position_seconds,
                });
            }
            DeviceEvent::PlayStateChanged { is_playing } => {
                if is_playing {
                    self.state.is_loading = false;
                }
                self.set_playing(is_playing);
            }
            DeviceEvent::Ended => {
                if self.ended {
                    return;
                }
                self.ended = true;
                self.set_playing(false);
                self.state.position_seconds = 0.0;
                debug!(engine = ?self.kind, "Track ended");
                self.push(EngineEvent::Ended);
            }
            DeviceEvent::Error { message } => {
                let error = if self.state.is_loading {
                    PlaybackError::LoadFailure(message)
                } else {
                    PlaybackError::PlaybackFailure(message)
                };
                warn!(engine = ?self.kind, "{}", error);
                self.fail(error);
            }
        }
    }

    /// Take pending events
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn fail(&mut self, error: PlaybackError) {
        let message = error.to_string();
        self.state.is_loading = false;
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = 0.0;
        self.state.error = Some(message.clone());
        self.set_playing(false);
        self.push(EngineEvent::Error { message });
    }

    fn set_playing(&mut self, is_playing: bool) {
        if self.state.is_playing != is_playing {
            self.state.is_playing = is_playing;
            self.push(EngineEvent::PlayStateChanged { is_playing });
        }
    }

    fn push(&mut self, event: EngineEvent) {
        self.pending_events.push(event);
    }
}

impl<T> std::fmt::Debug for EngineCore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCore")
            .field("kind", &self.kind)
            .field("ticket", &self.ticket)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}
