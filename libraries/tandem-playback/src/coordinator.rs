//! Playback coordinator
//!
//! Owns the queue and both engines. Guarantees at most one engine holds a
//! track at any time, routes transport commands to whichever engine does,
//! and advances the queue when a track ends.
//!
//! All work happens on the thread that owns the coordinator. Devices send
//! their events over a channel; the host feeds them back in through
//! [`PlaybackCoordinator::pump`], [`PlaybackCoordinator::wait_for_event`] or
//! [`PlaybackCoordinator::handle_device_message`].

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::Serialize;
use tandem_core::{LocalTrack, RemoteTrack, Track};
use tracing::{debug, info};

use crate::device::DeviceMessage;
use crate::engine::{EngineState, PlaybackEngine};
use crate::events::{EngineEvent, PlayerEvent};
use crate::local::LocalEngine;
use crate::queue::{QueueManager, QueueState};
use crate::remote::RemoteEngine;
use crate::types::{Direction, EngineKind, RepeatMode};

/// Serializable view of the whole player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Queue state
    pub queue: QueueState,

    /// Catalog engine state
    pub remote: EngineState<RemoteTrack>,

    /// Local engine state
    pub local: EngineState<LocalTrack>,

    /// Engine holding a track, if any
    pub active_engine: Option<EngineKind>,
}

/// Coordinates the queue and both engines
#[derive(Debug)]
pub struct PlaybackCoordinator {
    queue: QueueManager,
    remote: RemoteEngine,
    local: LocalEngine,
    device_events: Receiver<DeviceMessage>,
    pending_events: Vec<PlayerEvent>,
    last_active: Option<EngineKind>,
}

impl PlaybackCoordinator {
    /// Create a coordinator
    ///
    /// `device_events` is the receiving half of the channel both engines'
    /// devices report on (see [`crate::PlayerChannels`]).
    pub fn new(
        queue: QueueManager,
        remote: RemoteEngine,
        local: LocalEngine,
        device_events: Receiver<DeviceMessage>,
    ) -> Self {
        Self {
            queue,
            remote,
            local,
            device_events,
            pending_events: Vec::new(),
            last_active: None,
        }
    }

    // ===== Starting Playback =====

    /// Play a catalog track
    ///
    /// Stops the local engine first. With `items`, the queue is replaced
    /// by them, starting at `start_index` or else at `track`'s position in
    /// `items` (first item if absent).
    pub fn play_remote(
        &mut self,
        track: RemoteTrack,
        items: Option<Vec<RemoteTrack>>,
        start_index: Option<usize>,
    ) {
        self.local.stop();

        if let Some(items) = items {
            let start = start_index
                .or_else(|| items.iter().position(|item| item == &track))
                .unwrap_or(0);
            self.queue.set_remote_queue(items, start);
            self.pending_events.push(PlayerEvent::QueueChanged {
                len: self.queue.len(),
            });
        }

        self.start_remote(track);
        self.collect_engine_events();
    }

    /// Play a file from a local collection
    ///
    /// Stops the catalog engine first. If the same file from the same
    /// collection is already loaded locally, toggles play/pause instead of
    /// reloading and leaves the queue alone.
    pub fn play_local(
        &mut self,
        collection: &str,
        mut track: LocalTrack,
        items: Option<Vec<LocalTrack>>,
        start_index: Option<usize>,
    ) {
        self.remote.stop();

        if self.local.is_current(collection, &track.filename) {
            debug!(filename = %track.filename, "Already loaded, toggling");
            self.local.toggle_play();
            self.collect_engine_events();
            return;
        }

        if !track.is_in(collection) {
            track.collection_name = collection.to_string();
        }

        if let Some(items) = items {
            let start = start_index
                .or_else(|| items.iter().position(|item| item.filename == track.filename))
                .unwrap_or(0);
            self.queue.set_local_queue(collection, items, start);
            self.pending_events.push(PlayerEvent::QueueChanged {
                len: self.queue.len(),
            });
        }

        self.start_local(track);
        self.collect_engine_events();
    }

    // ===== Navigation =====

    /// Skip to the next queued track
    pub fn next(&mut self) {
        self.advance(Direction::Next);
    }

    /// Go back to the previous queued track
    pub fn previous(&mut self) {
        self.advance(Direction::Previous);
    }

    /// Step through the queue and play the result on the matching engine
    pub fn advance(&mut self, direction: Direction) {
        match self.queue.step(direction) {
            Some(track) => self.start_track(track),
            None => debug!(?direction, "Nothing to advance to"),
        }
        self.collect_engine_events();
    }

    /// Whether a next track exists
    pub fn has_next(&self) -> bool {
        self.queue.has_next()
    }

    /// Whether a previous track exists
    pub fn has_previous(&self) -> bool {
        self.queue.has_previous()
    }

    // ===== Transport =====

    /// Play/pause the active engine
    pub fn toggle_play(&mut self) {
        match self.active_engine() {
            Some(EngineKind::Remote) => self.remote.toggle_play(),
            Some(EngineKind::Local) => self.local.toggle_play(),
            None => debug!("toggle_play() with nothing loaded"),
        }
        self.collect_engine_events();
    }

    /// Seek the active engine
    pub fn seek(&mut self, seconds: f64) {
        match self.active_engine() {
            Some(EngineKind::Remote) => self.remote.seek(seconds),
            Some(EngineKind::Local) => self.local.seek(seconds),
            None => {}
        }
        self.collect_engine_events();
    }

    /// Seek the active engine relative to its position
    pub fn seek_by(&mut self, delta_seconds: f64) {
        let position = match self.active_engine() {
            Some(EngineKind::Remote) => self.remote.state().position_seconds,
            Some(EngineKind::Local) => self.local.state().position_seconds,
            None => return,
        };
        self.seek(position + delta_seconds);
    }

    /// Set the active engine's volume
    pub fn set_volume(&mut self, volume: f32) {
        match self.active_engine() {
            Some(EngineKind::Remote) => self.remote.set_volume(volume),
            Some(EngineKind::Local) => self.local.set_volume(volume),
            None => {}
        }
    }

    /// Stop both engines
    pub fn stop(&mut self) {
        self.remote.stop();
        self.local.stop();
        self.collect_engine_events();
    }

    // ===== Modes =====

    /// Flip shuffle
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.queue.toggle_shuffle();
        self.pending_events
            .push(PlayerEvent::ShuffleChanged { enabled });
        enabled
    }

    /// Advance the repeat mode
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.queue.cycle_repeat_mode();
        self.pending_events.push(PlayerEvent::RepeatChanged { mode });
        mode
    }

    // ===== Device Events =====

    /// Channel the devices report on
    ///
    /// Clone it to wait on it alongside other channels.
    pub fn device_events(&self) -> &Receiver<DeviceMessage> {
        &self.device_events
    }

    /// Apply one device message
    pub fn handle_device_message(&mut self, message: DeviceMessage) {
        match message.engine {
            EngineKind::Remote => self
                .remote
                .handle_device_event(message.ticket, message.event),
            EngineKind::Local => self
                .local
                .handle_device_event(message.ticket, message.event),
        }

        for engine in self.collect_engine_events() {
            self.on_engine_ended(engine);
        }
    }

    /// Apply every device message already waiting
    ///
    /// Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.device_events.try_recv() {
            self.handle_device_message(message);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for a device message, then pump
    ///
    /// Returns how many messages were applied.
    pub fn wait_for_event(&mut self, timeout: Duration) -> usize {
        match self.device_events.recv_timeout(timeout) {
            Ok(message) => {
                self.handle_device_message(message);
                1 + self.pump()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Take the events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Queries =====

    /// Engine currently holding a track
    pub fn active_engine(&self) -> Option<EngineKind> {
        if self.remote.state().has_track() {
            Some(EngineKind::Remote)
        } else if self.local.state().has_track() {
            Some(EngineKind::Local)
        } else {
            None
        }
    }

    /// Track held by the active engine
    pub fn current_track(&self) -> Option<Track> {
        match self.active_engine()? {
            EngineKind::Remote => self.remote.state().active_track.clone().map(Track::Remote),
            EngineKind::Local => self.local.state().active_track.clone().map(Track::Local),
        }
    }

    /// Queue
    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    /// Catalog engine
    pub fn remote(&self) -> &RemoteEngine {
        &self.remote
    }

    /// Local engine
    pub fn local(&self) -> &LocalEngine {
        &self.local
    }

    /// Serializable view of the whole player
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            queue: self.queue.snapshot(),
            remote: self.remote.state().clone(),
            local: self.local.state().clone(),
            active_engine: self.active_engine(),
        }
    }

    // ===== Internal =====

    fn on_engine_ended(&mut self, engine: EngineKind) {
        debug!(?engine, "Track ended, advancing");
        match self.queue.auto_next() {
            Some(track) => self.start_track(track),
            None => {
                info!("Queue finished");
                self.pending_events.push(PlayerEvent::QueueFinished);
            }
        }
        self.collect_engine_events();
    }

    fn start_track(&mut self, track: Track) {
        match track {
            Track::Remote(track) => {
                self.local.stop();
                self.start_remote(track);
            }
            Track::Local(track) => {
                self.remote.stop();
                self.start_local(track);
            }
        }
    }

    fn start_remote(&mut self, track: RemoteTrack) {
        info!(id = %track.id, title = %track.title, "Playing catalog track");
        self.pending_events.push(PlayerEvent::TrackChanged {
            engine: EngineKind::Remote,
            track: Track::Remote(track.clone()),
        });
        self.remote.load(track);
        self.remote.play();
    }

    fn start_local(&mut self, track: LocalTrack) {
        info!(
            collection = %track.collection_name,
            filename = %track.filename,
            "Playing local file"
        );
        self.pending_events.push(PlayerEvent::TrackChanged {
            engine: EngineKind::Local,
            track: Track::Local(track.clone()),
        });
        self.local.load(track);
        self.local.play();
    }

    /// Move engine events into the coordinator's queue
    ///
    /// Returns the engines that reported `Ended`.
    fn collect_engine_events(&mut self) -> Vec<EngineKind> {
        let mut ended = Vec::new();

        for (engine, events) in [
            (EngineKind::Remote, self.remote.drain_events()),
            (EngineKind::Local, self.local.drain_events()),
        ] {
            for event in events {
                if event == EngineEvent::Ended {
                    ended.push(engine);
                }
                self.pending_events
                    .push(PlayerEvent::Engine { engine, event });
            }
        }

        let active = self.active_engine();
        if active != self.last_active {
            self.last_active = active;
            self.pending_events
                .push(PlayerEvent::ActiveEngineChanged { engine: active });
        }

        ended
    }
}
