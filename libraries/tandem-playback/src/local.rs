//! Engine for files in local collections

use std::sync::Arc;

use tandem_core::{LocalStreams, LocalTrack};

use crate::device::{DeviceEvent, LoadTicket, MediaDevice};
use crate::engine::{EngineCore, EngineState, PlaybackEngine};
use crate::events::EngineEvent;
use crate::types::EngineKind;

/// Plays files served from local collections
pub struct LocalEngine {
    core: EngineCore<LocalTrack>,
    streams: Arc<dyn LocalStreams>,
}

impl LocalEngine {
    /// Create an idle engine over `device`
    pub fn new(device: Box<dyn MediaDevice>, streams: Arc<dyn LocalStreams>) -> Self {
        Self {
            core: EngineCore::new(EngineKind::Local, device),
            streams,
        }
    }

    /// Start at `volume` instead of full volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.core.set_volume(volume);
        self
    }

    /// Collection of the active track
    pub fn current_collection(&self) -> Option<&str> {
        self.core
            .state()
            .active_track
            .as_ref()
            .map(|track| track.collection_name.as_str())
    }

    /// Whether `filename` from `collection` is the active track
    pub fn is_current(&self, collection: &str, filename: &str) -> bool {
        self.core
            .state()
            .active_track
            .as_ref()
            .is_some_and(|track| track.is_in(collection) && track.filename == filename)
    }
}

impl PlaybackEngine for LocalEngine {
    type Track = LocalTrack;

    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    fn load(&mut self, track: LocalTrack) {
        let url = self
            .streams
            .stream_url(&track.collection_name, &track.filename);
        self.core.load(track, url);
    }

    fn play(&mut self) {
        self.core.play();
    }

    fn pause(&mut self) {
        self.core.pause();
    }

    fn seek(&mut self, seconds: f64) {
        self.core.seek(seconds);
    }

    fn set_volume(&mut self, volume: f32) {
        self.core.set_volume(volume);
    }

    fn stop(&mut self) {
        self.core.stop();
    }

    fn state(&self) -> &EngineState<LocalTrack> {
        self.core.state()
    }

    fn handle_device_event(&mut self, ticket: LoadTicket, event: DeviceEvent) {
        self.core.handle_device_event(ticket, event);
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.core.drain_events()
    }
}

impl std::fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEngine")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}
