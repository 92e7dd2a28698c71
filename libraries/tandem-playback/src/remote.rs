//! Engine for catalog tracks

use std::sync::Arc;

use tandem_core::{CatalogStreams, RemoteTrack};

use crate::device::{DeviceEvent, LoadTicket, MediaDevice};
use crate::engine::{EngineCore, EngineState, PlaybackEngine};
use crate::events::EngineEvent;
use crate::types::EngineKind;

/// Plays catalog tracks streamed through the server
pub struct RemoteEngine {
    core: EngineCore<RemoteTrack>,
    streams: Arc<dyn CatalogStreams>,
}

impl RemoteEngine {
    /// Create an idle engine over `device`
    pub fn new(device: Box<dyn MediaDevice>, streams: Arc<dyn CatalogStreams>) -> Self {
        Self {
            core: EngineCore::new(EngineKind::Remote, device),
            streams,
        }
    }

    /// Start at `volume` instead of full volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.core.set_volume(volume);
        self
    }

    /// Whether `track` is the active track
    pub fn is_current(&self, track: &RemoteTrack) -> bool {
        self.core.state().active_track.as_ref() == Some(track)
    }
}

impl PlaybackEngine for RemoteEngine {
    type Track = RemoteTrack;

    fn kind(&self) -> EngineKind {
        EngineKind::Remote
    }

    fn load(&mut self, track: RemoteTrack) {
        let url = self.streams.stream_url(&track.id);
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

    fn state(&self) -> &EngineState<RemoteTrack> {
        self.core.state()
    }

    fn handle_device_event(&mut self, ticket: LoadTicket, event: DeviceEvent) {
        // Live streams often report no duration; the catalog usually knows it
        let hint = match &event {
            DeviceEvent::Loaded { duration } if !(duration.is_finite() && *duration > 0.0) => self
                .core
                .state()
                .active_track
                .as_ref()
                .and_then(|track| track.duration_hint),
            _ => None,
        };

        if ticket == self.core.ticket() {
            if let Some(seconds) = hint {
                self.core.handle_device_event(ticket, DeviceEvent::Loaded { duration: seconds });
                return;
            }
        }
        self.core.handle_device_event(ticket, event);
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.core.drain_events()
    }
}

impl std::fmt::Debug for RemoteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEngine")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}
