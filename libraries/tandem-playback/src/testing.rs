//! Scripted device and stream resolvers
//!
//! Used by this crate's tests and by hosts that want to drive the
//! coordinator without audio hardware. The scripted device renders
//! nothing; it records every command and lets the caller emit events as
//! if a real device had produced them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tandem_core::{CatalogStreams, LocalStreams, Result as CoreResult, TandemError};

use crate::device::{DeviceEvent, DeviceEventSender, LoadTicket, MediaDevice};
use crate::error::{PlaybackError, Result};
use crate::types::EngineKind;

/// Command received by a scripted device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// `open(url, ticket)`
    Open { url: String, ticket: LoadTicket },
    /// `play()`
    Play,
    /// `pause()`
    Pause,
    /// `seek(seconds)`
    Seek(f64),
    /// `set_volume(volume)`
    SetVolume(f32),
    /// `stop()`
    Stop,
}

/// Commands from every scripted device sharing the log, in call order
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<(EngineKind, DeviceCommand)>>>,
}

impl CommandLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded command
    pub fn entries(&self) -> Vec<(EngineKind, DeviceCommand)> {
        lock(&self.entries).clone()
    }

    /// Position of the first entry matching `predicate`
    pub fn position(&self, predicate: impl Fn(EngineKind, &DeviceCommand) -> bool) -> Option<usize> {
        lock(&self.entries)
            .iter()
            .position(|(engine, command)| predicate(*engine, command))
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    fn record(&self, engine: EngineKind, command: DeviceCommand) {
        lock(&self.entries).push((engine, command));
    }
}

#[derive(Debug, Default)]
struct Script {
    ticket: LoadTicket,
    auto_load: Option<f64>,
    fail_play: Option<String>,
}

/// Device that records commands instead of rendering audio
#[derive(Debug)]
pub struct ScriptedDevice {
    sender: DeviceEventSender,
    log: CommandLog,
    script: Arc<Mutex<Script>>,
}

/// Test-side handle to a [`ScriptedDevice`] owned by an engine
#[derive(Debug, Clone)]
pub struct ScriptedHandle {
    sender: DeviceEventSender,
    log: CommandLog,
    script: Arc<Mutex<Script>>,
}

impl ScriptedDevice {
    /// Create a device reporting through `sender`, plus a handle to script it
    pub fn new(sender: DeviceEventSender) -> (Self, ScriptedHandle) {
        Self::with_log(sender, CommandLog::new())
    }

    /// Like [`ScriptedDevice::new`], recording into a shared log
    pub fn with_log(sender: DeviceEventSender, log: CommandLog) -> (Self, ScriptedHandle) {
        let script = Arc::new(Mutex::new(Script::default()));
        let handle = ScriptedHandle {
            sender: sender.clone(),
            log: log.clone(),
            script: Arc::clone(&script),
        };
        (
            Self {
                sender,
                log,
                script,
            },
            handle,
        )
    }

    fn record(&self, command: DeviceCommand) {
        self.log.record(self.sender.engine(), command);
    }
}

impl MediaDevice for ScriptedDevice {
    fn open(&mut self, url: &str, ticket: LoadTicket) {
        self.record(DeviceCommand::Open {
            url: url.to_string(),
            ticket,
        });
        let auto_load = {
            let mut script = lock(&self.script);
            script.ticket = ticket;
            script.auto_load
        };
        if let Some(duration) = auto_load {
            self.sender.emit(ticket, DeviceEvent::Loaded { duration });
        }
    }

    fn play(&mut self) -> Result<()> {
        self.record(DeviceCommand::Play);
        match lock(&self.script).fail_play.take() {
            Some(message) => Err(PlaybackError::PlaybackFailure(message)),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {
        self.record(DeviceCommand::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.record(DeviceCommand::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(DeviceCommand::SetVolume(volume));
    }

    fn stop(&mut self) {
        self.record(DeviceCommand::Stop);
    }
}

impl ScriptedHandle {
    /// Emit `event` under the most recently opened ticket
    pub fn emit(&self, event: DeviceEvent) {
        let ticket = lock(&self.script).ticket;
        self.sender.emit(ticket, event);
    }

    /// Emit `event` under an explicit ticket
    pub fn emit_with_ticket(&self, ticket: LoadTicket, event: DeviceEvent) {
        self.sender.emit(ticket, event);
    }

    /// Ticket of the most recent `open`
    pub fn last_ticket(&self) -> LoadTicket {
        lock(&self.script).ticket
    }

    /// Report `Loaded` with `duration` as soon as media is opened
    pub fn auto_load(&self, duration: f64) {
        lock(&self.script).auto_load = Some(duration);
    }

    /// Make the next `play` call fail with `message`
    pub fn fail_next_play(&self, message: impl Into<String>) {
        lock(&self.script).fail_play = Some(message.into());
    }

    /// Commands this device received
    pub fn commands(&self) -> Vec<DeviceCommand> {
        let engine = self.sender.engine();
        self.log
            .entries()
            .into_iter()
            .filter(|(kind, _)| *kind == engine)
            .map(|(_, command)| command)
            .collect()
    }

    /// URL of the most recent `open`
    pub fn last_url(&self) -> Option<String> {
        self.commands().into_iter().rev().find_map(|command| match command {
            DeviceCommand::Open { url, .. } => Some(url),
            _ => None,
        })
    }
}

/// Resolves tracks to `mem://` URLs
///
/// Track ids and collection names listed as unavailable fail to resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticStreams {
    unavailable: Vec<String>,
}

impl StaticStreams {
    /// Resolver where everything is available
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` (a track id or collection) fail to resolve
    pub fn with_unavailable(mut self, name: impl Into<String>) -> Self {
        self.unavailable.push(name.into());
        self
    }

    fn check(&self, name: &str) -> CoreResult<()> {
        if self.unavailable.iter().any(|u| u == name) {
            Err(TandemError::unresolvable(name, "not available"))
        } else {
            Ok(())
        }
    }
}

impl CatalogStreams for StaticStreams {
    fn stream_url(&self, track_id: &str) -> CoreResult<String> {
        self.check(track_id)?;
        Ok(format!("mem://remote/{}", track_id))
    }
}

impl LocalStreams for StaticStreams {
    fn stream_url(&self, collection: &str, filename: &str) -> CoreResult<String> {
        self.check(collection)?;
        Ok(format!("mem://local/{}/{}", collection, filename))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
