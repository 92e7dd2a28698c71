//! Desktop media device
//!
//! [`DesktopDevice`] is a thin handle: every call becomes a [`Command`] on
//! a channel read by a worker thread. The worker owns the output backend
//! and the [`Transport`], spawns a loader thread per `open`, and reports
//! progress on a fixed tick.
//!
//! Loaders stream decoded batches back to the worker, tagged with the
//! ticket of the `open` that started them. The worker only accepts batches
//! for the current ticket and raises the previous loader's cancel flag on
//! every `open` and `stop`, so superseded loads stop decoding and whatever
//! they still send is discarded.
//!
//! `Loaded` is reported once the first batch is buffered and the length
//! is known, which for most containers is long before decoding finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};
use tandem_playback::{DeviceEvent, DeviceEventSender, LoadTicket, MediaDevice, PlaybackError};
use tracing::{debug, trace, warn};

use crate::backend::{default_backend, OutputBackend};
use crate::error::{AudioError, Result};
use crate::loader::{LoadEvent, MediaLoader};
use crate::transport::Transport;

/// Default interval between progress reports
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

/// Commands processed by the worker thread
#[derive(Debug)]
enum Command {
    Open { url: String, ticket: LoadTicket },
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    Stop,
    /// Sent by loader threads
    Stream { ticket: LoadTicket, event: LoadEvent },
    /// Sent by loader threads once the whole file is decoded
    LoadFinished { ticket: LoadTicket },
    /// Sent by loader threads
    LoadFailed { ticket: LoadTicket, message: String },
    Shutdown,
}

/// Desktop implementation of [`MediaDevice`]
///
/// Dropping the device shuts the worker and the backend down.
#[derive(Debug)]
pub struct DesktopDevice {
    commands: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl DesktopDevice {
    /// Device on the default backend with the default tick
    pub fn new(events: DeviceEventSender) -> Result<Self> {
        Self::with_backend(events, default_backend(), DEFAULT_TICK)
    }

    /// Device on `backend`, reporting progress every `tick_interval`
    pub fn with_backend(
        events: DeviceEventSender,
        mut backend: Box<dyn OutputBackend>,
        tick_interval: Duration,
    ) -> Result<Self> {
        let (commands, command_rx) = unbounded::<Command>();
        let transport = Arc::new(Transport::new(backend.sample_rate()));
        backend.start(Arc::clone(&transport))?;

        let loopback = commands.clone();
        let worker = thread::Builder::new()
            .name(format!("tandem-audio-{:?}", events.engine()).to_lowercase())
            .spawn(move || {
                let mut worker = Worker::new(events, transport, loopback);
                worker.run(&command_rx, tick_interval);
                backend.stop();
            })
            .map_err(|e| AudioError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            commands,
            worker: Some(worker),
        })
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AudioError::WorkerStopped)
    }

    /// Send a command whose caller has no way to report failure
    fn send_or_warn(&self, command: Command, operation: &str) {
        if let Err(e) = self.send(command) {
            warn!("{}() on a stopped audio worker: {}", operation, e);
        }
    }
}

impl MediaDevice for DesktopDevice {
    fn open(&mut self, url: &str, ticket: LoadTicket) {
        debug!(url, ticket = ticket.value(), "Opening");
        self.send_or_warn(
            Command::Open {
                url: url.to_string(),
                ticket,
            },
            "open",
        );
    }

    fn play(&mut self) -> tandem_playback::Result<()> {
        self.send(Command::Play).map_err(PlaybackError::from)
    }

    fn pause(&mut self) {
        self.send_or_warn(Command::Pause, "pause");
    }

    fn seek(&mut self, seconds: f64) {
        self.send_or_warn(Command::Seek(seconds), "seek");
    }

    fn set_volume(&mut self, volume: f32) {
        self.send_or_warn(Command::SetVolume(volume), "set_volume");
    }

    fn stop(&mut self) {
        self.send_or_warn(Command::Stop, "stop");
    }
}

impl Drop for DesktopDevice {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// State owned by the worker thread
struct Worker {
    events: DeviceEventSender,
    transport: Arc<Transport>,
    /// Where loader threads post their results
    loopback: Sender<Command>,
    ticket: LoadTicket,
    /// Raised to stop the current loader thread
    cancel: Arc<AtomicBool>,
    /// Between `open` and the `Loaded` report
    loading: bool,
    /// Length declared by the container, if any
    expected_duration: Option<f64>,
    /// `play` arrived while loading
    play_when_loaded: bool,
    ended_sent: bool,
}

impl Worker {
    fn new(events: DeviceEventSender, transport: Arc<Transport>, loopback: Sender<Command>) -> Self {
        Self {
            events,
            transport,
            loopback,
            ticket: LoadTicket::NONE,
            cancel: Arc::new(AtomicBool::new(false)),
            loading: false,
            expected_duration: None,
            play_when_loaded: false,
            ended_sent: false,
        }
    }

    fn run(&mut self, commands: &Receiver<Command>, tick_interval: Duration) {
        let ticker = tick(tick_interval);
        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(Command::Shutdown) | Err(_) => break,
                    Ok(command) => self.handle(command),
                },
                recv(ticker) -> _ => self.tick(),
            }
        }
        self.cancel.store(true, Ordering::SeqCst);
        self.transport.clear();
        debug!(engine = ?self.events.engine(), "Audio worker stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Open { url, ticket } => self.open(url, ticket),
            Command::Play => self.play(),
            Command::Pause => {
                self.play_when_loaded = false;
                if self.transport.is_playing() {
                    self.transport.pause();
                    self.emit(DeviceEvent::PlayStateChanged { is_playing: false });
                }
            }
            Command::Seek(seconds) => {
                self.transport.seek(seconds);
                self.ended_sent = false;
            }
            Command::SetVolume(volume) => self.transport.set_volume(volume),
            Command::Stop => {
                trace!(ticket = self.ticket.value(), "Stopping");
                self.cancel.store(true, Ordering::SeqCst);
                self.ticket = LoadTicket::NONE;
                self.loading = false;
                self.play_when_loaded = false;
                self.transport.clear();
            }
            Command::Stream { ticket, event } => self.stream(ticket, event),
            Command::LoadFinished { ticket } => {
                if ticket != self.ticket {
                    trace!(ticket = ticket.value(), "Dropping stale load completion");
                    return;
                }
                self.transport.finish();
                if self.loading {
                    self.announce(self.transport.duration_seconds());
                }
            }
            Command::LoadFailed { ticket, message } => {
                if ticket != self.ticket {
                    trace!(ticket = ticket.value(), "Dropping stale load failure");
                    return;
                }
                self.loading = false;
                self.play_when_loaded = false;
                self.transport.pause();
                self.transport.finish();
                self.emit(DeviceEvent::Error { message });
            }
            Command::Shutdown => {}
        }
    }

    fn open(&mut self, url: String, ticket: LoadTicket) {
        self.cancel.store(true, Ordering::SeqCst);
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&cancel);

        self.ticket = ticket;
        self.loading = true;
        self.expected_duration = None;
        self.play_when_loaded = false;
        self.ended_sent = false;
        self.transport.begin();

        let target_rate = self.transport.sample_rate();
        let loopback = self.loopback.clone();
        let spawned = thread::Builder::new()
            .name("tandem-loader".into())
            .spawn(move || {
                let result = MediaLoader::new(target_rate).and_then(|loader| {
                    loader.stream(&url, |event| {
                        !cancel.load(Ordering::SeqCst)
                            && loopback.send(Command::Stream { ticket, event }).is_ok()
                    })
                });
                let command = match result {
                    Ok(()) => Command::LoadFinished { ticket },
                    Err(e) => {
                        warn!(%url, "Failed to load media: {}", e);
                        Command::LoadFailed {
                            ticket,
                            message: e.to_string(),
                        }
                    }
                };
                if loopback.send(command).is_err() {
                    trace!("Audio worker gone before the load finished");
                }
            });

        if let Err(e) = spawned {
            self.loading = false;
            self.emit(DeviceEvent::Error {
                message: format!("could not start loader: {}", e),
            });
        }
    }

    fn stream(&mut self, ticket: LoadTicket, event: LoadEvent) {
        if ticket != self.ticket {
            trace!(ticket = ticket.value(), "Dropping stale batch");
            return;
        }

        match event {
            LoadEvent::Duration(seconds) => self.expected_duration = Some(seconds),
            LoadEvent::Samples(samples) => {
                self.transport.append(&samples);
                if let (true, Some(duration)) = (self.loading, self.expected_duration) {
                    self.announce(duration);
                }
            }
        }
    }

    /// Report the track as loaded and honour a pending `play`
    fn announce(&mut self, duration: f64) {
        self.loading = false;
        self.emit(DeviceEvent::Loaded { duration });

        if self.play_when_loaded {
            self.play_when_loaded = false;
            self.play();
        }
    }

    fn play(&mut self) {
        if self.loading {
            self.play_when_loaded = true;
            return;
        }
        if self.transport.is_playing() {
            return;
        }
        if self.transport.play() {
            self.ended_sent = false;
            self.emit(DeviceEvent::PlayStateChanged { is_playing: true });
        } else {
            debug!("play() with no media open");
        }
    }

    fn tick(&mut self) {
        if self.ticket == LoadTicket::NONE || self.loading {
            return;
        }

        if self.transport.is_playing() {
            self.emit(DeviceEvent::TimeUpdate {
                position: self.transport.position_seconds(),
            });
        } else if self.transport.is_finished() && !self.ended_sent {
            self.ended_sent = true;
            self.emit(DeviceEvent::Ended);
        }
    }

    fn emit(&self, event: DeviceEvent) {
        if !self.events.emit(self.ticket, event) {
            trace!("Event receiver gone");
        }
    }
}
