//! Interactive playback session
//!
//! Builds the coordinator on two desktop devices and runs the event loop:
//! stdin keys and device events are multiplexed on one thread, so the
//! coordinator is never shared.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use crossbeam_channel::{never, select, unbounded, Receiver};
use tandem_audio_desktop::DesktopDevice;
use tandem_core::{LocalTrack, RemoteTrack, Track};
use tandem_playback::{
    EngineEvent, EngineKind, LocalEngine, PlaybackCoordinator, PlayerChannels, PlayerEvent,
    QueueManager, RemoteEngine,
};
use tandem_server_client::StreamUrls;
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::keys::{self, Key, HELP};

/// What the session starts playing
#[derive(Debug, Clone)]
pub enum Selection {
    /// Catalog tracks, played from the first
    Remote(Vec<RemoteTrack>),

    /// One local collection, played from `start`
    Local {
        collection: String,
        tracks: Vec<LocalTrack>,
        start: usize,
    },
}

impl Selection {
    pub fn len(&self) -> usize {
        match self {
            Selection::Remote(tracks) => tracks.len(),
            Selection::Local { tracks, .. } => tracks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Play `selection` until the user quits
pub fn run(config: &CliConfig, streams: StreamUrls, selection: Selection) -> Result<()> {
    let mut player = build_player(config, streams)?;
    start(&mut player, selection)?;
    report(&mut player);

    println!("{}", HELP);

    let mut input = spawn_stdin_reader();
    let device_events = player.device_events().clone();
    let mut stdin_open = true;

    loop {
        select! {
            recv(input) -> key => match key {
                Ok(Key::Quit) => break,
                Ok(key) => {
                    if let Some(output) = keys::apply(&mut player, key)? {
                        println!("{}", output);
                    }
                }
                Err(_) => {
                    debug!("stdin closed, playing until the queue finishes");
                    stdin_open = false;
                    input = never();
                }
            },
            recv(device_events) -> message => match message {
                Ok(message) => player.handle_device_message(message),
                Err(_) => bail!("audio devices stopped"),
            },
        }

        if report(&mut player) && !stdin_open {
            break;
        }
    }

    player.stop();
    info!("Session ended");
    Ok(())
}

fn build_player(config: &CliConfig, streams: StreamUrls) -> Result<PlaybackCoordinator> {
    let playback = config.playback_config();
    let channels = PlayerChannels::new();

    let remote_device = DesktopDevice::new(channels.sender(EngineKind::Remote))
        .context("failed to open audio output for catalog playback")?;
    let local_device = DesktopDevice::new(channels.sender(EngineKind::Local))
        .context("failed to open audio output for local playback")?;

    let streams = Arc::new(streams);
    Ok(PlaybackCoordinator::new(
        QueueManager::with_config(&playback),
        RemoteEngine::new(Box::new(remote_device), streams.clone()).with_volume(playback.volume),
        LocalEngine::new(Box::new(local_device), streams).with_volume(playback.volume),
        channels.into_receiver(),
    ))
}

/// Queue `selection` and start its first track
pub fn start(player: &mut PlaybackCoordinator, selection: Selection) -> Result<()> {
    match selection {
        Selection::Remote(tracks) => {
            let Some(first) = tracks.first().cloned() else {
                bail!("nothing to play");
            };
            player.play_remote(first, Some(tracks), Some(0));
        }
        Selection::Local {
            collection,
            tracks,
            start,
        } => {
            let Some(track) = tracks.get(start).cloned() else {
                bail!(
                    "start index {} is out of range for {} tracks in '{}'",
                    start,
                    tracks.len(),
                    collection
                );
            };
            player.play_local(&collection, track, Some(tracks), Some(start));
        }
    }

    Ok(())
}

/// Print what happened since the last call
///
/// Returns `true` once the queue has run out.
fn report(player: &mut PlaybackCoordinator) -> bool {
    let mut finished = false;
    for event in player.drain_events() {
        match event {
            PlayerEvent::TrackChanged { track, .. } => println!("Now playing: {}", describe(&track)),
            PlayerEvent::Engine { event, .. } => match event {
                EngineEvent::PlayStateChanged { is_playing } => {
                    println!("{}", if is_playing { "Playing" } else { "Paused" });
                }
                EngineEvent::Error { message } => println!("Error: {}", message),
                EngineEvent::Loaded { duration } => debug!(duration, "Loaded"),
                EngineEvent::TimeUpdate { .. } | EngineEvent::Ended => {}
            },
            PlayerEvent::ShuffleChanged { enabled } => {
                println!("Shuffle: {}", if enabled { "on" } else { "off" });
            }
            PlayerEvent::RepeatChanged { mode } => println!("Repeat: {:?}", mode),
            PlayerEvent::QueueChanged { len } => debug!(len, "Queue replaced"),
            PlayerEvent::ActiveEngineChanged { engine } => debug!(?engine, "Active engine"),
            PlayerEvent::QueueFinished => {
                println!("Queue finished");
                finished = true;
            }
        }
    }
    finished
}

fn describe(track: &Track) -> String {
    match track {
        Track::Remote(track) => format!("{} by {}", track.title, track.artist),
        Track::Local(track) => format!("{} [{}]", track.title, track.collection_name),
    }
}

fn spawn_stdin_reader() -> Receiver<Key> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Key>() {
                Ok(key) => {
                    if tx.send(key).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{} ({})", e, HELP),
            }
        }
    });
    rx
}
