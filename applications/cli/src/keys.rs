//! Interactive key commands

use std::str::FromStr;

use anyhow::Result;
use tandem_playback::{EngineKind, PlaybackCoordinator, PlaybackEngine};

/// Volume change per `+`/`-`
pub const VOLUME_STEP: f32 = 0.1;

/// Seek distance per `f`/`w`, in seconds
pub const SEEK_STEP: f64 = 10.0;

pub const HELP: &str = "keys: p play/pause, n next, b previous, s shuffle, r repeat, \
+/- volume, f/w seek, i info, x stop, q quit";

/// One line of stdin, parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    TogglePlay,
    Next,
    Previous,
    ToggleShuffle,
    CycleRepeat,
    VolumeUp,
    VolumeDown,
    SeekForward,
    SeekBack,
    Info,
    Stop,
    Quit,
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "p" => Ok(Key::TogglePlay),
            "n" => Ok(Key::Next),
            "b" => Ok(Key::Previous),
            "s" => Ok(Key::ToggleShuffle),
            "r" => Ok(Key::CycleRepeat),
            "+" => Ok(Key::VolumeUp),
            "-" => Ok(Key::VolumeDown),
            "f" => Ok(Key::SeekForward),
            "w" => Ok(Key::SeekBack),
            "i" => Ok(Key::Info),
            "x" => Ok(Key::Stop),
            "q" => Ok(Key::Quit),
            other => Err(format!("unknown key '{}'", other)),
        }
    }
}

/// Apply `key` to the player
///
/// `Info` returns the snapshot as JSON; everything else returns `None`.
/// `Quit` is left to the caller.
pub fn apply(player: &mut PlaybackCoordinator, key: Key) -> Result<Option<String>> {
    match key {
        Key::TogglePlay => player.toggle_play(),
        Key::Next => player.next(),
        Key::Previous => player.previous(),
        Key::ToggleShuffle => {
            player.toggle_shuffle();
        }
        Key::CycleRepeat => {
            player.cycle_repeat_mode();
        }
        Key::VolumeUp => nudge_volume(player, VOLUME_STEP),
        Key::VolumeDown => nudge_volume(player, -VOLUME_STEP),
        Key::SeekForward => player.seek_by(SEEK_STEP),
        Key::SeekBack => player.seek_by(-SEEK_STEP),
        Key::Info => return Ok(Some(serde_json::to_string_pretty(&player.snapshot())?)),
        Key::Stop => player.stop(),
        Key::Quit => {}
    }
    Ok(None)
}

fn nudge_volume(player: &mut PlaybackCoordinator, delta: f32) {
    let current = match player.active_engine() {
        Some(EngineKind::Remote) => player.remote().state().volume,
        Some(EngineKind::Local) => player.local().state().volume,
        None => return,
    };
    player.set_volume(current + delta);
}
