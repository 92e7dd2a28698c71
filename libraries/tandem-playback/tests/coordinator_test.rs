//! Coordinator integration tests
//!
//! Drives the coordinator with scripted devices and checks engine
//! exclusivity, auto-advance and failure handling.

use std::sync::Arc;
use std::time::Duration;

use tandem_core::{LocalTrack, RemoteTrack, Track};
use tandem_playback::testing::{CommandLog, DeviceCommand, ScriptedDevice, ScriptedHandle, StaticStreams};
use tandem_playback::{
    DeviceEvent, EngineEvent, EngineKind, LocalEngine, PlaybackCoordinator, PlaybackEngine,
    PlayerChannels, PlayerEvent, QueueManager, RemoteEngine, RepeatMode,
};

// ===== Test Helpers =====

struct Rig {
    player: PlaybackCoordinator,
    remote: ScriptedHandle,
    local: ScriptedHandle,
    log: CommandLog,
}

fn rig_with(streams: StaticStreams) -> Rig {
    let channels = PlayerChannels::new();
    let log = CommandLog::new();
    let (remote_device, remote) =
        ScriptedDevice::with_log(channels.sender(EngineKind::Remote), log.clone());
    let (local_device, local) =
        ScriptedDevice::with_log(channels.sender(EngineKind::Local), log.clone());
    let streams = Arc::new(streams);

    let player = PlaybackCoordinator::new(
        QueueManager::with_seed(42),
        RemoteEngine::new(Box::new(remote_device), streams.clone()),
        LocalEngine::new(Box::new(local_device), streams),
        channels.into_receiver(),
    );

    Rig {
        player,
        remote,
        local,
        log,
    }
}

fn rig() -> Rig {
    rig_with(StaticStreams::new())
}

fn songs(ids: &[&str]) -> Vec<RemoteTrack> {
    ids.iter()
        .map(|id| RemoteTrack::new(*id, format!("Song {}", id), "Artist"))
        .collect()
}

fn mix(files: &[&str]) -> Vec<LocalTrack> {
    files
        .iter()
        .map(|f| LocalTrack::new("MyMix", *f, f.trim_end_matches(".mp3"), 1_000))
        .collect()
}

fn playing_id(player: &PlaybackCoordinator) -> Option<String> {
    match player.current_track()? {
        Track::Remote(t) => Some(t.id),
        Track::Local(t) => Some(t.filename),
    }
}

// ===== Starting Playback =====

#[test]
fn test_play_remote_loads_and_plays() {
    let mut rig = rig();
    let list = songs(&["a", "b"]);

    rig.player.play_remote(list[0].clone(), Some(list.clone()), None);

    assert_eq!(rig.remote.last_url().as_deref(), Some("mem://remote/a"));
    assert!(rig.remote.commands().contains(&DeviceCommand::Play));

    let state = rig.player.remote().state();
    assert!(state.is_playing);
    assert!(state.is_loading);
    assert_eq!(rig.player.active_engine(), Some(EngineKind::Remote));
    assert_eq!(rig.player.queue().len(), 2);
}

#[test]
fn test_start_index_found_by_identity_when_omitted() {
    let mut rig = rig();
    let list = songs(&["a", "b", "c"]);

    rig.player.play_remote(list[2].clone(), Some(list), None);
    assert_eq!(rig.player.queue().cursor(), Some(2));
}

#[test]
fn test_play_remote_without_items_keeps_queue() {
    let mut rig = rig();
    let list = songs(&["a", "b"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));

    rig.player
        .play_remote(RemoteTrack::new("z", "Single", "Artist"), None, None);

    assert_eq!(rig.player.queue().len(), 2);
    assert_eq!(playing_id(&rig.player).as_deref(), Some("z"));
}

#[test]
fn test_loaded_event_clears_loading_and_sets_duration() {
    let mut rig = rig();
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);

    rig.remote.emit(DeviceEvent::Loaded { duration: 181.5 });
    assert_eq!(rig.player.pump(), 1);

    let state = rig.player.remote().state();
    assert!(!state.is_loading);
    assert_eq!(state.duration_seconds, 181.5);
}

#[test]
fn test_remote_uses_catalog_duration_when_device_has_none() {
    let mut rig = rig();
    let track = RemoteTrack::new("live", "Live", "X").with_duration_hint(240.0);
    rig.player.play_remote(track, None, None);

    rig.remote.emit(DeviceEvent::Loaded { duration: f64::NAN });
    rig.player.pump();

    assert_eq!(rig.player.remote().state().duration_seconds, 240.0);
}

// ===== Engine Exclusivity =====

#[test]
fn test_switch_to_local_stops_remote_before_loading() {
    let mut rig = rig();
    let list = songs(&["a"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));
    rig.log.clear();

    let files = mix(&["x.mp3", "y.mp3"]);
    rig.player
        .play_local("MyMix", files[0].clone(), Some(files), Some(0));

    let stop = rig
        .log
        .position(|engine, cmd| engine == EngineKind::Remote && *cmd == DeviceCommand::Stop)
        .expect("remote stopped");
    let open = rig
        .log
        .position(|engine, cmd| {
            engine == EngineKind::Local && matches!(cmd, DeviceCommand::Open { .. })
        })
        .expect("local opened");
    assert!(stop < open);

    let snapshot = rig.player.snapshot();
    assert_eq!(snapshot.remote.active_track, None);
    assert_eq!(snapshot.local.active_track.map(|t| t.filename).as_deref(), Some("x.mp3"));
    assert_eq!(snapshot.active_engine, Some(EngineKind::Local));
    assert_eq!(snapshot.queue.kind, Some(EngineKind::Local));
    assert_eq!(snapshot.queue.items.len(), 2);
    assert_eq!(snapshot.queue.collection_label.as_deref(), Some("MyMix"));
}

#[test]
fn test_switch_to_remote_stops_local() {
    let mut rig = rig();
    let files = mix(&["x.mp3"]);
    rig.player
        .play_local("MyMix", files[0].clone(), Some(files), None);

    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);

    assert!(rig.player.local().state().active_track.is_none());
    assert_eq!(rig.player.active_engine(), Some(EngineKind::Remote));
}

#[test]
fn test_replaying_loaded_local_track_toggles() {
    let mut rig = rig();
    let files = mix(&["x.mp3", "y.mp3"]);
    rig.player
        .play_local("MyMix", files[0].clone(), Some(files.clone()), Some(0));
    assert!(rig.player.local().state().is_playing);

    rig.player
        .play_local("MyMix", files[0].clone(), Some(files.clone()), Some(0));
    assert!(!rig.player.local().state().is_playing);
    assert_eq!(rig.player.local().state().active_track.as_ref(), Some(&files[0]));

    let opens = rig
        .local
        .commands()
        .iter()
        .filter(|c| matches!(c, DeviceCommand::Open { .. }))
        .count();
    assert_eq!(opens, 1);

    rig.player
        .play_local("MyMix", files[0].clone(), None, None);
    assert!(rig.player.local().state().is_playing);
}

#[test]
fn test_same_filename_other_collection_reloads() {
    let mut rig = rig();
    let files = mix(&["x.mp3"]);
    rig.player.play_local("MyMix", files[0].clone(), None, None);

    let other = LocalTrack::new("Other", "x.mp3", "x", 1);
    rig.player.play_local("Other", other, None, None);

    assert_eq!(rig.local.last_url().as_deref(), Some("mem://local/Other/x.mp3"));
    assert_eq!(rig.player.local().current_collection(), Some("Other"));
}

// ===== Auto-advance =====

#[test]
fn test_ended_advances_to_next_track() {
    let mut rig = rig();
    let list = songs(&["a", "b", "c"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));

    rig.remote.emit(DeviceEvent::Ended);
    rig.player.pump();

    assert_eq!(playing_id(&rig.player).as_deref(), Some("b"));
    assert_eq!(rig.remote.last_url().as_deref(), Some("mem://remote/b"));
    assert!(rig.player.remote().state().is_playing);
}

#[test]
fn test_ended_at_end_of_queue_goes_idle() {
    let mut rig = rig();
    let list = songs(&["a", "b"]);
    rig.player.play_remote(list[1].clone(), Some(list), Some(1));
    rig.player.drain_events();

    rig.remote.emit(DeviceEvent::Ended);
    rig.player.pump();

    let state = rig.player.remote().state();
    assert!(!state.is_playing);
    assert_eq!(state.active_track.as_ref().map(|t| t.id.as_str()), Some("b"));

    let events = rig.player.drain_events();
    assert!(events.contains(&PlayerEvent::QueueFinished));
    assert!(!events
        .iter()
        .any(|e| matches!(e, PlayerEvent::TrackChanged { .. })));
}

#[test]
fn test_ended_reported_once_per_load() {
    let mut rig = rig();
    let list = songs(&["a", "b", "c"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));

    let ticket = rig.remote.last_ticket();
    rig.remote.emit(DeviceEvent::Ended);
    rig.remote.emit_with_ticket(ticket, DeviceEvent::Ended);
    rig.player.pump();

    // Second Ended belongs to a superseded load
    assert_eq!(playing_id(&rig.player).as_deref(), Some("b"));
}

#[test]
fn test_repeat_one_reloads_same_track() {
    let mut rig = rig();
    let list = songs(&["a", "b"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));
    rig.player.cycle_repeat_mode();
    assert_eq!(rig.player.cycle_repeat_mode(), RepeatMode::One);

    let first_ticket = rig.remote.last_ticket();
    rig.remote.emit(DeviceEvent::Ended);
    rig.player.pump();

    assert_eq!(playing_id(&rig.player).as_deref(), Some("a"));
    assert!(rig.remote.last_ticket() > first_ticket);
    assert!(rig.player.remote().state().is_playing);
}

#[test]
fn test_local_queue_advances_on_local_engine() {
    let mut rig = rig();
    let files = mix(&["x.mp3", "y.mp3"]);
    rig.player
        .play_local("MyMix", files[0].clone(), Some(files), Some(0));

    rig.local.emit(DeviceEvent::Ended);
    rig.player.pump();

    assert_eq!(playing_id(&rig.player).as_deref(), Some("y.mp3"));
    assert_eq!(rig.player.active_engine(), Some(EngineKind::Local));
}

#[test]
fn test_stale_events_after_stop_are_ignored() {
    let mut rig = rig();
    let list = songs(&["a", "b"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));
    let ticket = rig.remote.last_ticket();

    rig.player.stop();
    rig.remote
        .emit_with_ticket(ticket, DeviceEvent::TimeUpdate { position: 12.0 });
    rig.remote.emit_with_ticket(ticket, DeviceEvent::Ended);
    rig.player.pump();

    assert_eq!(rig.player.active_engine(), None);
    assert_eq!(rig.player.remote().state().position_seconds, 0.0);
}

#[test]
fn test_wait_for_event_times_out_when_quiet() {
    let mut rig = rig();
    assert_eq!(rig.player.wait_for_event(Duration::from_millis(10)), 0);

    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);
    rig.remote.emit(DeviceEvent::TimeUpdate { position: 1.0 });
    rig.remote.emit(DeviceEvent::TimeUpdate { position: 2.0 });
    assert_eq!(rig.player.wait_for_event(Duration::from_millis(100)), 2);
    assert_eq!(rig.player.remote().state().position_seconds, 2.0);
}

// ===== Navigation =====

#[test]
fn test_next_and_previous_route_to_queue_engine() {
    let mut rig = rig();
    let list = songs(&["a", "b", "c"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));

    rig.player.next();
    assert_eq!(playing_id(&rig.player).as_deref(), Some("b"));
    rig.player.previous();
    assert_eq!(playing_id(&rig.player).as_deref(), Some("a"));

    // Nothing before the first track: keep playing it
    rig.player.previous();
    assert_eq!(playing_id(&rig.player).as_deref(), Some("a"));
    assert!(rig.player.has_next());
    assert!(!rig.player.has_previous());
}

// ===== Transport =====

#[test]
fn test_transport_goes_to_active_engine_only() {
    let mut rig = rig();
    let files = mix(&["x.mp3"]);
    rig.player.play_local("MyMix", files[0].clone(), None, None);
    rig.local.emit(DeviceEvent::Loaded { duration: 100.0 });
    rig.player.pump();
    rig.log.clear();

    rig.player.seek(30.0);
    rig.player.set_volume(0.5);
    rig.player.toggle_play();

    assert!(rig.remote.commands().is_empty());
    assert_eq!(
        rig.local.commands(),
        vec![
            DeviceCommand::Seek(30.0),
            DeviceCommand::SetVolume(0.5),
            DeviceCommand::Pause,
        ]
    );
    assert_eq!(rig.player.local().state().volume, 0.5);
    assert_eq!(rig.player.remote().state().volume, 1.0);
}

#[test]
fn test_seek_clamps_and_updates_optimistically() {
    let mut rig = rig();
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);
    rig.remote.emit(DeviceEvent::Loaded { duration: 60.0 });
    rig.player.pump();

    rig.player.seek(75.0);
    assert_eq!(rig.player.remote().state().position_seconds, 60.0);
    rig.player.seek(-4.0);
    assert_eq!(rig.player.remote().state().position_seconds, 0.0);

    rig.player.seek_by(10.0);
    assert_eq!(rig.player.remote().state().position_seconds, 10.0);

    // Device confirmation overwrites the prediction
    rig.remote.emit(DeviceEvent::TimeUpdate { position: 9.5 });
    rig.player.pump();
    assert_eq!(rig.player.remote().state().position_seconds, 9.5);
}

#[test]
fn test_seek_after_end_resumes_from_seek_position() {
    let mut rig = rig();
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);
    rig.remote.emit(DeviceEvent::Loaded { duration: 100.0 });
    rig.remote.emit(DeviceEvent::Ended);
    rig.player.pump();
    assert!(!rig.player.remote().state().is_playing);

    rig.player.seek(42.0);
    rig.player.toggle_play();

    let state = rig.player.remote().state();
    assert!(state.is_playing);
    assert_eq!(state.position_seconds, 42.0);
    assert_eq!(
        rig.remote.commands().last(),
        Some(&DeviceCommand::Play),
        "no rewind between the seek and play"
    );
    assert!(!rig.remote.commands().contains(&DeviceCommand::Seek(0.0)));
}

#[test]
fn test_play_after_end_without_seek_restarts() {
    let mut rig = rig();
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);
    rig.remote.emit(DeviceEvent::Loaded { duration: 100.0 });
    rig.remote.emit(DeviceEvent::Ended);
    rig.player.pump();

    rig.player.toggle_play();

    assert!(rig.player.remote().state().is_playing);
    assert_eq!(rig.player.remote().state().position_seconds, 0.0);
    assert!(rig.remote.commands().contains(&DeviceCommand::Seek(0.0)));
}

#[test]
fn test_volume_is_clamped() {
    let mut rig = rig();
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);

    rig.player.set_volume(1.7);
    assert_eq!(rig.player.remote().state().volume, 1.0);
    rig.player.set_volume(-0.2);
    assert_eq!(rig.player.remote().state().volume, 0.0);
}

#[test]
fn test_commands_with_nothing_loaded_are_noops() {
    let mut rig = rig();
    rig.player.toggle_play();
    rig.player.seek(10.0);
    rig.player.next();
    rig.player.previous();
    rig.player.stop();

    assert_eq!(rig.player.active_engine(), None);
    assert!(rig.remote.commands().iter().all(|c| *c == DeviceCommand::Stop));
}

// ===== Failures =====

#[test]
fn test_unresolvable_track_records_error_without_advancing() {
    let mut rig = rig_with(StaticStreams::new().with_unavailable("b"));
    let list = songs(&["a", "b", "c"]);
    rig.player.play_remote(list[1].clone(), Some(list), Some(1));

    let state = rig.player.remote().state();
    assert!(state.error.is_some());
    assert!(!state.is_playing);
    assert!(!state.is_loading);
    assert_eq!(playing_id(&rig.player).as_deref(), Some("b"));
    assert_eq!(rig.player.queue().cursor(), Some(1));

    // play() again just re-reports the failure
    rig.player.drain_events();
    rig.player.toggle_play();
    let events = rig.player.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        PlayerEvent::Engine {
            event: EngineEvent::Error { .. },
            ..
        }
    )));

    // Explicit next recovers
    rig.player.next();
    assert_eq!(playing_id(&rig.player).as_deref(), Some("c"));
    assert!(rig.player.remote().state().error.is_none());
}

#[test]
fn test_device_error_while_loading_is_load_failure() {
    let mut rig = rig();
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);
    rig.remote.emit(DeviceEvent::Error {
        message: "404".to_string(),
    });
    rig.player.pump();

    let state = rig.player.remote().state();
    assert_eq!(state.error.as_deref(), Some("Failed to load media: 404"));
    assert_eq!(state.position_seconds, 0.0);
    assert_eq!(state.duration_seconds, 0.0);
}

#[test]
fn test_device_refusing_play_is_playback_failure() {
    let mut rig = rig();
    rig.remote.fail_next_play("output busy");
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);

    let state = rig.player.remote().state();
    assert_eq!(state.error.as_deref(), Some("Playback failed: output busy"));
    assert!(!state.is_playing);
}

// ===== Events =====

#[test]
fn test_events_report_track_and_engine_changes() {
    let mut rig = rig();
    let list = songs(&["a"]);
    rig.player.play_remote(list[0].clone(), Some(list), Some(0));

    let events = rig.player.drain_events();
    assert!(events.contains(&PlayerEvent::QueueChanged { len: 1 }));
    assert!(events.contains(&PlayerEvent::ActiveEngineChanged {
        engine: Some(EngineKind::Remote)
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        PlayerEvent::TrackChanged {
            engine: EngineKind::Remote,
            ..
        }
    )));

    rig.player.stop();
    let events = rig.player.drain_events();
    assert!(events.contains(&PlayerEvent::ActiveEngineChanged { engine: None }));
}

#[test]
fn test_snapshot_serializes() {
    let mut rig = rig();
    rig.player
        .play_remote(RemoteTrack::new("a", "A", "X"), None, None);
    let json = serde_json::to_value(rig.player.snapshot()).unwrap();

    assert_eq!(json["activeEngine"], "remote");
    assert_eq!(json["remote"]["activeTrack"]["id"], "a");
    assert_eq!(json["local"]["activeTrack"], serde_json::Value::Null);
}

#[test]
fn test_auto_loading_device_reports_duration() {
    let mut rig = rig();
    rig.local.auto_load(42.0);
    let files = mix(&["x.mp3"]);
    rig.player.play_local("MyMix", files[0].clone(), None, None);

    assert_eq!(rig.player.pump(), 1);
    let state = rig.player.local().state();
    assert!(!state.is_loading);
    assert!(state.is_playing);
    assert_eq!(state.duration_seconds, 42.0);
}
