//! Domain types

mod track;

pub use track::{LocalTrack, RemoteKind, RemoteTrack, Track, TrackKey};
