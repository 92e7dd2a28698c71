//! Tandem Core
//!
//! Platform-agnostic track model, traits, and error handling shared by the
//! Tandem player crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `RemoteTrack`, `LocalTrack` and the `Track` union
//! - **Core Traits**: `CatalogStreams`, `LocalStreams` (how a track becomes a playable URL)
//! - **Error Handling**: Unified `TandemError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tandem_core::{LocalTrack, RemoteTrack, Track};
//!
//! let song = Track::Remote(RemoteTrack::new("dQw4w9WgXcQ", "Song", "Artist"));
//! let file = Track::Local(LocalTrack::new("MyMix", "intro.mp3", "Intro", 1_024));
//!
//! assert!(song.is_remote());
//! assert_eq!(file.title(), "Intro");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, TandemError};
pub use traits::{CatalogStreams, LocalStreams};
pub use types::{LocalTrack, RemoteKind, RemoteTrack, Track, TrackKey};
