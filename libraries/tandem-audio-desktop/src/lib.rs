//! Desktop media device for the Tandem player
//!
//! This crate provides [`DesktopDevice`], the [`tandem_playback::MediaDevice`]
//! used by desktop hosts. Each engine gets its own device; a device streams
//! the URL it is opened with, decoding it with Symphonia and resampling it
//! with rubato batch by batch, and renders it through an [`OutputBackend`].
//! Playback can start as soon as the first batch is buffered.
//!
//! # Backends
//!
//! - [`ClockBackend`]: headless, consumes audio in wall-clock time. Always
//!   available; used for tests and machines without a sound card.
//! - `CpalBackend`: the system output device, behind the `cpal-output`
//!   feature.
//!
//! # Example
//!
//! ```no_run
//! use tandem_audio_desktop::DesktopDevice;
//! use tandem_playback::{EngineKind, LoadTicket, MediaDevice, PlayerChannels};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let channels = PlayerChannels::new();
//! let mut device = DesktopDevice::new(channels.sender(EngineKind::Local))?;
//!
//! device.open("file:///music/track.flac", LoadTicket::NONE.next());
//! device.play()?;
//!
//! for message in channels.into_receiver() {
//!     println!("{:?}", message.event);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod device;
mod error;
pub mod loader;
mod transport;

#[cfg(feature = "cpal-output")]
pub use backend::CpalBackend;
pub use backend::{default_backend, ClockBackend, OutputBackend, DEFAULT_SAMPLE_RATE};
pub use device::{DesktopDevice, DEFAULT_TICK};
pub use error::{AudioError, Result};
pub use loader::{ChunkResampler, DecodedAudio, LoadEvent, MediaLoader};
pub use transport::Transport;
