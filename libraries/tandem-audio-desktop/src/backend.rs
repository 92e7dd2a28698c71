//! Output backends
//!
//! A backend pulls frames out of a [`Transport`] at its own pace. The
//! device worker starts it once and stops it on shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::Result;
use crate::loader::OUTPUT_CHANNELS;
use crate::transport::Transport;

/// Rate used when no audio hardware dictates one
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Something that consumes rendered audio
pub trait OutputBackend: Send {
    /// Rate the backend consumes frames at
    fn sample_rate(&self) -> u32;

    /// Begin pulling frames from `transport`
    fn start(&mut self, transport: Arc<Transport>) -> Result<()>;

    /// Stop pulling frames
    fn stop(&mut self);
}

/// Headless backend that consumes frames in wall-clock time
///
/// Renders into a scratch buffer that is thrown away, so playback
/// position, end-of-media and every transport rule behave exactly as with
/// a sound card, minus the sound.
#[derive(Debug)]
pub struct ClockBackend {
    sample_rate: u32,
    period: Duration,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ClockBackend {
    /// Clock consuming `sample_rate` frames per second, every 10 ms
    pub fn new(sample_rate: u32) -> Self {
        Self::with_period(sample_rate, Duration::from_millis(10))
    }

    /// Clock consuming frames every `period`
    pub fn with_period(sample_rate: u32, period: Duration) -> Self {
        Self {
            sample_rate,
            period,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    fn run(transport: &Transport, running: &AtomicBool, period: Duration, sample_rate: u32) {
        let mut scratch = Vec::new();
        let mut last = Instant::now();
        let mut owed = 0.0_f64;

        while running.load(Ordering::SeqCst) {
            thread::sleep(period);

            let now = Instant::now();
            owed += now.duration_since(last).as_secs_f64() * f64::from(sample_rate);
            last = now;

            let frames = owed.floor();
            owed -= frames;
            scratch.resize(frames as usize * OUTPUT_CHANNELS, 0.0);
            transport.render(&mut scratch, OUTPUT_CHANNELS);
        }
    }
}

impl Default for ClockBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl OutputBackend for ClockBackend {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, transport: Arc<Transport>) -> Result<()> {
        self.stop();
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let period = self.period;
        let sample_rate = self.sample_rate;
        self.thread = Some(thread::spawn(move || {
            Self::run(&transport, &running, period, sample_rate);
        }));

        debug!(sample_rate, "Clock backend started");
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ClockBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "cpal-output")]
pub use self::cpal_backend::CpalBackend;

#[cfg(feature = "cpal-output")]
mod cpal_backend {
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{Device, StreamConfig};
    use crossbeam_channel::{bounded, Sender};
    use tracing::{error, info};

    use super::OutputBackend;
    use crate::error::{AudioError, Result};
    use crate::transport::Transport;

    /// Backend rendering through the default system output device
    ///
    /// The cpal stream is not `Send`, so it is built and owned by a
    /// dedicated thread that lives until [`OutputBackend::stop`].
    pub struct CpalBackend {
        device: Option<Device>,
        config: StreamConfig,
        sample_rate: u32,
        shutdown: Option<Sender<()>>,
        thread: Option<JoinHandle<()>>,
    }

    impl CpalBackend {
        /// Open the default output device
        pub fn new() -> Result<Self> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or(AudioError::DeviceNotFound)?;

            let supported = device.default_output_config()?;
            let sample_rate = supported.sample_rate();
            let config = supported.config();

            Ok(Self {
                device: Some(device),
                config,
                sample_rate,
                shutdown: None,
                thread: None,
            })
        }
    }

    impl std::fmt::Debug for CpalBackend {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CpalBackend")
                .field("sample_rate", &self.sample_rate)
                .field("channels", &self.config.channels)
                .finish_non_exhaustive()
        }
    }

    impl OutputBackend for CpalBackend {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn start(&mut self, transport: Arc<Transport>) -> Result<()> {
            let device = self.device.take().ok_or(AudioError::DeviceNotFound)?;
            let config = self.config.clone();
            let channels = usize::from(config.channels);
            let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
            let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

            let thread = thread::spawn(move || {
                let stream = match device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        transport.render(data, channels);
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                ) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.into()));
                        return;
                    }
                };

                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(e.into()));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Keep the stream alive until told otherwise
                let _ = shutdown_rx.recv();
                drop(stream);
            });

            ready_rx.recv().map_err(|_| AudioError::WorkerStopped)??;
            info!(sample_rate = self.sample_rate, channels, "Audio output started");

            self.shutdown = Some(shutdown_tx);
            self.thread = Some(thread);
            Ok(())
        }

        fn stop(&mut self) {
            if let Some(shutdown) = self.shutdown.take() {
                let _ = shutdown.send(());
            }
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }

    impl Drop for CpalBackend {
        fn drop(&mut self) {
            self.stop();
        }
    }
}

/// System output device, falling back to the clock when there is none
#[cfg(feature = "cpal-output")]
pub fn default_backend() -> Box<dyn OutputBackend> {
    match CpalBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            tracing::warn!("No audio output, falling back to clock: {}", e);
            Box::new(ClockBackend::default())
        }
    }
}

/// Clock backend at the default rate
///
/// Built without `cpal-output`, so nothing is audible.
#[cfg(not(feature = "cpal-output"))]
pub fn default_backend() -> Box<dyn OutputBackend> {
    tracing::warn!("Built without system audio output (cpal-output); playback is silent");
    Box::new(ClockBackend::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_consumes_frames_in_real_time() {
        let transport = Arc::new(Transport::new(1_000));
        transport.load(vec![0.1; 1_000 * OUTPUT_CHANNELS]);
        transport.play();

        let mut backend = ClockBackend::with_period(1_000, Duration::from_millis(5));
        backend.start(Arc::clone(&transport)).unwrap();
        thread::sleep(Duration::from_millis(200));
        backend.stop();

        let position = transport.position_seconds();
        assert!(position > 0.05, "position {} barely moved", position);
        assert!(position < 1.0, "position {} ran ahead", position);
    }

    #[test]
    fn stopped_clock_consumes_nothing() {
        let transport = Arc::new(Transport::new(1_000));
        transport.load(vec![0.1; 1_000 * OUTPUT_CHANNELS]);
        transport.play();

        let mut backend = ClockBackend::new(1_000);
        backend.start(Arc::clone(&transport)).unwrap();
        backend.stop();
        let stopped_at = transport.position_seconds();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(transport.position_seconds(), stopped_at);
    }
}
