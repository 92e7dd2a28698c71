//! Shared playback transport
//!
//! The transport is the only state shared between the device worker and
//! the output backend's render callback. The worker appends decoded audio
//! as it arrives and moves the playhead; the backend pulls frames through
//! [`Transport::render`].
//!
//! Audio is kept in fixed-size segments, so appending never moves what
//! the callback is reading. Running out of decoded frames before the load
//! is complete is an underrun (silence, still playing); running out after
//! it is the end of the track.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::loader::OUTPUT_CHANNELS;

/// Frames per storage segment
const SEGMENT_FRAMES: usize = 16_384;
const SEGMENT_SAMPLES: usize = SEGMENT_FRAMES * OUTPUT_CHANNELS;

/// Interleaved stereo samples in append-only segments
#[derive(Debug, Default)]
struct Segments {
    segments: Vec<Vec<f32>>,
    frames: usize,
    /// Nothing more will be appended
    complete: bool,
}

impl Segments {
    fn append(&mut self, samples: &[f32]) {
        // Whole frames only
        let usable = samples.len() - samples.len() % OUTPUT_CHANNELS;
        let mut rest = &samples[..usable];
        while !rest.is_empty() {
            match self.segments.last_mut() {
                Some(segment) if segment.len() < SEGMENT_SAMPLES => {
                    let take = (SEGMENT_SAMPLES - segment.len()).min(rest.len());
                    segment.extend_from_slice(&rest[..take]);
                    rest = &rest[take..];
                }
                _ => self.segments.push(Vec::with_capacity(SEGMENT_SAMPLES)),
            }
        }
        self.frames += usable / OUTPUT_CHANNELS;
    }

    /// Left and right sample of frame `index`, which must be below `frames`
    fn frame(&self, index: usize) -> (f32, f32) {
        let sample = index * OUTPUT_CHANNELS;
        let segment = &self.segments[sample / SEGMENT_SAMPLES];
        let offset = sample % SEGMENT_SAMPLES;
        (segment[offset], segment[offset + 1])
    }
}

/// Decoded media plus playhead
#[derive(Debug)]
pub struct Transport {
    buffer: Mutex<Segments>,
    /// Sample rate the buffer was prepared for
    sample_rate: u32,
    /// Playhead in frames
    position: AtomicUsize,
    /// Output gain (0.0 to 1.0)
    volume: Mutex<f32>,
    playing: AtomicBool,
    /// Set when the playhead ran off the end of a complete buffer
    finished: AtomicBool,
}

impl Transport {
    /// Empty transport rendering at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            buffer: Mutex::new(Segments {
                complete: true,
                ..Segments::default()
            }),
            sample_rate,
            position: AtomicUsize::new(0),
            volume: Mutex::new(1.0),
            playing: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        }
    }

    /// Rate buffers must be prepared at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drop the buffer and rewind, paused, ready for [`append`](Self::append)
    pub fn begin(&self) {
        self.playing.store(false, Ordering::SeqCst);
        *lock(&self.buffer) = Segments::default();
        self.position.store(0, Ordering::SeqCst);
        self.finished.store(false, Ordering::SeqCst);
    }

    /// Add decoded samples at the end of the buffer
    pub fn append(&self, samples: &[f32]) {
        lock(&self.buffer).append(samples);
    }

    /// Mark the buffer complete
    pub fn finish(&self) {
        lock(&self.buffer).complete = true;
    }

    /// Replace the buffer with `samples`, complete, rewound and paused
    pub fn load(&self, samples: Vec<f32>) {
        self.begin();
        self.append(&samples);
        self.finish();
    }

    /// Drop the buffer
    pub fn clear(&self) {
        self.load(Vec::new());
    }

    /// Whether any frames are loaded
    pub fn has_media(&self) -> bool {
        self.frames() > 0
    }

    /// Whether the whole track has been appended
    pub fn is_complete(&self) -> bool {
        lock(&self.buffer).complete
    }

    /// Start rendering
    ///
    /// Returns `false` if there is nothing to render. A finished buffer
    /// restarts from the top.
    pub fn play(&self) -> bool {
        if !self.has_media() {
            return false;
        }
        if self.finished.swap(false, Ordering::SeqCst) {
            self.position.store(0, Ordering::SeqCst);
        }
        self.playing.store(true, Ordering::SeqCst);
        true
    }

    /// Stop rendering, keeping the playhead
    pub fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    /// Whether frames are being rendered
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Whether the playhead reached the end of a complete buffer
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Move the playhead, clamped to the frames decoded so far
    pub fn seek(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let frames = self.frames();
        let target = (seconds.max(0.0) * f64::from(self.sample_rate)) as usize;
        self.position.store(target.min(frames), Ordering::SeqCst);
        self.finished.store(false, Ordering::SeqCst);
    }

    /// Playhead in seconds
    pub fn position_seconds(&self) -> f64 {
        self.seconds(self.position.load(Ordering::SeqCst))
    }

    /// Length of the decoded audio in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.seconds(self.frames())
    }

    /// Set the output gain, clamped to 0.0-1.0
    pub fn set_volume(&self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        *lock(&self.volume) = volume.clamp(0.0, 1.0);
    }

    /// Output gain
    pub fn volume(&self) -> f32 {
        *lock(&self.volume)
    }

    /// Fill `output` (interleaved, `channels` wide) from the playhead
    ///
    /// Writes silence while paused, past the end, or while waiting for
    /// more decoded audio. Mono output gets the average of both sides;
    /// channels beyond the second stay silent. Returns the number of
    /// frames taken from the buffer.
    pub fn render(&self, output: &mut [f32], channels: usize) -> usize {
        output.fill(0.0);
        if channels == 0 || !self.is_playing() {
            return 0;
        }

        let volume = self.volume();
        let buffer = lock(&self.buffer);
        let total = buffer.frames;

        let start = self.position.load(Ordering::SeqCst);
        let mut pos = start;
        for frame in output.chunks_exact_mut(channels) {
            if pos >= total {
                break;
            }
            let (left, right) = buffer.frame(pos);
            let (left, right) = (left * volume, right * volume);
            if channels == 1 {
                frame[0] = (left + right) * 0.5;
            } else {
                frame[0] = left;
                frame[1] = right;
            }
            pos += 1;
        }

        // A seek or load that landed during the render wins
        let _ = self
            .position
            .compare_exchange(start, pos, Ordering::SeqCst, Ordering::SeqCst);

        if pos >= total && buffer.complete {
            self.playing.store(false, Ordering::SeqCst);
            self.finished.store(true, Ordering::SeqCst);
        }

        pos - start
    }

    fn frames(&self) -> usize {
        lock(&self.buffer).frames
    }

    fn seconds(&self, frames: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        frames as f64 / f64::from(self.sample_rate)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
