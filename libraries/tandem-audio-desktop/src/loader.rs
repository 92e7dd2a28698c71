//! Media loading: fetch, decode, resample
//!
//! Everything here is blocking and runs on a loader thread. Media is read
//! incrementally (`http(s)://` as a streamed reqwest body, `file://` from
//! disk), decoded packet by packet by Symphonia into interleaved stereo
//! `f32`, resampled in chunks with rubato to the output backend's rate,
//! and handed on in batches so playback can start long before the whole
//! file has been read.
//!
//! Any channel layout ends up as stereo: mono is duplicated to both sides,
//! anything wider keeps its first two channels.

use std::io::{Cursor, Read};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};
use url::Url;

use crate::error::{AudioError, Result};

/// Channels in every decoded buffer
pub const OUTPUT_CHANNELS: usize = 2;

/// Frames handed on per [`LoadEvent::Samples`] batch
pub const BATCH_FRAMES: usize = 16_384;

/// Input frames per resampler call
const RESAMPLE_CHUNK: usize = 1024;

/// Upper bound on zero chunks fed to push the filter delay out
const MAX_FLUSH_CHUNKS: usize = 8;

/// Decoded, interleaved stereo audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved stereo samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / OUTPUT_CHANNELS
    }

    /// Length in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Progress of a streaming load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// Total length in seconds, sent before any samples when the container declares it
    Duration(f64),

    /// Next run of interleaved stereo samples at the loader's rate
    Samples(Vec<f32>),
}

/// Fetches and decodes media for one output rate
#[derive(Debug, Clone)]
pub struct MediaLoader {
    http: reqwest::blocking::Client,
    target_rate: u32,
}

impl MediaLoader {
    /// Create a loader producing audio at `target_rate`
    ///
    /// Must not be called from inside an async runtime.
    pub fn new(target_rate: u32) -> Result<Self> {
        // Bodies are read for as long as the track plays; only connecting is bounded
        let http = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("tandem-audio-desktop/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, target_rate })
    }

    /// Output rate of loaded audio
    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Fetch, decode and resample all of `url` into one buffer
    pub fn load(&self, url: &str) -> Result<DecodedAudio> {
        let mut samples = Vec::new();
        self.stream(url, |event| {
            if let LoadEvent::Samples(batch) = event {
                samples.extend(batch);
            }
            true
        })?;

        Ok(DecodedAudio {
            samples,
            sample_rate: self.target_rate,
        })
    }

    /// Decode `url` incrementally, passing progress to `sink`
    ///
    /// Stops early, without error, as soon as `sink` returns `false`.
    pub fn stream(&self, url: &str, mut sink: impl FnMut(LoadEvent) -> bool) -> Result<()> {
        let (source, extension) = self.open(url)?;
        debug!(url, target_rate = self.target_rate, "Streaming media");
        decode_source(source, extension.as_deref(), Some(self.target_rate), &mut sink)?;
        Ok(())
    }

    /// Open the byte stream behind `url`, plus its file extension if any
    pub fn open(&self, url: &str) -> Result<(Box<dyn MediaSource>, Option<String>)> {
        let parsed = Url::parse(url)
            .map_err(|e| AudioError::FetchError(format!("invalid URL {}: {}", url, e)))?;
        let extension = extension_of(&parsed);

        let source: Box<dyn MediaSource> = match parsed.scheme() {
            "http" | "https" => {
                let response = self.http.get(parsed).send()?.error_for_status()?;
                Box::new(ReadOnlySource::new(SharedReader::new(response)))
            }
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|()| AudioError::FetchError(format!("invalid file URL: {}", url)))?;
                Box::new(std::fs::File::open(path)?)
            }
            other => {
                return Err(AudioError::FetchError(format!(
                    "unsupported URL scheme: {}",
                    other
                )))
            }
        };

        Ok((source, extension))
    }
}

/// `Sync` wrapper for readers that are only `Send`, such as response bodies
struct SharedReader<R>(Mutex<R>);

impl<R> SharedReader<R> {
    fn new(inner: R) -> Self {
        Self(Mutex::new(inner))
    }
}

impl<R: Read> Read for SharedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .read(buf)
    }
}

fn extension_of(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Decode a complete media file into interleaved stereo `f32`
///
/// `extension` is only a hint; the container is detected from the bytes.
/// The result keeps the file's own sample rate.
pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
    let mut samples = Vec::new();
    let sample_rate = decode_source(Box::new(Cursor::new(bytes)), extension, None, &mut |event| {
        if let LoadEvent::Samples(batch) = event {
            samples.extend(batch);
        }
        true
    })?;

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Packet loop shared by every entry point
///
/// Converts to `target_rate` when given. Returns the source sample rate.
fn decode_source(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
    target_rate: Option<u32>,
    sink: &mut dyn FnMut(LoadEvent) -> bool,
) -> Result<u32> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .default_track()
        .ok_or_else(|| AudioError::UnsupportedFormat("no audio tracks found".into()))?;
    let track_id = track.id;
    let mut source_rate = track.codec_params.sample_rate.unwrap_or(44_100);

    if let (Some(frames), Some(rate)) = (track.codec_params.n_frames, track.codec_params.sample_rate)
    {
        if rate > 0 && !sink(LoadEvent::Duration(frames as f64 / f64::from(rate))) {
            return Ok(source_rate);
        }
    }

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut resampler: Option<ChunkResampler> = None;
    let mut batch = Vec::with_capacity(BATCH_FRAMES * OUTPUT_CHANNELS);
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let stereo = match decoder.decode(&packet) {
            Ok(decoded) => {
                source_rate = decoded.spec().rate;
                convert_to_stereo_f32(decoded)
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet, keep going
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match target_rate {
            Some(target) => {
                if resampler.is_none() {
                    resampler = Some(ChunkResampler::new(source_rate, target)?);
                }
                if let Some(resampler) = resampler.as_mut() {
                    batch.extend(resampler.push(&stereo)?);
                }
            }
            None => batch.extend(stereo),
        }

        if batch.len() >= BATCH_FRAMES * OUTPUT_CHANNELS
            && !sink(LoadEvent::Samples(std::mem::take(&mut batch)))
        {
            return Ok(source_rate);
        }
    }

    if let Some(resampler) = resampler.as_mut() {
        batch.extend(resampler.finish()?);
    }
    if !batch.is_empty() {
        sink(LoadEvent::Samples(batch));
    }

    Ok(source_rate)
}

/// Interleave a planar buffer to stereo, normalising each sample
fn interleave_to_stereo<T, F>(buf: &symphonia::core::audio::AudioBuffer<T>, normalize: F) -> Vec<f32>
where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    let mut output = Vec::with_capacity(frames * OUTPUT_CHANNELS);

    let left = buf.chan(0);
    let right = if channels > 1 { buf.chan(1) } else { left };
    for (l, r) in left.iter().zip(right) {
        output.push(normalize(*l));
        output.push(normalize(*r));
    }

    output
}

fn convert_to_stereo_f32(decoded: AudioBufferRef<'_>) -> Vec<f32> {
    match decoded {
        AudioBufferRef::F32(buf) => interleave_to_stereo(&buf, |s| s),
        AudioBufferRef::F64(buf) => interleave_to_stereo(&buf, |s| s as f32),
        AudioBufferRef::S8(buf) => interleave_to_stereo(&buf, |s| f32::from(s) / f32::from(i8::MAX)),
        AudioBufferRef::S16(buf) => {
            interleave_to_stereo(&buf, |s| f32::from(s) / f32::from(i16::MAX))
        }
        AudioBufferRef::S24(buf) => interleave_to_stereo(&buf, |s| s.inner() as f32 / 8_388_607.0),
        AudioBufferRef::S32(buf) => interleave_to_stereo(&buf, |s| s as f32 / i32::MAX as f32),
        AudioBufferRef::U8(buf) => {
            interleave_to_stereo(&buf, |s| (f32::from(s) / f32::from(u8::MAX)) * 2.0 - 1.0)
        }
        AudioBufferRef::U16(buf) => {
            interleave_to_stereo(&buf, |s| (f32::from(s) / f32::from(u16::MAX)) * 2.0 - 1.0)
        }
        AudioBufferRef::U24(buf) => {
            interleave_to_stereo(&buf, |s| (s.inner() as f32 / 16_777_215.0) * 2.0 - 1.0)
        }
        AudioBufferRef::U32(buf) => {
            interleave_to_stereo(&buf, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0)
        }
    }
}

/// Stereo sinc resampler fed with runs of any length
///
/// Output has the filter delay removed and is trimmed so that `n` input
/// frames always give `round(n * ratio)` output frames. Equal rates pass
/// straight through.
pub struct ChunkResampler {
    inner: Option<SincFixedIn<f32>>,
    ratio: f64,
    /// Deinterleaved input not yet processed
    pending: Vec<Vec<f32>>,
    /// Leading output frames still to drop
    skip: usize,
    input_frames: usize,
    output_frames: usize,
}

impl ChunkResampler {
    /// Resampler from `source_rate` to `target_rate`
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self> {
        if source_rate == 0 || target_rate == 0 {
            return Err(AudioError::ResampleError(format!(
                "cannot convert {} Hz to {} Hz",
                source_rate, target_rate
            )));
        }

        let ratio = f64::from(target_rate) / f64::from(source_rate);
        let inner = if source_rate == target_rate {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            Some(
                SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, OUTPUT_CHANNELS)
                    .map_err(|e| AudioError::ResampleError(e.to_string()))?,
            )
        };
        let skip = inner.as_ref().map_or(0, |r| r.output_delay());

        Ok(Self {
            inner,
            ratio,
            pending: vec![Vec::with_capacity(RESAMPLE_CHUNK); OUTPUT_CHANNELS],
            skip,
            input_frames: 0,
            output_frames: 0,
        })
    }

    /// Feed interleaved stereo input, returning whatever output is ready
    pub fn push(&mut self, interleaved: &[f32]) -> Result<Vec<f32>> {
        if self.inner.is_none() {
            return Ok(interleaved.to_vec());
        }

        for frame in interleaved.chunks_exact(OUTPUT_CHANNELS) {
            for (channel, sample) in self.pending.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
        self.input_frames += interleaved.len() / OUTPUT_CHANNELS;

        let mut output = Vec::new();
        while self.pending[0].len() >= RESAMPLE_CHUNK {
            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|channel| channel.drain(..RESAMPLE_CHUNK).collect())
                .collect();
            let resampled = match self.inner.as_mut() {
                Some(resampler) => resampler
                    .process(&chunk, None)
                    .map_err(|e| AudioError::ResampleError(e.to_string()))?,
                None => break,
            };
            self.emit(&resampled, None, &mut output);
        }

        Ok(output)
    }

    /// Process the remaining input and drain the filter
    pub fn finish(&mut self) -> Result<Vec<f32>> {
        let mut output = Vec::new();
        if self.inner.is_none() {
            return Ok(output);
        }

        let expected = (self.input_frames as f64 * self.ratio).round() as usize;
        let mut tail: Option<Vec<Vec<f32>>> =
            Some(self.pending.iter_mut().map(std::mem::take).collect());

        // After the tail, zero chunks push out what the filter still holds
        for _ in 0..MAX_FLUSH_CHUNKS {
            if self.output_frames >= expected {
                break;
            }
            let resampled = match self.inner.as_mut() {
                Some(resampler) => resampler
                    .process_partial(tail.take().as_deref(), None)
                    .map_err(|e| AudioError::ResampleError(e.to_string()))?,
                None => break,
            };
            self.emit(&resampled, Some(expected), &mut output);
        }

        Ok(output)
    }

    fn emit(&mut self, channels: &[Vec<f32>], limit: Option<usize>, output: &mut Vec<f32>) {
        let frames = channels.first().map_or(0, Vec::len);
        for index in 0..frames {
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            if limit.is_some_and(|limit| self.output_frames >= limit) {
                break;
            }
            for channel in channels {
                output.push(channel[index]);
            }
            self.output_frames += 1;
        }
    }
}

impl std::fmt::Debug for ChunkResampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkResampler")
            .field("ratio", &self.ratio)
            .field("input_frames", &self.input_frames)
            .field("output_frames", &self.output_frames)
            .finish_non_exhaustive()
    }
}

/// Resample `audio` to `target_rate`
///
/// Returns the input untouched when the rates already match.
pub fn resample(audio: DecodedAudio, target_rate: u32) -> Result<DecodedAudio> {
    if audio.sample_rate == target_rate || audio.frames() == 0 {
        return Ok(DecodedAudio {
            samples: audio.samples,
            sample_rate: target_rate,
        });
    }

    let mut resampler = ChunkResampler::new(audio.sample_rate, target_rate)?;
    let mut samples = resampler.push(&audio.samples)?;
    samples.extend(resampler.finish()?);

    Ok(DecodedAudio {
        samples,
        sample_rate: target_rate,
    })
}
