//! Narration playback
//!
//! Decodes TTS audio and streams it to the default output device. The
//! cancel flag is polled between refills so an in-flight utterance can
//! be cut short when the narrator replaces it.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig, SupportedStreamConfigRange};

use crate::{Error, Result};

/// TTS providers emit 24 kHz mono
const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// How often the playback loop polls for cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Plays narration audio to the default output device
#[derive(Clone)]
pub struct AudioPlayback {
    config: StreamConfig,
}

impl AudioPlayback {
    /// Probe the default output device
    ///
    /// # Errors
    ///
    /// Returns error if no suitable output device is available
    pub fn new() -> Result<Self> {
        let device = output_device()?;
        let config = pick_output_config(&device)?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config })
    }

    /// Decode MP3 bytes and play them, honoring the cancel flag
    ///
    /// Blocking; run on a blocking-capable thread.
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    pub fn play_mp3_blocking(&self, mp3: &[u8], cancel: &Arc<AtomicBool>) -> Result<()> {
        self.play_blocking(decode_mp3(mp3)?, cancel)
    }

    /// Play mono f32 samples, honoring the cancel flag
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    pub fn play_blocking(&self, samples: Vec<f32>, cancel: &Arc<AtomicBool>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let device = output_device()?;
        let channels = usize::from(self.config.channels);
        let total = samples.len();

        let samples = Arc::new(samples);
        let cursor = Arc::new(AtomicUsize::new(0));

        let feed = Arc::clone(&samples);
        let feed_cursor = Arc::clone(&cursor);

        let stream = device
            .build_output_stream(
                &self.config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = feed_cursor.load(Ordering::Acquire);
                    for frame in out.chunks_mut(channels) {
                        // Duplicate the mono sample across channels;
                        // silence once the utterance is drained
                        frame.fill(feed.get(pos).copied().unwrap_or(0.0));
                        if pos < feed.len() {
                            pos += 1;
                        }
                    }
                    feed_cursor.store(pos, Ordering::Release);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Worst-case duration bounds the wait in case the device stalls
        let duration_ms = (total as u64).saturating_mul(1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);

        while cursor.load(Ordering::Acquire) < total {
            if cancel.load(Ordering::SeqCst) {
                tracing::debug!("playback canceled mid-utterance");
                break;
            }
            if Instant::now() > deadline {
                tracing::warn!("playback timed out before draining");
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        drop(stream);
        tracing::debug!(samples = total, "playback finished");
        Ok(())
    }
}

fn output_device() -> Result<Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))
}

/// Prefer mono at the TTS rate, falling back to stereo
fn pick_output_config(device: &Device) -> Result<StreamConfig> {
    let rate = SampleRate(PLAYBACK_SAMPLE_RATE);
    let supports_rate = |c: &SupportedStreamConfigRange| {
        c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
    };

    for wanted in [1u16, 2] {
        let found = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| c.channels() == wanted && supports_rate(c));

        if let Some(config) = found {
            return Ok(config.with_sample_rate(rate).config());
        }
    }

    Err(Error::Audio("no suitable output config found".to_string()))
}

/// Decode MP3 frames into mono f32 samples, downmixing as needed
fn decode_mp3(bytes: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut samples = Vec::new();

    loop {
        let frame = match decoder.next_frame() {
            Ok(frame) => frame,
            Err(minimp3::Error::Eof) => return Ok(samples),
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        };

        let channels = frame.channels.max(1);
        samples.extend(frame.data.chunks(channels).map(|chunk| {
            let sum: f32 = chunk.iter().map(|&s| f32::from(s)).sum();
            #[allow(clippy::cast_precision_loss)]
            let width = chunk.len() as f32;
            sum / (width * 32768.0)
        }));
    }
}
