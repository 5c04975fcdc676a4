//! Microphone input stream

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Capture sample rate (16 kHz mono for speech)
pub const SAMPLE_RATE: u32 = 16_000;

/// An open microphone stream accumulating samples
///
/// Not `Send`; lives on the capture worker thread. The stream stops
/// when the value is dropped.
pub struct MicStream {
    _stream: Stream,
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl MicStream {
    /// Open the default input device and start capturing
    ///
    /// # Errors
    ///
    /// Returns error if no suitable input device is available
    pub fn open() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let config = pick_input_config(&device)?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone opened"
        );

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "microphone stream error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            buffer,
        })
    }

    /// Take the samples captured since the last call
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// RMS level of the samples currently buffered, without draining
    #[must_use]
    pub fn level(&self) -> f32 {
        self.buffer.lock().map_or(0.0, |buf| rms(&buf))
    }
}

/// Mono input at the speech rate
fn pick_input_config(device: &Device) -> Result<StreamConfig> {
    let rate = SampleRate(SAMPLE_RATE);

    device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| c.channels() == 1 && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate)
        .map(|c| c.with_sample_rate(rate).config())
        .ok_or_else(|| Error::Audio("no suitable input config found".to_string()))
}

/// RMS energy of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Encode f32 samples as 16-bit PCM WAV for the STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

    for &sample in samples {
        writer
            .write_sample(quantize(sample))
            .map_err(|e| Error::Audio(e.to_string()))?;
    }

    writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// f32 in [-1.0, 1.0] to full-scale i16
#[allow(clippy::cast_possible_truncation)]
fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        assert!(rms(&[]) < f32::EPSILON);

        let silence = vec![0.0f32; 100];
        assert!(rms(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(rms(&loud) > 0.4);
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), i16::MAX);
        assert_eq!(quantize(2.0), i16::MAX);
        assert_eq!(quantize(-2.0), -i16::MAX);
    }

    #[test]
    fn test_samples_to_wav_header() {
        let samples = vec![0.0f32, 0.5, -0.5, 0.25];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert!(wav.len() > 44);
    }

    #[test]
    fn test_wav_roundtrip() {
        let original: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
        let wav = samples_to_wav(&original, SAMPLE_RATE).unwrap();

        let cursor = std::io::Cursor::new(wav);
        let mut reader = hound::WavReader::new(cursor).unwrap();

        let spec = reader.spec();
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.channels, 1);

        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read.len(), original.len());
    }
}
