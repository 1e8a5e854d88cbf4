use std::{fs::File, io::ErrorKind, path::Path};

use serde::{Deserialize, Serialize};
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use tracing::{debug, info, instrument};

use crate::{
    engine::EngineError,
    resample::{normalize_peak, pitch_shift, stretch_factor},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

/// Reference click after peak normalization and pitch shifting.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickSample {
    pub sample_rate: u32,
    pub stretch_factor: f64,
    pub samples: Vec<f32>,
}

impl ClickSample {
    /// Normalizes `decoded` to unit peak and resamples it for `pitch`.
    #[must_use]
    pub fn from_decoded(decoded: DecodedAudio, pitch: i32) -> Self {
        let mut samples = decoded.samples;
        normalize_peak(&mut samples);
        let factor = stretch_factor(pitch);

        Self {
            sample_rate: decoded.sample_rate,
            stretch_factor: factor,
            samples: pitch_shift(&samples, factor),
        }
    }
}

#[instrument(fields(path = %path.display(), pitch))]
pub fn load_click(path: &Path, pitch: i32) -> Result<ClickSample, EngineError> {
    let decoded = decode_reference_sample(path)?;
    let click = ClickSample::from_decoded(decoded, pitch);
    info!(
        sample_rate = click.sample_rate,
        click_len = click.samples.len(),
        stretch_factor = click.stretch_factor,
        "reference click ready"
    );
    Ok(click)
}

/// Decodes the reference click to mono by averaging channels.
#[instrument(fields(path = %path.display()))]
#[allow(clippy::cast_possible_truncation)]
pub fn decode_reference_sample(path: &Path) -> Result<DecodedAudio, EngineError> {
    let file = File::open(path).map_err(|source| EngineError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|value| value.to_str()) {
        hint.with_extension(extension);
    }

    let malformed = |error: SymphoniaError| {
        EngineError::MalformedAudio(format!("{}: {error}", path.display()))
    };

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(malformed)?;
    let mut format = probed.format;
    let track = format.default_track().ok_or_else(|| {
        EngineError::MalformedAudio(format!("no audio track found in {}", path.display()))
    })?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(malformed)?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let mut channels = track
        .codec_params
        .channels
        .map_or(1, |value| value.count() as u16);
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(error)) if error.kind() == ErrorKind::UnexpectedEof => {
                break;
            }
            Err(error) => return Err(malformed(error)),
        };

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(error) => return Err(malformed(error)),
        };

        sample_rate = decoded.spec().rate;
        channels = decoded.spec().channels.count() as u16;
        push_mono_samples(decoded, &mut samples);
    }

    debug!(
        sample_rate,
        channels,
        total_frames = samples.len(),
        "reference decode complete"
    );

    Ok(DecodedAudio {
        sample_rate,
        channels,
        samples,
    })
}

#[allow(clippy::cast_precision_loss)]
fn push_mono_samples(decoded: symphonia::core::audio::AudioBufferRef<'_>, samples: &mut Vec<f32>) {
    let spec = *decoded.spec();
    let channel_count = spec.channels.count().max(1);
    let mut sample_buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    sample_buffer.copy_interleaved_ref(decoded);

    for frame in sample_buffer.samples().chunks(channel_count) {
        let sum: f32 = frame.iter().copied().sum();
        samples.push(sum / channel_count as f32);
    }
}
