use std::{f32::consts::TAU, path::Path};

use crate::engine::EngineError;

/// Short decaying sine burst standing in for a recorded hit sound.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn synthetic_click(sample_rate: u32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|frame| {
            let t = frame as f32 / sample_rate.max(1) as f32;
            (t * 1_000.0 * TAU).sin() * (-t * 60.0).exp() * 0.8
        })
        .collect()
}

/// Chart JSON with `floors` straight tiles at `bpm`.
#[must_use]
pub fn straight_chart_json(floors: usize, bpm: f64) -> String {
    format!(
        r#"{{"settings": {{"bpm": {bpm}, "volume": 100}}, "pathData": "{}", "actions": []}}"#,
        "R".repeat(floors)
    )
}

/// Writes interleaved 16-bit PCM, used as a reference click in tests.
pub fn write_reference_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    samples: &[f32],
) -> Result<(), EngineError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_error = |error: hound::Error| EngineError::output_write(path, error.to_string());

    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let quantized = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer.write_sample(quantized).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)
}
