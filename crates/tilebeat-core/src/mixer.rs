use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{model::Onset, resample::peak_amplitude, time::seconds_to_sample_index};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MixSummary {
    pub sample_count: usize,
    pub onsets_mixed: usize,
    pub onsets_skipped: usize,
    pub peak_before_normalization: f32,
    pub normalization_gain: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixOutput {
    pub samples: Vec<i16>,
    pub summary: MixSummary,
}

#[must_use]
pub fn pin_index(time_offset: f64, sample_rate: u32) -> i64 {
    seconds_to_sample_index(time_offset, sample_rate)
}

/// Mixes, normalizes and quantizes in one go.
#[instrument(skip(onsets, click), fields(onset_count = onsets.len(), click_len = click.len()))]
pub fn render_mix(onsets: &[Onset], click: &[f32], sample_rate: u32) -> MixOutput {
    let (mut buffer, mut summary) = mix_onsets(onsets, click, sample_rate);
    summary.peak_before_normalization = peak_amplitude(&buffer);
    summary.normalization_gain = normalize_to_unity(&mut buffer);
    let samples = quantize_i16(&buffer);

    debug!(
        samples = samples.len(),
        peak = summary.peak_before_normalization,
        gain = summary.normalization_gain,
        "mix completed"
    );
    MixOutput { samples, summary }
}

/// Sums a volume-scaled copy of `click` at every onset into a fresh buffer.
#[must_use]
pub fn mix_onsets(onsets: &[Onset], click: &[f32], sample_rate: u32) -> (Vec<f32>, MixSummary) {
    let pins: Vec<i64> = onsets
        .iter()
        .map(|onset| pin_index(onset.time_offset, sample_rate))
        .collect();

    let click_len = i64::try_from(click.len()).unwrap_or(i64::MAX);
    let total = pins
        .last()
        .map_or(0, |last| last.saturating_add(click_len).max(0));
    let mut buffer = vec![0.0_f32; usize::try_from(total).unwrap_or_default()];

    let mut summary = MixSummary {
        sample_count: buffer.len(),
        normalization_gain: 1.0,
        ..MixSummary::default()
    };
    for (onset, pin) in onsets.iter().zip(pins) {
        #[allow(clippy::cast_possible_truncation)]
        let gain = (onset.volume / 100.0) as f32;
        if accumulate_click(&mut buffer, pin, click, gain) {
            summary.onsets_mixed += 1;
        } else {
            summary.onsets_skipped += 1;
        }
    }

    if summary.onsets_skipped > 0 {
        warn!(
            skipped = summary.onsets_skipped,
            "onsets outside the buffer were dropped"
        );
    }
    (buffer, summary)
}

/// Adds `click * gain` at `pin`, truncated at the end of `buffer`. Returns
/// `false` when the pin falls outside the buffer and nothing was written.
pub fn accumulate_click(buffer: &mut [f32], pin: i64, click: &[f32], gain: f32) -> bool {
    let Ok(start) = usize::try_from(pin) else {
        return false;
    };
    if start >= buffer.len() {
        return false;
    }

    let window = &mut buffer[start..];
    for (out, sample) in window.iter_mut().zip(click) {
        *out += sample * gain;
    }
    true
}

/// Attenuates the buffer so its peak is 1.0 when it would otherwise clip.
/// Returns the gain that was applied.
pub fn normalize_to_unity(buffer: &mut [f32]) -> f32 {
    let peak = peak_amplitude(buffer);
    if peak <= 1.0 {
        return 1.0;
    }

    for sample in buffer.iter_mut() {
        *sample /= peak;
    }
    1.0 / peak
}

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn quantize_i16(buffer: &[f32]) -> Vec<i16> {
    buffer
        .iter()
        .map(|sample| {
            (sample * f32::from(i16::MAX))
                .round()
                .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
        })
        .collect()
}
