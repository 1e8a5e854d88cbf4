//! Pitch shifting of the reference click by linear-interpolation resampling.
//!
//! The pitch parameter is quantized into four bands before it is turned into a
//! stretch factor; the band edges are kept as-is for compatibility with the
//! click sets charts are usually rendered with.

use tracing::debug;

/// Band base for a pitch parameter.
#[must_use]
pub fn pitch_band(pitch: i32) -> u32 {
    match pitch {
        i32::MIN..=37 => 25,
        38..=75 => 50,
        76..=150 => 100,
        _ => 200,
    }
}

/// Source samples consumed per output sample; `1.0` leaves the click untouched.
#[must_use]
pub fn stretch_factor(pitch: i32) -> f64 {
    100.0 / f64::from(pitch_band(pitch))
}

#[must_use]
#[allow(
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn pitch_shift(input: &[f32], factor: f64) -> Vec<f32> {
    if factor == 1.0 {
        return input.to_vec();
    }
    if input.is_empty() || factor <= 0.0 {
        return Vec::new();
    }

    let output_len = (input.len() as f64 / factor) as usize;
    let last = input.len() - 1;
    let output: Vec<f32> = (0..output_len)
        .map(|index| {
            let source = index as f64 * factor;
            let lower = (source as usize).min(last);
            let upper = (lower + 1).min(last);
            let frac = (source - lower as f64) as f32;
            input[lower] * (1.0 - frac) + input[upper] * frac
        })
        .collect();

    debug!(
        input_len = input.len(),
        output_len = output.len(),
        factor,
        "click resampled"
    );
    output
}

/// Scales `samples` in place so the loudest one has magnitude 1.0.
pub fn normalize_peak(samples: &mut [f32]) -> f32 {
    let peak = peak_amplitude(samples);
    if peak > 0.0 {
        for sample in samples.iter_mut() {
            *sample /= peak;
        }
    }
    peak
}

#[must_use]
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples
        .iter()
        .copied()
        .map(f32::abs)
        .fold(0.0_f32, f32::max)
}
