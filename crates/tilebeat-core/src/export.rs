use std::{
    io::BufWriter,
    path::{Path, PathBuf},
};

use tracing::{info, instrument};

use crate::{engine::EngineError, persistence::write_atomically};

/// `song.adofai` at pitch 120 renders to `song_p120.wav` beside it.
#[must_use]
pub fn default_output_path(chart_path: &Path, pitch: i32) -> PathBuf {
    let mut file_name = chart_path.file_stem().unwrap_or_default().to_os_string();
    file_name.push(format!("_p{pitch}.wav"));
    chart_path.with_file_name(file_name)
}

#[instrument(skip(samples), fields(path = %path.display(), sample_count = samples.len()))]
pub fn write_wav_mono_i16(path: &Path, sample_rate: u32, samples: &[i16]) -> Result<(), EngineError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    write_atomically(path, |file| {
        let wav_error = |error: hound::Error| EngineError::output_write(path, error.to_string());
        let mut writer = hound::WavWriter::new(BufWriter::new(file), spec).map_err(wav_error)?;
        for sample in samples {
            writer.write_sample(*sample).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)
    })?;

    info!("wav export completed");
    Ok(())
}

/// Reads back a 16-bit PCM file as `(sample_rate, channels, interleaved samples)`.
#[instrument(fields(path = %path.display()))]
pub fn read_wav_i16(path: &Path) -> Result<(u32, u16, Vec<i16>), EngineError> {
    let mut reader = hound::WavReader::open(path).map_err(|error| match error {
        hound::Error::IoError(source) => EngineError::InputNotFound {
            path: path.to_path_buf(),
            source,
        },
        other => EngineError::MalformedAudio(format!("{}: {other}", path.display())),
    })?;

    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(EngineError::MalformedAudio(format!(
            "{} is not 16-bit integer PCM",
            path.display()
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| EngineError::MalformedAudio(format!("{}: {error}", path.display())))?;
    Ok((spec.sample_rate, spec.channels, samples))
}
