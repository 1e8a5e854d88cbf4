use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::DiagnosticsConfig;

/// Flushes the JSON log on drop, so hold it until the render has finished.
pub struct TelemetryGuard {
    log_file: PathBuf,
    _writer_guard: WorkerGuard,
}

impl TelemetryGuard {
    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// One file per render: `<prefix>-<utc timestamp>-<run id>.log`. The run id
/// keeps renders started in the same second apart.
#[must_use]
pub fn log_file_name(prefix: &str, started_at: DateTime<Utc>, run_id: Uuid) -> String {
    let short_id = run_id.simple().to_string();
    format!(
        "{prefix}-{}-{}.log",
        started_at.format("%Y%m%d-%H%M%S"),
        &short_id[..8]
    )
}

/// Compact human output on stdout, JSON spans into `log_dir`. `RUST_LOG`
/// overrides the configured filter.
pub fn init_tracing(config: &DiagnosticsConfig) -> anyhow::Result<TelemetryGuard> {
    let log_dir = config.log_dir.as_path();
    fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let run_id = Uuid::new_v4();
    let file_name = log_file_name(&config.log_file_prefix, Utc::now(), run_id);
    let log_file = log_dir.join(&file_name);
    let (json_writer, writer_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, file_name));

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .with_context(|| format!("invalid log filter {:?}", config.log_filter))?;

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(json_writer),
        )
        .try_init();

    match installed {
        Ok(()) => debug!(%run_id, log_file = %log_file.display(), "logging to file"),
        Err(error) => warn!(?error, "tracing subscriber was already installed"),
    }

    Ok(TelemetryGuard {
        log_file,
        _writer_guard: writer_guard,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn log_file_name_carries_timestamp_and_short_run_id() {
        let started_at = Utc
            .with_ymd_and_hms(2026, 3, 9, 14, 5, 7)
            .single()
            .expect("timestamp should be valid");
        let run_id = Uuid::parse_str("0123abcd-0000-4000-8000-000000000000")
            .expect("uuid should parse");

        assert_eq!(
            log_file_name("tilebeat", started_at, run_id),
            "tilebeat-20260309-140507-0123abcd.log"
        );
    }
}
