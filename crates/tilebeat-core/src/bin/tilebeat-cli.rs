use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use tilebeat_core::{
    AppConfig, Engine, RenderRequest,
    diagnostics::init_tracing,
    report::write_render_report,
};

#[derive(Debug, Parser)]
#[command(name = "tilebeat-cli")]
#[command(about = "Render a click track that hits every tile of a rhythm-game chart")]
struct Cli {
    /// Chart to render; prompted for when omitted.
    chart: Option<PathBuf>,

    /// Pitch of the click (100 keeps the reference unchanged); prompted for when omitted.
    #[arg(long)]
    pitch: Option<i32>,

    #[arg(long)]
    sample: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write a JSON render report here.
    #[arg(long)]
    report: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn chart_path(cli_value: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli_value {
        return Ok(path);
    }
    let answer = prompt("Chart file path: ")?;
    let trimmed = answer.trim_matches('"');
    if trimmed.is_empty() {
        anyhow::bail!("no chart path given");
    }
    Ok(PathBuf::from(trimmed))
}

fn pitch(cli_value: Option<i32>, default: i32) -> anyhow::Result<i32> {
    if let Some(pitch) = cli_value {
        return Ok(pitch);
    }
    let answer = prompt(&format!("Pitch (default {default}): "))?;
    if answer.is_empty() {
        return Ok(default);
    }
    answer
        .parse::<i32>()
        .with_context(|| format!("invalid pitch: {answer}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(log_dir) = cli.log_dir.clone() {
        config.diagnostics.log_dir = log_dir;
    }
    let telemetry = init_tracing(&config.diagnostics)?;
    tracing::debug!(log_file = %telemetry.log_file().display(), "cli started");

    let request = RenderRequest {
        chart_path: chart_path(cli.chart)?,
        reference_sample: cli.sample,
        output_path: cli.output,
        pitch: Some(pitch(cli.pitch, config.audio.default_pitch)?),
    };

    let engine = Engine::new(config);
    let outcome = engine.render(&request)?;
    if let Some(report_path) = &cli.report {
        write_render_report(report_path, &outcome.report)?;
        tracing::info!(path = %report_path.display(), "render report written");
    }

    println!("Done: {}", outcome.output_path.display());
    Ok(())
}
