use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use sensorfilt::config::{PipelineConfig, StageSpec};
use sensorfilt::signal_processing::response::phase_degrees;
use sensorfilt::signal_processing::{magnitude_db, measure_gain_db};

#[derive(Parser, Debug)]
#[command(name = "filter_response")]
#[command(about = "Print the frequency response of a filter pipeline", long_about = None)]
struct Args {
    /// Pipeline TOML file (default: 5-point moving average every 10 ms)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sampling rate in Hz (default: derived from the pipeline period)
    #[arg(short, long)]
    sample_rate: Option<f32>,

    /// Comma-separated frequencies in Hz (default: evenly spaced up to Nyquist)
    #[arg(long, value_delimiter = ',')]
    frequencies: Vec<f32>,

    /// Number of evenly spaced points when no frequencies are given
    #[arg(long, default_value_t = 11)]
    points: usize,

    /// Also run a sine through the pipeline and report the measured gain
    #[arg(short, long)]
    measure: bool,

    /// Output format: text, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct ResponsePoint {
    freq_hz: f32,
    stage_db: Vec<f32>,
    total_db: f32,
    total_phase_deg: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    measured_db: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ResponseReport {
    sample_rate: f32,
    stages: Vec<String>,
    points: Vec<ResponsePoint>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load pipeline {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let sample_rate = args
        .sample_rate
        .unwrap_or_else(|| config.period.sample_rate_hz());
    if !(sample_rate > 0.0) {
        anyhow::bail!("Sample rate must be positive, got {}", sample_rate);
    }

    let frequencies = if args.frequencies.is_empty() {
        evenly_spaced(sample_rate / 2.0, args.points)
    } else {
        args.frequencies.clone()
    };

    let mut storage = config.allocate_storage();
    let mut chain = config.build_chain(&mut storage)?;

    let mut points = Vec::with_capacity(frequencies.len());
    for &freq_hz in &frequencies {
        let normalized = freq_hz / sample_rate;
        let responses: Vec<_> = config
            .stages
            .iter()
            .map(|stage| stage.response(normalized))
            .collect();

        let stage_db: Vec<f32> = responses.iter().map(|&h| magnitude_db(h)).collect();
        let total_db = stage_db.iter().sum();
        let total_phase_deg = responses.iter().map(|&h| phase_degrees(h)).sum();

        let measured_db = args
            .measure
            .then(|| measure_gain_db(&mut chain, freq_hz, sample_rate));

        points.push(ResponsePoint {
            freq_hz,
            stage_db,
            total_db,
            total_phase_deg,
            measured_db,
        });
    }

    let report = ResponseReport {
        sample_rate,
        stages: config.stages.iter().map(StageSpec::describe).collect(),
        points,
    };

    match args.format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn evenly_spaced(max: f32, points: usize) -> Vec<f32> {
    match points {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| max * i as f32 / (n - 1) as f32).collect(),
    }
}

fn print_text(report: &ResponseReport) {
    println!("=== Filter Frequency Response ===");
    println!("Sample rate: {:.1} Hz", report.sample_rate);
    for (i, stage) in report.stages.iter().enumerate() {
        println!("Stage {}: {}", i, stage);
    }
    println!();

    let measured = report.points.iter().any(|p| p.measured_db.is_some());
    print!("{:<12} {:<12} {:<12}", "Freq (Hz)", "Gain (dB)", "Phase (deg)");
    if measured {
        print!(" {:<12}", "Measured (dB)");
    }
    println!();
    println!("{}", "-".repeat(if measured { 51 } else { 38 }));

    for point in &report.points {
        print!(
            "{:<12.2} {:<12.2} {:<12.1}",
            point.freq_hz, point.total_db, point.total_phase_deg
        );
        if let Some(db) = point.measured_db {
            print!(" {:<12.2}", db);
        }
        println!();
    }
}
