use anyhow::Context;
use clap::Parser;
use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use sensorfilt::config::{PipelineConfig, SamplePeriod};
use sensorfilt::sampling::{PollingLoop, SampleSource, TextSource, WavSource};
use sensorfilt::save_wav;
use sensorfilt::signal_processing::Filter;
use sensorfilt::telemetry::{ClockKind, OutputFormat, TelemetryWriter, create_clock, create_formatter};

#[derive(Parser, Debug)]
#[command(name = "sensorfilt")]
#[command(about = "Filter a stream of sensor readings and print plotter telemetry", long_about = None)]
struct Args {
    /// Pipeline TOML file (default: 5-point moving average every 10 ms)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input: text file with one reading per line, a .wav file, or "-" for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// WAV channel to read
    #[arg(long, default_value_t = 0)]
    wav_channel: u16,

    /// Generate this many simulated readings instead of reading an input
    #[cfg(feature = "simulation")]
    #[arg(long)]
    simulate: Option<usize>,

    /// Sample period override (e.g. "10ms", "500us", "100hz")
    #[arg(short, long)]
    period: Option<SamplePeriod>,

    /// Also plot the unfiltered readings on this channel
    #[arg(long)]
    raw_channel: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "plot")]
    format: OutputFormat,

    /// Timestamp source (default: uptime with --realtime, sample otherwise)
    #[arg(long, value_enum)]
    clock: Option<ClockKind>,

    /// Decimal places of printed values
    #[arg(long, default_value_t = 4)]
    precision: usize,

    /// Pace the loop to the sample period instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Stop after this many readings
    #[arg(short = 'n', long)]
    max_samples: Option<u64>,

    /// Write the filtered signal to a mono WAV file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Passes samples through `inner`, keeping a copy of every output
struct Recorder<F> {
    inner: F,
    recorded: Option<Vec<f32>>,
}

impl<F: Filter> Recorder<F> {
    fn new(inner: F, enabled: bool) -> Self {
        Self {
            inner,
            recorded: enabled.then(Vec::new),
        }
    }
}

impl<F: Filter> Filter for Recorder<F> {
    fn process(&mut self, sample: f32) -> f32 {
        let output = self.inner.process(sample);
        if let Some(recorded) = self.recorded.as_mut() {
            recorded.push(output);
        }
        output
    }

    fn reset(&mut self) {
        self.inner.reset();
        if let Some(recorded) = self.recorded.as_mut() {
            recorded.clear();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load pipeline {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(period) = args.period {
        config.period = period;
    }
    if let Some(ref raw_channel) = args.raw_channel {
        config.raw_channel = Some(raw_channel.clone());
    }
    config.validate()?;

    log::info!(
        "Channel '{}', period {} ({:.1} Hz)",
        config.channel,
        config.period,
        config.period.sample_rate_hz()
    );
    for (i, stage) in config.stages.iter().enumerate() {
        log::info!("Stage {}: {}", i, stage.describe());
    }

    let mut source = open_source(&args)?;

    let mut storage = config.allocate_storage();
    let chain = config.build_chain(&mut storage)?;
    let mut recorder = Recorder::new(chain, args.record.is_some());

    let clock_kind = args.clock.unwrap_or(if args.realtime {
        ClockKind::Uptime
    } else {
        ClockKind::Sample
    });
    let mut clock = create_clock(clock_kind, config.period);

    let stdout = io::stdout();
    let mut sink = TelemetryWriter::new(
        BufWriter::new(stdout.lock()),
        create_formatter(args.format, args.precision),
    );

    let summary = PollingLoop::new(&config)
        .realtime(args.realtime)
        .max_samples(args.max_samples)
        .run(&mut source, &mut recorder, clock.as_mut(), &mut sink)?;

    if let (Some(path), Some(recorded)) = (&args.record, &recorder.recorded) {
        let sample_rate = config.period.sample_rate_hz().round().max(1.0) as u32;
        save_wav(path, recorded, sample_rate)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Recorded {} sample(s) to {}", recorded.len(), path.display());
    }

    if let Some(ref path) = args.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

#[cfg(feature = "simulation")]
fn simulated_source(args: &Args) -> Option<Box<dyn SampleSource>> {
    use sensorfilt::simulation::{SensorSignal, SimulatedSource};

    let count = args.simulate?;
    Some(Box::new(SimulatedSource::new(&SensorSignal::default(), count)))
}

#[cfg(not(feature = "simulation"))]
fn simulated_source(_args: &Args) -> Option<Box<dyn SampleSource>> {
    None
}

fn open_source(args: &Args) -> anyhow::Result<Box<dyn SampleSource>> {
    if let Some(source) = simulated_source(args) {
        return Ok(source);
    }

    if args.input == "-" {
        return Ok(Box::new(TextSource::new(io::stdin().lock())));
    }

    let path = Path::new(&args.input);
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        Ok(Box::new(WavSource::open(path, args.wav_channel)?))
    } else {
        Ok(Box::new(
            TextSource::open(path).with_context(|| format!("Failed to open {}", args.input))?,
        ))
    }
}
