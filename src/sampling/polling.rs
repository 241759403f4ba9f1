use std::io::Write;
use std::time::Instant;

use rolling_stats::Stats;
use serde::Serialize;

use super::SampleSource;
use crate::config::PipelineConfig;
use crate::signal_processing::Filter;
use crate::telemetry::{Clock, Reading, TelemetryWriter};

#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub count: usize,
    pub mean: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

/// What a polling run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub samples: u64,
    pub rejected: u64,
    pub raw: Option<StatsSummary>,
    pub filtered: Option<StatsSummary>,
}

/// Fixed-cadence driver: read a sample, filter it, publish both
///
/// Plays the role of a firmware main loop. With `realtime` set the loop
/// sleeps until the next period boundary between samples; otherwise it
/// runs as fast as the source delivers.
pub struct PollingLoop<'c> {
    config: &'c PipelineConfig,
    realtime: bool,
    max_samples: Option<u64>,
}

impl<'c> PollingLoop<'c> {
    pub fn new(config: &'c PipelineConfig) -> Self {
        Self {
            config,
            realtime: false,
            max_samples: None,
        }
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn max_samples(mut self, max_samples: Option<u64>) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn run<S, F, W>(
        &self,
        source: &mut S,
        filter: &mut F,
        clock: &mut dyn Clock,
        sink: &mut TelemetryWriter<W>,
    ) -> anyhow::Result<RunSummary>
    where
        S: SampleSource + ?Sized,
        F: Filter + ?Sized,
        W: Write,
    {
        let period = self.config.period.as_duration();
        let scale = self.config.adc_full_scale;
        let unit = self.config.unit.as_deref();

        let mut raw_stats: Stats<f32> = Stats::new();
        let mut filtered_stats: Stats<f32> = Stats::new();
        let mut samples = 0u64;
        let mut rejected = 0u64;
        let mut deadline = Instant::now();

        loop {
            // Checked before reading so a live source is not waited on again
            if self.max_samples.is_some_and(|max| samples >= max) {
                break;
            }
            let Some(raw) = source.next_sample()? else {
                break;
            };

            // A NaN or infinity would stay in an IIR state forever
            if !raw.is_finite() {
                log::warn!("Dropping non-finite sample {}", raw);
                rejected += 1;
                continue;
            }

            let input = scale.map_or(raw, |full_scale| raw / full_scale);
            let output = filter.process(input);
            let timestamp_ms = clock.now_ms();

            if let Some(raw_channel) = self.config.raw_channel.as_deref() {
                sink.write(&Reading {
                    channel: raw_channel,
                    timestamp_ms,
                    value: input,
                    unit,
                })?;
            }
            sink.write(&Reading {
                channel: &self.config.channel,
                timestamp_ms,
                value: output,
                unit,
            })?;

            raw_stats.update(input);
            filtered_stats.update(output);
            samples += 1;

            if self.realtime {
                // A live plotter should see each sample as it is produced
                sink.flush()?;

                deadline += period;
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                } else {
                    log::debug!("Sample {} overran its period", samples);
                    deadline = now;
                }
            }
        }

        sink.flush()?;

        log::info!(
            "Processed {} sample(s), rejected {}",
            samples,
            rejected
        );

        Ok(RunSummary {
            samples,
            rejected,
            raw: StatsSummary::from_stats(&raw_stats),
            filtered: StatsSummary::from_stats(&filtered_stats),
        })
    }
}
