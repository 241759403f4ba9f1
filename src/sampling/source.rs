use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hound::WavReader;

/// Anything that yields sensor samples one at a time
pub trait SampleSource {
    /// Next sample, or `None` once the source is exhausted
    fn next_sample(&mut self) -> anyhow::Result<Option<f32>>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> anyhow::Result<Option<f32>> {
        (**self).next_sample()
    }
}

/// Samples already held in memory
pub struct VecSource {
    samples: Vec<f32>,
    position: usize,
}

impl VecSource {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }
}

impl SampleSource for VecSource {
    fn next_sample(&mut self) -> anyhow::Result<Option<f32>> {
        let sample = self.samples.get(self.position).copied();
        if sample.is_some() {
            self.position += 1;
        }
        Ok(sample)
    }
}

/// One reading per line of text, as a serial console would log them
///
/// Only the first field of each line is used; fields may be separated by
/// whitespace, commas or semicolons. Blank lines and lines starting with `#`
/// are ignored. Lines that do not parse are logged and skipped.
pub struct TextSource<R: BufRead> {
    reader: R,
    line: String,
    line_number: usize,
    skipped: usize,
}

impl<R: BufRead> TextSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Lines dropped because they held no number
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl TextSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> SampleSource for TextSource<R> {
    fn next_sample(&mut self) -> anyhow::Result<Option<f32>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let field = trimmed
                .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                .next()
                .unwrap_or(trimmed);

            match field.parse::<f32>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => {
                    log::warn!(
                        "Skipping line {}: not a number: {:?}",
                        self.line_number,
                        trimmed
                    );
                    self.skipped += 1;
                }
            }
        }
    }
}

/// One channel of a WAV recording, normalized to [-1, 1]
pub struct WavSource {
    samples: Vec<f32>,
    position: usize,
    sample_rate: u32,
}

impl WavSource {
    pub fn open<P: AsRef<Path>>(path: P, channel: u16) -> anyhow::Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if channel >= spec.channels {
            anyhow::bail!(
                "Channel {} requested, WAV file has {} channel(s)",
                channel,
                spec.channels
            );
        }

        let interleaved = Self::read_samples(reader, &spec)?;
        let samples = interleaved
            .into_iter()
            .skip(channel as usize)
            .step_by(spec.channels as usize)
            .collect();

        log::info!(
            "Opened {}: {} Hz, {} channel(s), using channel {}",
            path.as_ref().display(),
            spec.sample_rate,
            spec.channels,
            channel
        );

        Ok(Self {
            samples,
            position: 0,
            sample_rate: spec.sample_rate,
        })
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> anyhow::Result<Vec<f32>> {
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                // 2^(bits-1) no longer fits an i32 for 32-bit PCM
                let max_val = (1i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for WavSource {
    fn next_sample(&mut self) -> anyhow::Result<Option<f32>> {
        let sample = self.samples.get(self.position).copied();
        if sample.is_some() {
            self.position += 1;
        }
        Ok(sample)
    }
}
