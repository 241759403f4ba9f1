//! Line-oriented telemetry output for filtered sensor values.
//!
//! The default [`PlotFormatter`] emits the serial plotter protocol
//! `>channel:timestamp:value|g`, optionally with a `§unit` suffix on the value.

mod clock;
mod csv;
mod json;
mod plot;

use std::io::{self, Write};

use serde::Serialize;

pub use self::clock::{Clock, ClockKind, EpochClock, SteppedClock, UptimeClock, create_clock};
pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::plot::PlotFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Plot,
    Csv,
    Json,
}

/// One value on one channel at one instant
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Reading<'a> {
    pub channel: &'a str,
    pub timestamp_ms: u64,
    pub value: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'a str>,
}

pub trait Formatter: Send {
    fn format(&self, reading: &Reading) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, precision: usize) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Plot => Box::new(PlotFormatter::new(precision)),
        OutputFormat::Csv => Box::new(CsvFormatter::new(precision)),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Writes formatted readings to a byte sink, one per line
pub struct TelemetryWriter<W: Write> {
    out: W,
    formatter: Box<dyn Formatter>,
    header_written: bool,
    lines: u64,
}

impl<W: Write> TelemetryWriter<W> {
    pub fn new(out: W, formatter: Box<dyn Formatter>) -> Self {
        Self {
            out,
            formatter,
            header_written: false,
            lines: 0,
        }
    }

    pub fn write(&mut self, reading: &Reading) -> io::Result<()> {
        if !self.header_written {
            if let Some(header) = self.formatter.header() {
                writeln!(self.out, "{}", header)?;
            }
            self.header_written = true;
        }
        writeln!(self.out, "{}", self.formatter.format(reading))?;
        self.lines += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Number of readings written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(value: f32) -> Reading<'static> {
        Reading {
            channel: "graf",
            timestamp_ms: 10,
            value,
            unit: None,
        }
    }

    #[test]
    fn test_writer_emits_one_line_per_reading() {
        let mut writer = TelemetryWriter::new(Vec::new(), create_formatter(OutputFormat::Plot, 2));
        writer.write(&reading(0.5)).unwrap();
        writer.write(&reading(0.25)).unwrap();
        assert_eq!(writer.lines(), 2);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, ">graf:10:0.50|g\n>graf:10:0.25|g\n");
    }

    #[test]
    fn test_writer_emits_header_once() {
        let mut writer = TelemetryWriter::new(Vec::new(), create_formatter(OutputFormat::Csv, 3));
        writer.write(&reading(1.0)).unwrap();
        writer.write(&reading(2.0)).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp_ms,channel,value,unit");
        assert_eq!(lines[1], "10,graf,1.000,");
    }
}
