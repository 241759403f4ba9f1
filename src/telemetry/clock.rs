use std::time::Instant;

use chrono::Utc;

use crate::config::SamplePeriod;

/// Source of telemetry timestamps in milliseconds
pub trait Clock: Send {
    fn now_ms(&mut self) -> u64;
}

/// Timestamp flavour selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClockKind {
    /// Milliseconds since the loop started, like a board's `millis()`
    Uptime,
    /// Milliseconds since the Unix epoch
    Epoch,
    /// Sample index times the sample period; reproducible for recorded input
    Sample,
}

pub fn create_clock(kind: ClockKind, period: SamplePeriod) -> Box<dyn Clock> {
    match kind {
        ClockKind::Uptime => Box::new(UptimeClock::new()),
        ClockKind::Epoch => Box::new(EpochClock),
        ClockKind::Sample => Box::new(SteppedClock::new(period)),
    }
}

pub struct UptimeClock {
    start: Instant,
}

impl UptimeClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for UptimeClock {
    fn now_ms(&mut self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

pub struct EpochClock;

impl Clock for EpochClock {
    fn now_ms(&mut self) -> u64 {
        Utc::now().timestamp_millis() as u64
    }
}

/// Advances by one sample period per reading, starting at zero
pub struct SteppedClock {
    step_ms: f64,
    ticks: u64,
}

impl SteppedClock {
    pub fn new(period: SamplePeriod) -> Self {
        Self {
            step_ms: period.as_millis() as f64,
            ticks: 0,
        }
    }
}

impl Clock for SteppedClock {
    fn now_ms(&mut self) -> u64 {
        let now = (self.ticks as f64 * self.step_ms) as u64;
        self.ticks += 1;
        now
    }
}
