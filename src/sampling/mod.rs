pub mod polling;
pub mod source;

pub use polling::{PollingLoop, RunSummary, StatsSummary};
pub use source::{SampleSource, TextSource, VecSource, WavSource};
