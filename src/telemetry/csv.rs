use super::{Formatter, Reading};

pub struct CsvFormatter {
    precision: usize,
}

impl CsvFormatter {
    pub fn new(precision: usize) -> Self {
        Self { precision }
    }
}

impl Formatter for CsvFormatter {
    fn format(&self, reading: &Reading) -> String {
        format!(
            "{},{},{:.prec$},{}",
            reading.timestamp_ms,
            reading.channel,
            reading.value,
            reading.unit.unwrap_or(""),
            prec = self.precision
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("timestamp_ms,channel,value,unit")
    }
}
