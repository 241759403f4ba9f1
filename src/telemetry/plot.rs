use super::{Formatter, Reading};

/// Serial plotter line format: `>channel:timestamp:value|g`
///
/// With a unit the value is followed by `§unit`, e.g. `>temp:1200:21.50§C|g`.
pub struct PlotFormatter {
    precision: usize,
}

impl PlotFormatter {
    pub fn new(precision: usize) -> Self {
        Self { precision }
    }
}

impl Formatter for PlotFormatter {
    fn format(&self, reading: &Reading) -> String {
        let unit = reading
            .unit
            .map_or(String::new(), |u| format!("§{}", u));
        format!(
            ">{}:{}:{:.prec$}{}|g",
            reading.channel,
            reading.timestamp_ms,
            reading.value,
            unit,
            prec = self.precision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_line_without_unit() {
        let reading = Reading {
            channel: "graf",
            timestamp_ms: 1234,
            value: 0.4,
            unit: None,
        };
        assert_eq!(PlotFormatter::new(2).format(&reading), ">graf:1234:0.40|g");
    }

    #[test]
    fn test_plot_line_with_unit() {
        let reading = Reading {
            channel: "temp",
            timestamp_ms: 1200,
            value: 21.5,
            unit: Some("C"),
        };
        assert_eq!(
            PlotFormatter::new(2).format(&reading),
            ">temp:1200:21.50§C|g"
        );
    }
}
