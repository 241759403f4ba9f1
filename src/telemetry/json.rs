use super::{Formatter, Reading};

/// One JSON object per line
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, reading: &Reading) -> String {
        // Non-finite values serialize as null, so this cannot fail
        serde_json::to_string(reading).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_fields() {
        let reading = Reading {
            channel: "graf",
            timestamp_ms: 20,
            value: 0.5,
            unit: Some("V"),
        };
        let line = JsonFormatter.format(&reading);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["channel"], "graf");
        assert_eq!(parsed["timestamp_ms"], 20);
        assert_eq!(parsed["value"], 0.5);
        assert_eq!(parsed["unit"], "V");
    }

    #[test]
    fn test_json_omits_missing_unit() {
        let reading = Reading {
            channel: "graf",
            timestamp_ms: 0,
            value: 1.0,
            unit: None,
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format(&reading)).unwrap();
        assert!(parsed.get("unit").is_none());
    }
}
