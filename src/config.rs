//! Configuration for a sensor filtering pipeline.
//!
//! A pipeline is an ordered list of filter stages plus the sampling cadence
//! and the telemetry channel the filtered values are plotted on. It is
//! normally loaded from a TOML file:
//!
//! ```toml
//! channel = "graf"
//! period = "10ms"
//! adc_full_scale = 1023.0
//!
//! [[stages]]
//! kind = "fir"
//! coefficients = [0.2, 0.2, 0.2, 0.2, 0.2]
//!
//! [[stages]]
//! kind = "iir"
//! b = [0.2929, 0.5858, 0.2929]
//! a = [1.0, 0.0, 0.1716]
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PERIOD_MS;
use crate::error::{FilterError, Result};
use crate::signal_processing::iir::{is_normalized, required_state_len};
use crate::signal_processing::{
    FilterChain, FirFilter, IirFilter, Stage, StageBuffer, StageStorage, fir_response,
    fir_response_f64, iir_response,
};

/// Interval between two consecutive sensor reads
///
/// Can be written as a period or as a rate.
///
/// # Parsing formats
/// - `10` - period in milliseconds (no suffix)
/// - `10ms` - period in milliseconds (explicit)
/// - `500us` or `500μs` - period in microseconds
/// - `100hz` or `100Hz` - sampling rate in Hz
///
/// # Example
/// ```
/// use sensorfilt::config::SamplePeriod;
///
/// let period: SamplePeriod = "100hz".parse().unwrap();
/// assert!((period.as_millis() - 10.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PeriodRepr", into = "String")]
pub struct SamplePeriod(f32);

impl SamplePeriod {
    /// Create from a period in milliseconds
    pub fn from_millis(ms: f32) -> Self {
        Self(ms)
    }

    /// Create from a period in microseconds
    pub fn from_micros(us: f32) -> Self {
        Self(us / 1000.0)
    }

    /// Create from a sampling rate in Hz
    pub fn from_hz(hz: f32) -> Self {
        Self(1000.0 / hz)
    }

    pub fn as_millis(&self) -> f32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f32(self.0 / 1000.0)
    }

    /// Sampling rate implied by this period
    pub fn sample_rate_hz(&self) -> f32 {
        1000.0 / self.0
    }
}

impl Default for SamplePeriod {
    fn default() -> Self {
        Self::from_millis(DEFAULT_PERIOD_MS)
    }
}

impl fmt::Display for SamplePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl FromStr for SamplePeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        let parse_positive = |num: &str, what: &str| -> std::result::Result<f32, String> {
            let value: f32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid {}: {}", what, s))?;
            if !(value > 0.0) || !value.is_finite() {
                return Err(format!("{} must be positive", what));
            }
            Ok(value)
        };

        if let Some(num) = s.strip_suffix("us").or_else(|| s.strip_suffix("μs")) {
            return Ok(Self::from_micros(parse_positive(num, "interval")?));
        }

        if let Some(num) = s.strip_suffix("ms") {
            return Ok(Self::from_millis(parse_positive(num, "interval")?));
        }

        if let Some(num) = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
        {
            return Ok(Self::from_hz(parse_positive(num, "rate")?));
        }

        Ok(Self::from_millis(parse_positive(s, "interval")?))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PeriodRepr {
    Millis(f32),
    Text(String),
}

impl TryFrom<PeriodRepr> for SamplePeriod {
    type Error = String;

    fn try_from(repr: PeriodRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            PeriodRepr::Millis(ms) => ms.to_string().parse(),
            PeriodRepr::Text(text) => text.parse(),
        }
    }
}

impl From<SamplePeriod> for String {
    fn from(period: SamplePeriod) -> Self {
        period.to_string()
    }
}

/// One filter stage of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StageSpec {
    /// FIR stage; coefficients are ordered most-recent-first
    Fir { coefficients: Vec<f32> },
    /// FIR stage run in double precision, for long tables with tiny taps
    Fir64 { coefficients: Vec<f64> },
    /// IIR stage; `a[0]` must be 1
    Iir { b: Vec<f32>, a: Vec<f32> },
}

impl StageSpec {
    /// Storage slots this stage needs: the tap count for FIR, the order for IIR
    pub fn storage_len(&self) -> usize {
        match self {
            StageSpec::Fir { coefficients } => coefficients.len(),
            StageSpec::Fir64 { coefficients } => coefficients.len(),
            StageSpec::Iir { b, a } => required_state_len(b.len(), a.len()),
        }
    }

    /// Zeroed storage of the right length and precision for this stage
    pub fn allocate(&self) -> StageBuffer {
        match self {
            StageSpec::Fir64 { .. } => StageBuffer::Double(vec![0.0; self.storage_len()]),
            _ => StageBuffer::Single(vec![0.0; self.storage_len()]),
        }
    }

    /// Short human-readable description, e.g. `fir(5 taps)`
    pub fn describe(&self) -> String {
        match self {
            StageSpec::Fir { coefficients } => format!("fir({} taps)", coefficients.len()),
            StageSpec::Fir64 { coefficients } => format!("fir64({} taps)", coefficients.len()),
            StageSpec::Iir { b, a } => format!(
                "iir(order {}, nb={}, na={})",
                required_state_len(b.len(), a.len()),
                b.len(),
                a.len()
            ),
        }
    }

    /// Check the coefficient tables without binding any storage
    pub fn validate(&self) -> Result<()> {
        let all_finite = |coeffs: &[f32]| coeffs.iter().all(|c| c.is_finite());
        match self {
            StageSpec::Fir { coefficients } => {
                if coefficients.is_empty() {
                    return Err(FilterError::EmptyFilter);
                }
                if !all_finite(coefficients) {
                    return Err(FilterError::Config(
                        "FIR coefficients must be finite".to_string(),
                    ));
                }
            }
            StageSpec::Fir64 { coefficients } => {
                if coefficients.is_empty() {
                    return Err(FilterError::EmptyFilter);
                }
                if !coefficients.iter().all(|c| c.is_finite()) {
                    return Err(FilterError::Config(
                        "FIR coefficients must be finite".to_string(),
                    ));
                }
            }
            StageSpec::Iir { b, a } => {
                if b.is_empty() || a.is_empty() {
                    return Err(FilterError::EmptyFilter);
                }
                if !all_finite(b) || !all_finite(a) {
                    return Err(FilterError::Config(
                        "IIR coefficients must be finite".to_string(),
                    ));
                }
                if !is_normalized(a[0]) {
                    return Err(FilterError::FeedbackNotNormalized(a[0]));
                }
            }
        }
        Ok(())
    }

    /// Bind this stage to a storage buffer
    ///
    /// # Errors
    /// `FilterError::Config` if `storage` has the wrong precision, otherwise
    /// the engine's own binding errors.
    pub fn bind<'a>(&'a self, storage: &'a mut StageBuffer) -> Result<Stage<'a>> {
        match (self, storage) {
            (StageSpec::Fir { coefficients }, StageBuffer::Single(buffer)) => Ok(Stage::Fir(
                FirFilter::from_coefficients(buffer, coefficients)?,
            )),
            (StageSpec::Fir64 { coefficients }, StageBuffer::Double(buffer)) => Ok(
                Stage::Fir64(FirFilter::from_coefficients(buffer, coefficients)?),
            ),
            (StageSpec::Iir { b, a }, StageBuffer::Single(buffer)) => {
                Ok(Stage::Iir(IirFilter::new(buffer, b, a)?))
            }
            (spec, _) => Err(FilterError::Config(format!(
                "storage precision does not match {}",
                spec.describe()
            ))),
        }
    }

    /// Complex response of this stage at `normalized_freq` cycles per sample
    pub fn response(&self, normalized_freq: f32) -> Complex<f32> {
        match self {
            StageSpec::Fir { coefficients } => fir_response(coefficients, normalized_freq),
            StageSpec::Fir64 { coefficients } => {
                let h = fir_response_f64(coefficients, f64::from(normalized_freq));
                Complex::new(h.re as f32, h.im as f32)
            }
            StageSpec::Iir { b, a } => iir_response(b, a, normalized_freq),
        }
    }
}

/// Complete description of a sensor filtering pipeline
///
/// Use `PipelineConfig::default()` for the 5-point moving average sampled
/// every 10 ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Telemetry channel name for the filtered signal
    pub channel: String,
    /// Telemetry channel name for the unfiltered signal, if it is plotted too
    pub raw_channel: Option<String>,
    /// Unit appended to plotted values
    pub unit: Option<String>,
    /// Interval between sensor reads
    pub period: SamplePeriod,
    /// Raw readings are divided by this value before filtering
    pub adc_full_scale: Option<f32>,
    /// Filter stages, applied in order
    pub stages: Vec<StageSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel: "graf".to_string(),
            raw_channel: None,
            unit: None,
            period: SamplePeriod::default(),
            adc_full_scale: None,
            stages: vec![StageSpec::Fir {
                coefficients: vec![0.2; 5],
            }],
        }
    }
}

impl PipelineConfig {
    /// Parse a pipeline from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| FilterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a pipeline from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "Loaded pipeline from {}: {} stage(s), period {}",
            path.as_ref().display(),
            config.stages.len(),
            config.period
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| FilterError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel.is_empty() {
            return Err(FilterError::Config("channel name is empty".to_string()));
        }
        let period_ms = self.period.as_millis();
        if !(period_ms > 0.0) || !period_ms.is_finite() {
            return Err(FilterError::Config(format!(
                "period must be positive, got {}",
                self.period
            )));
        }
        if let Some(scale) = self.adc_full_scale
            && !(scale > 0.0 && scale.is_finite())
        {
            return Err(FilterError::Config(format!(
                "adc_full_scale must be positive and finite, got {}",
                scale
            )));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            stage.validate().map_err(|e| match e {
                FilterError::Config(msg) => FilterError::Config(format!("stage {}: {}", i, msg)),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Allocate storage sized for every stage of this pipeline
    pub fn allocate_storage(&self) -> StageStorage {
        StageStorage::for_stages(&self.stages)
    }

    /// Bind every stage to `storage` and return the resulting chain
    pub fn build_chain<'a>(&'a self, storage: &'a mut StageStorage) -> Result<FilterChain<'a>> {
        FilterChain::build(&self.stages, storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_period_bare_millis() {
        let period: SamplePeriod = "10".parse().unwrap();
        assert!((period.as_millis() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_period_explicit_millis() {
        let period: SamplePeriod = "2.5ms".parse().unwrap();
        assert!((period.as_millis() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_period_from_micros() {
        let period: SamplePeriod = "500us".parse().unwrap();
        assert!((period.as_millis() - 0.5).abs() < 1e-6);

        let period: SamplePeriod = "500μs".parse().unwrap();
        assert!((period.as_millis() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_period_from_hz() {
        let period: SamplePeriod = "1000Hz".parse().unwrap();
        assert!((period.as_millis() - 1.0).abs() < 1e-6);
        assert!((period.sample_rate_hz() - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_sample_period_invalid() {
        assert!("abc".parse::<SamplePeriod>().is_err());
        assert!("-10ms".parse::<SamplePeriod>().is_err());
        assert!("0hz".parse::<SamplePeriod>().is_err());
        assert!("0".parse::<SamplePeriod>().is_err());
    }

    #[test]
    fn test_default_pipeline_is_moving_average() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channel, "graf");
        assert_eq!(config.stages.len(), 1);
        assert_eq!(config.stages[0].storage_len(), 5);
    }

    #[test]
    fn test_parse_pipeline_toml() {
        let text = r#"
            channel = "filtrado"
            raw_channel = "normal"
            unit = "V"
            period = "1ms"
            adc_full_scale = 1023.0

            [[stages]]
            kind = "fir"
            coefficients = [0.25, 0.25, 0.25, 0.25]

            [[stages]]
            kind = "iir"
            b = [0.2929, 0.5858, 0.2929]
            a = [1.0, 0.0, 0.1716]
        "#;
        let config = PipelineConfig::from_toml_str(text).unwrap();

        assert_eq!(config.channel, "filtrado");
        assert_eq!(config.raw_channel.as_deref(), Some("normal"));
        assert_eq!(config.unit.as_deref(), Some("V"));
        assert!((config.period.as_millis() - 1.0).abs() < 1e-6);
        assert_eq!(config.adc_full_scale, Some(1023.0));
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[1].storage_len(), 2);
        assert_eq!(config.stages[1].describe(), "iir(order 2, nb=3, na=3)");
    }

    #[test]
    fn test_numeric_period_in_toml() {
        let config = PipelineConfig::from_toml_str("period = 5\n").unwrap();
        assert!((config.period.as_millis() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_unnormalized_stage_rejected_at_load() {
        let text = r#"
            [[stages]]
            kind = "iir"
            b = [1.0]
            a = [2.0, 0.5]
        "#;
        assert!(matches!(
            PipelineConfig::from_toml_str(text),
            Err(FilterError::FeedbackNotNormalized(_))
        ));
    }

    #[test]
    fn test_empty_fir_stage_rejected() {
        let text = r#"
            [[stages]]
            kind = "fir"
            coefficients = []
        "#;
        assert!(matches!(
            PipelineConfig::from_toml_str(text),
            Err(FilterError::EmptyFilter)
        ));
    }

    #[test]
    fn test_unknown_stage_kind_rejected() {
        let text = r#"
            [[stages]]
            kind = "kalman"
        "#;
        assert!(matches!(
            PipelineConfig::from_toml_str(text),
            Err(FilterError::Config(_))
        ));
    }

    #[test]
    fn test_non_positive_period_rejected() {
        let config = PipelineConfig {
            period: SamplePeriod::from_millis(0.0),
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(FilterError::Config(_))));
    }

    #[test]
    fn test_infinite_adc_scale_rejected() {
        for scale in [f32::INFINITY, f32::NAN, -1.0] {
            let config = PipelineConfig {
                adc_full_scale: Some(scale),
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(FilterError::Config(_))),
                "scale {}",
                scale
            );
        }
    }

    #[test]
    fn test_double_precision_fir_stage_in_toml() {
        let text = r#"
            [[stages]]
            kind = "fir64"
            coefficients = [4.516054525870999e-05, 0.5, 0.49995483945474129]
        "#;
        let config = PipelineConfig::from_toml_str(text).unwrap();
        match &config.stages[0] {
            StageSpec::Fir64 { coefficients } => {
                assert_eq!(coefficients[0], 4.516054525870999e-05);
            }
            other => panic!("expected fir64 stage, got {:?}", other),
        }
        assert_eq!(config.stages[0].describe(), "fir64(3 taps)");
        assert!((config.stages[0].response(0.0).norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_toml_round_trip_keeps_stages() {
        let config = PipelineConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = PipelineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.stages, config.stages);
        assert_eq!(parsed.period, config.period);
    }
}
