//! Synthetic sensor signals for exercising filters without hardware.

mod noise;
mod signal;

pub use noise::{ImpulseNoiseConfig, NoiseConfig, apply_noise};
pub use signal::{Tone, generate_tones, quantize};

use crate::sampling::{SampleSource, VecSource};

/// Description of a simulated analog sensor
///
/// The default is a slow 1 Hz wave riding on half scale, sampled at 100 Hz,
/// with a 40 Hz interferer and a little white noise: the kind of signal a
/// moving-average or low-pass stage is meant to clean up.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct SensorSignal {
    pub sample_rate: f32,
    pub offset: f32,
    pub tones: Vec<Tone>,
    pub noise: NoiseConfig,
    /// Quantize to this many ADC bits; values become integer codes
    pub adc_bits: Option<u32>,
}

impl Default for SensorSignal {
    fn default() -> Self {
        Self {
            sample_rate: 100.0,
            offset: 0.5,
            tones: vec![Tone::new(1.0, 0.3), Tone::new(40.0, 0.1)],
            noise: NoiseConfig::default().with_gaussian(0.02),
            adc_bits: None,
        }
    }
}

impl SensorSignal {
    pub fn generate(&self, num_samples: usize) -> Vec<f32> {
        let mut signal = generate_tones(num_samples, self.sample_rate, self.offset, &self.tones);
        apply_noise(&mut signal, &self.noise);
        if let Some(bits) = self.adc_bits {
            quantize(&mut signal, bits);
        }
        signal
    }
}

/// A [`SampleSource`] fed by a [`SensorSignal`]
pub struct SimulatedSource {
    inner: VecSource,
}

impl SimulatedSource {
    pub fn new(signal: &SensorSignal, num_samples: usize) -> Self {
        log::info!(
            "Simulating {} sample(s) at {} Hz, {} tone(s)",
            num_samples,
            signal.sample_rate,
            signal.tones.len()
        );
        Self {
            inner: VecSource::new(signal.generate(num_samples)),
        }
    }
}

impl SampleSource for SimulatedSource {
    fn next_sample(&mut self) -> anyhow::Result<Option<f32>> {
        self.inner.next_sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adc_codes_within_range() {
        let signal = SensorSignal {
            adc_bits: Some(10),
            noise: NoiseConfig::default().with_seed(5).with_gaussian(0.05),
            ..SensorSignal::default()
        };
        let samples = signal.generate(500);
        assert_eq!(samples.len(), 500);
        assert!(samples.iter().all(|&x| (0.0..=1023.0).contains(&x) && x.fract() == 0.0));
    }

    #[test]
    fn test_simulated_source_length() {
        let mut source = SimulatedSource::new(&SensorSignal::default(), 12);
        let mut count = 0;
        while source.next_sample().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 12);
    }
}
