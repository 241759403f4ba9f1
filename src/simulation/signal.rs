use std::f32::consts::PI;

use crate::constants::MAX_ADC_BITS;

/// A sinusoidal component of a simulated sensor signal
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
pub struct Tone {
    pub freq_hz: f32,
    pub amplitude: f32,
    #[serde(default)]
    pub phase_radians: f32,
}

impl Tone {
    pub fn new(freq_hz: f32, amplitude: f32) -> Self {
        Self {
            freq_hz,
            amplitude,
            phase_radians: 0.0,
        }
    }
}

/// Clean signal: a DC offset plus a sum of tones
pub fn generate_tones(num_samples: usize, sample_rate: f32, offset: f32, tones: &[Tone]) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            offset
                + tones
                    .iter()
                    .map(|tone| {
                        tone.amplitude * (2.0 * PI * tone.freq_hz * t + tone.phase_radians).sin()
                    })
                    .sum::<f32>()
        })
        .collect()
}

/// Map `[0, 1]` onto the integer codes of a `bits`-wide ADC
///
/// Values outside the input range clip, as a real converter would. `bits` is
/// clamped to `1..=MAX_ADC_BITS`.
pub fn quantize(signal: &mut [f32], bits: u32) {
    let bits = bits.clamp(1, MAX_ADC_BITS);
    let full_scale = ((1u32 << bits) - 1) as f32;
    for sample in signal.iter_mut() {
        *sample = (sample.clamp(0.0, 1.0) * full_scale).round();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_only() {
        let signal = generate_tones(4, 1000.0, 0.5, &[]);
        assert_eq!(signal, vec![0.5; 4]);
    }

    #[test]
    fn test_tone_peaks_at_quarter_period() {
        let signal = generate_tones(5, 4.0, 0.0, &[Tone::new(1.0, 2.0)]);
        assert!(signal[0].abs() < 1e-6);
        assert!((signal[1] - 2.0).abs() < 1e-5);
        assert!((signal[3] + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_quantize_10_bit() {
        let mut signal = vec![-0.2, 0.0, 0.5, 1.0, 1.7];
        quantize(&mut signal, 10);
        assert_eq!(signal, vec![0.0, 0.0, 512.0, 1023.0, 1023.0]);
    }

    #[test]
    fn test_quantize_clamps_bit_depth() {
        let mut wide = vec![0.25, 1.0];
        let mut max = wide.clone();
        quantize(&mut wide, 64);
        quantize(&mut max, MAX_ADC_BITS);
        assert_eq!(wide, max);
        assert_eq!(wide[1], 16_777_215.0);

        let mut one_bit = vec![0.2, 0.7];
        quantize(&mut one_bit, 0);
        assert_eq!(one_bit, vec![0.0, 1.0]);
    }
}
