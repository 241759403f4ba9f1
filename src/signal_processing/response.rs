//! Frequency response of given filter coefficients
//!
//! Frequencies are normalized to cycles per sample, so `0.5` is Nyquist.
//! Divide a frequency in Hz by the sampling rate to get there.

use num_complex::Complex;
use std::f32::consts::PI;

use crate::constants::MIN_MAGNITUDE;
use crate::signal_processing::Filter;

/// Evaluate `sum_k coeffs[k] * z^-k` on the unit circle
fn polynomial_at(coeffs: &[f32], normalized_freq: f32) -> Complex<f32> {
    let omega = 2.0 * PI * normalized_freq;
    coeffs
        .iter()
        .enumerate()
        .map(|(k, &c)| Complex::from_polar(c, -omega * k as f32))
        .sum()
}

/// Complex response of a FIR filter at `normalized_freq`
pub fn fir_response(coefficients: &[f32], normalized_freq: f32) -> Complex<f32> {
    polynomial_at(coefficients, normalized_freq)
}

/// Complex response of a double-precision FIR filter at `normalized_freq`
pub fn fir_response_f64(coefficients: &[f64], normalized_freq: f64) -> Complex<f64> {
    let omega = std::f64::consts::TAU * normalized_freq;
    coefficients
        .iter()
        .enumerate()
        .map(|(k, &c)| Complex::from_polar(c, -omega * k as f64))
        .sum()
}

/// Complex response `B(z) / A(z)` of an IIR filter at `normalized_freq`
pub fn iir_response(b: &[f32], a: &[f32], normalized_freq: f32) -> Complex<f32> {
    polynomial_at(b, normalized_freq) / polynomial_at(a, normalized_freq)
}

/// Magnitude of a response in dB
pub fn magnitude_db(response: Complex<f32>) -> f32 {
    20.0 * response.norm().max(MIN_MAGNITUDE).log10()
}

/// Phase of a response in degrees
pub fn phase_degrees(response: Complex<f32>) -> f32 {
    response.arg().to_degrees()
}

/// Measure the steady-state gain of a running filter for a sine input
///
/// Resets `filter`, feeds it a unit sine at `freq_hz`, skips the settling
/// part and compares output RMS against input RMS.
pub fn measure_gain_db<F: Filter>(filter: &mut F, freq_hz: f32, sample_rate: f32) -> f32 {
    let num_samples = 4800;
    let skip = 1000;

    filter.reset();

    let input: Vec<f32> = (0..num_samples)
        .map(|i| (2.0 * PI * freq_hz * i as f32 / sample_rate).sin())
        .collect();

    let mut output = input.clone();
    filter.process_buffer(&mut output);

    let rms = |signal: &[f32]| -> f32 {
        (signal.iter().skip(skip).map(|x| x * x).sum::<f32>() / (signal.len() - skip) as f32)
            .sqrt()
    };

    let input_rms = rms(&input).max(MIN_MAGNITUDE);
    let output_rms = rms(&output).max(MIN_MAGNITUDE);

    20.0 * (output_rms / input_rms).log10()
}
