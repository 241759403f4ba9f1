//! Numeric constants shared by the filter engines and the host-side tooling

/// Largest accepted deviation of the leading feedback coefficient `a[0]` from 1.
/// Coefficient tables printed with a handful of decimals still pass; anything
/// further off is treated as a caller that forgot to normalize.
pub const NORMALIZATION_TOLERANCE: f32 = 1e-6;

/// Full-scale count of a 10-bit ADC, as read by `analogRead` on AVR boards.
pub const ADC_FULL_SCALE_10BIT: f32 = 1023.0;

/// Floor used when converting a magnitude to decibels, keeps `log10` finite.
pub const MIN_MAGNITUDE: f32 = 1e-12;

/// Default polling period of the sensor loop in milliseconds.
pub const DEFAULT_PERIOD_MS: f32 = 10.0;

/// Widest simulated ADC; `f32` holds every integer code exactly up to 24 bits.
pub const MAX_ADC_BITS: u32 = 24;
